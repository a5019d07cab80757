use super::*;

#[test]
fn defaults_match_documented_values() {
    let opts = EngineOpts::default();
    assert_eq!(opts.validation.overrun_threshold_secs, 1.0);
    assert_eq!(opts.validation.min_answer_options, 2);
    assert_eq!(opts.history_limit, 100);
    opts.validate().unwrap();
}

#[test]
fn partial_json_keeps_defaults() {
    let json = r#"{ "validation": { "overrun_threshold_secs": 0.5 } }"#;
    let opts = EngineOpts::from_reader(json.as_bytes()).unwrap();
    assert_eq!(opts.validation.overrun_threshold_secs, 0.5);
    assert!(opts.validation.suggest_pause_objects);
    assert_eq!(opts.history_limit, 100);
}

#[test]
fn rejects_bad_rates() {
    let json = r#"{ "speech": { "per_language": { "fr": 0.0 } } }"#;
    let err = EngineOpts::from_reader(json.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("per_language['fr']"));

    let json = r#"{ "validation": { "overrun_threshold_secs": -1.0 } }"#;
    assert!(EngineOpts::from_reader(json.as_bytes()).is_err());
}

#[test]
fn unknown_language_uses_default_rate() {
    let speech = SpeechRateOpts::default();
    let sw = LangCode::new("sw").unwrap();
    let my = LangCode::new("my").unwrap();
    assert_eq!(speech.rate_for(&sw), speech.default_chars_per_sec);
    assert_eq!(speech.rate_for(&my), 9.0);
}
