use super::*;
use crate::config::EngineOpts;
use crate::document::edit::{SceneDraft, SceneField};
use crate::document::model::{LessonSettings, SceneKind};
use crate::document::store::DocumentStore;
use crate::localization::estimate::DurationEstimator;
use std::sync::Arc;

fn lang(code: &str) -> LangCode {
    LangCode::new(code).unwrap()
}

#[test]
fn baseline_rule_uses_threshold() {
    // Myanmar, Russian and French against a 2.1s English baseline, 1.0s threshold.
    assert!(matches!(
        overrun(2.1, 3.5, 10.0, 1.0),
        Some(Overrun::Baseline { .. })
    ));
    assert_eq!(overrun(2.1, 2.8, 10.0, 1.0), None);
    assert_eq!(overrun(2.1, 2.3, 10.0, 1.0), None);
}

#[test]
fn scene_duration_rule_applies_below_threshold() {
    assert!(matches!(
        overrun(2.1, 2.8, 2.5, 1.0),
        Some(Overrun::SceneDuration { .. })
    ));
    assert_eq!(overrun(2.1, 2.3, 2.5, 1.0), None);
    assert!(matches!(
        overrun(2.1, 3.5, 2.5, 1.0),
        Some(Overrun::Baseline { .. })
    ));
}

#[test]
fn exactly_at_threshold_is_not_flagged() {
    assert_eq!(overrun(2.1, 3.1, 10.0, 1.0), None);
    assert_eq!(overrun(2.0, 2.5, 2.5, 1.0), None);
}

fn store() -> DocumentStore {
    let estimator: Arc<dyn DurationEstimator> =
        Arc::new(|text: &str, lang: &LangCode| match lang.as_str() {
            "my" => 3.5,
            _ => text.chars().count() as f64 * 0.1,
        });
    let mut lesson = Lesson::new("l", "Matrix", lang("en"));
    for code in ["fr", "my"] {
        lesson.header.languages.insert(lang(code));
    }
    DocumentStore::with_estimator(lesson, EngineOpts::default(), estimator).unwrap()
}

fn dialogue(en: &str) -> SceneDraft {
    SceneDraft::template(SceneKind::Dialogue, &LessonSettings::default()).text(
        lang("en"),
        en,
        EntryStatus::Original,
    )
}

#[test]
fn rows_cover_speaking_scenes_with_primary_first() {
    let mut s = store();
    let d = s.add_scene(dialogue("abcdefghijklmnopqrstu")).unwrap();
    s.add_scene(SceneDraft::template(SceneKind::Pause, &LessonSettings::default()))
        .unwrap();
    s.set_language_entry(d, &lang("fr"), "abcdefghijklmnopqrstuvw", EntryStatus::HumanEdited)
        .unwrap();

    let m = s.matrix();
    assert_eq!(m.primary(), &lang("en"));
    assert_eq!(m.languages(), &[lang("en"), lang("fr"), lang("my")]);
    assert_eq!(m.rows().len(), 1);

    let row = m.row(d).unwrap();
    assert_eq!(row.position, 0);
    let baseline = row.baseline_secs.unwrap();
    assert!((baseline - 2.1).abs() < 1e-9);
    let fr = row.cell(&lang("fr")).unwrap();
    assert!((fr.delta_secs.unwrap() - 0.2).abs() < 1e-9);
    assert!(row.cell(&lang("my")).unwrap().is_missing());
    assert_eq!(m.coverage(&lang("fr")), (1, 1));
    assert_eq!(m.coverage(&lang("my")), (0, 1));
}

#[test]
fn missing_translation_severity_depends_on_transition() {
    let mut s = store();
    let d = s.add_scene(dialogue("Let's count!")).unwrap();
    s.set_language_entry(d, &lang("fr"), "Comptons !", EntryStatus::HumanEdited)
        .unwrap();

    let my_issue = |s: &DocumentStore| {
        s.matrix()
            .issues()
            .into_iter()
            .find(|i| i.language == Some(lang("my")))
            .unwrap()
    };
    let issue = my_issue(&s);
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(issue.message, "Missing my translation");

    s.update_scene_field(d, SceneField::Transition(TransitionKind::AutoTts))
        .unwrap();
    assert_eq!(my_issue(&s).severity, Severity::Error);
}

#[test]
fn overruns_only_on_tts_scenes() {
    let mut s = store();
    let d = s.add_scene(dialogue("abcdefghijklmnopqrstu")).unwrap();
    s.set_language_entry(d, &lang("my"), "x", EntryStatus::MachineTranslated)
        .unwrap();
    s.set_language_entry(d, &lang("fr"), "abcdefghijklmnopqrstuvw", EntryStatus::HumanEdited)
        .unwrap();
    assert_eq!(s.matrix().overruns().count(), 0);

    s.update_scene_field(d, SceneField::Transition(TransitionKind::AutoTts))
        .unwrap();
    let m = s.matrix();
    let flagged: Vec<&LangCode> = m.overruns().map(|(_, c)| &c.lang).collect();
    assert_eq!(flagged, vec![&lang("my")]);

    let issues = m.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "my TTS is 1.4s longer than en");
}

#[test]
fn blank_celebration_text_is_flagged_for_every_language() {
    let mut s = store();
    s.add_scene(dialogue("Let's count!")).unwrap();
    let party = s
        .add_scene(SceneDraft::template(SceneKind::Celebration, &LessonSettings::default()))
        .unwrap();

    let langs: Vec<String> = s
        .matrix()
        .issues()
        .into_iter()
        .filter(|i| i.scene == Some(party))
        .filter_map(|i| i.language.map(|l| l.to_string()))
        .collect();
    assert_eq!(langs, vec!["en", "fr", "my"]);
}
