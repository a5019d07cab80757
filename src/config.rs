use crate::foundation::error::{LessonError, LessonResult};
use crate::foundation::ids::LangCode;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Options for a [`crate::DocumentStore`] editing session.
///
/// Every field has a default, so a JSON file only needs to name the values it changes.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineOpts {
    /// Validation thresholds.
    pub validation: ValidationOpts,
    /// Parameters of the built-in speech duration estimator.
    pub speech: SpeechRateOpts,
    /// Maximum number of undo snapshots (and journal records) kept.
    pub history_limit: usize,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            validation: ValidationOpts::default(),
            speech: SpeechRateOpts::default(),
            history_limit: 100,
        }
    }
}

impl EngineOpts {
    pub fn from_reader<R: std::io::Read>(r: R) -> LessonResult<Self> {
        let opts: Self = serde_json::from_reader(r)
            .map_err(|e| LessonError::persist(format!("parse engine options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn from_path(path: impl AsRef<Path>) -> LessonResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            LessonError::persist(format!("open engine options '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> LessonResult<()> {
        let t = self.validation.overrun_threshold_secs;
        if !t.is_finite() || t < 0.0 {
            return Err(LessonError::invalid_value(
                "validation.overrun_threshold_secs must be finite and >= 0",
            ));
        }
        self.speech.validate()
    }
}

/// Validation engine thresholds.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ValidationOpts {
    /// A translation may exceed the primary-language baseline by this many seconds before it is
    /// flagged.
    pub overrun_threshold_secs: f64,
    /// Emit an info issue for pause scenes that show no objects.
    pub suggest_pause_objects: bool,
    /// Questions with fewer options than this get a warning.
    pub min_answer_options: usize,
}

impl Default for ValidationOpts {
    fn default() -> Self {
        Self {
            overrun_threshold_secs: 1.0,
            suggest_pause_objects: true,
            min_answer_options: 2,
        }
    }
}

/// Character-rate speech model used by [`crate::SpeechRateEstimator`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpeechRateOpts {
    /// Rate used for languages without an explicit entry.
    pub default_chars_per_sec: f64,
    /// Per-language speaking rates.
    pub per_language: BTreeMap<LangCode, f64>,
    /// Fixed lead-in added to every non-empty utterance.
    pub lead_in_secs: f64,
}

impl Default for SpeechRateOpts {
    fn default() -> Self {
        // Rates are characters per second for a slow, child-directed voice.
        let per_language = [
            ("en", 15.0),
            ("fr", 15.0),
            ("it", 15.0),
            ("de", 14.0),
            ("ru", 13.0),
            ("am", 10.0),
            ("my", 9.0),
        ]
        .into_iter()
        .filter_map(|(code, rate)| LangCode::new(code).ok().map(|c| (c, rate)))
        .collect();
        Self {
            default_chars_per_sec: 14.0,
            per_language,
            lead_in_secs: 0.2,
        }
    }
}

impl SpeechRateOpts {
    pub fn rate_for(&self, lang: &LangCode) -> f64 {
        self.per_language
            .get(lang)
            .copied()
            .unwrap_or(self.default_chars_per_sec)
    }

    pub fn validate(&self) -> LessonResult<()> {
        let rate_ok = |r: f64| r.is_finite() && r > 0.0;
        if !rate_ok(self.default_chars_per_sec) {
            return Err(LessonError::invalid_value(
                "speech.default_chars_per_sec must be finite and > 0",
            ));
        }
        if let Some((lang, _)) = self.per_language.iter().find(|(_, r)| !rate_ok(**r)) {
            return Err(LessonError::invalid_value(format!(
                "speech.per_language['{lang}'] must be finite and > 0"
            )));
        }
        if !self.lead_in_secs.is_finite() || self.lead_in_secs < 0.0 {
            return Err(LessonError::invalid_value(
                "speech.lead_in_secs must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
