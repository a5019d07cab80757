use crate::config::SpeechRateOpts;
use crate::foundation::ids::LangCode;

/// Maps (text, language) to an estimated spoken duration in seconds.
///
/// Implementations must be deterministic for a given pair and non-decreasing in text length for a
/// fixed language.
pub trait DurationEstimator: Send + Sync {
    fn estimate_secs(&self, text: &str, lang: &LangCode) -> f64;
}

impl<F> DurationEstimator for F
where
    F: Fn(&str, &LangCode) -> f64 + Send + Sync,
{
    fn estimate_secs(&self, text: &str, lang: &LangCode) -> f64 {
        self(text, lang)
    }
}

/// Constant characters-per-second model with a fixed lead-in.
#[derive(Clone, Debug, Default)]
pub struct SpeechRateEstimator {
    opts: SpeechRateOpts,
}

impl SpeechRateEstimator {
    pub fn new(opts: SpeechRateOpts) -> Self {
        Self { opts }
    }
}

impl DurationEstimator for SpeechRateEstimator {
    fn estimate_secs(&self, text: &str, lang: &LangCode) -> f64 {
        let chars = text.chars().count();
        if chars == 0 {
            return 0.0;
        }
        self.opts.lead_in_secs + chars as f64 / self.opts.rate_for(lang)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/localization/estimate.rs"]
mod tests;
