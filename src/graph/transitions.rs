use crate::document::model::{Lesson, Scene, SceneKind, TransitionKind};
use crate::foundation::error::{LessonError, LessonResult};
use crate::foundation::ids::LangCode;
use std::fmt;
use std::str::FromStr;

/// Why a transition kind is illegal on a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionViolation {
    AwaitAnswerOutsideQuestion(SceneKind),
    AutoTtsWithoutPrimaryText,
}

impl fmt::Display for TransitionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitAnswerOutsideQuestion(kind) => write!(
                f,
                "await_answer is only legal on question scenes (this is a {} scene)",
                kind.label()
            ),
            Self::AutoTtsWithoutPrimaryText => {
                f.write_str("auto_tts needs non-empty primary-language text")
            }
        }
    }
}

/// Check `transition` against `scene` as it currently stands.
pub fn check_transition(
    scene: &Scene,
    transition: TransitionKind,
    primary: &LangCode,
) -> Result<(), TransitionViolation> {
    match transition {
        TransitionKind::AwaitAnswer if scene.kind() != SceneKind::Question => Err(
            TransitionViolation::AwaitAnswerOutsideQuestion(scene.kind()),
        ),
        TransitionKind::AutoTts if scene.text(primary).is_none() => {
            Err(TransitionViolation::AutoTtsWithoutPrimaryText)
        }
        _ => Ok(()),
    }
}

/// Check the transition a scene already carries.
pub fn validate_transition(lesson: &Lesson, scene: &Scene) -> Result<(), TransitionViolation> {
    check_transition(scene, scene.transition, lesson.primary_language())
}

impl TransitionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::AutoTimer => "auto_timer",
            Self::AutoTts => "auto_tts",
            Self::ButtonTap => "button_tap",
            Self::AwaitAnswer => "await_answer",
        }
    }

    /// Whether the scene's fixed duration drives the advance.
    pub fn is_timed(self) -> bool {
        matches!(self, Self::AutoTimer)
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransitionKind {
    type Err = LessonError;

    fn from_str(s: &str) -> LessonResult<Self> {
        let kind = s.trim().to_ascii_lowercase();
        match kind.as_str() {
            "auto_timer" | "timer" => Ok(Self::AutoTimer),
            "auto_tts" | "tts" => Ok(Self::AutoTts),
            "button_tap" | "button" | "tap" => Ok(Self::ButtonTap),
            "await_answer" | "task" | "answer" => Ok(Self::AwaitAnswer),
            "" => Err(LessonError::invalid_value("transition kind must be non-empty")),
            other => Err(LessonError::invalid_value(format!(
                "unknown transition kind '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/transitions.rs"]
mod tests;
