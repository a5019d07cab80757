use crate::foundation::ids::{ObjectId, SceneId};

/// Convenience result type used across lessonkit.
pub type LessonResult<T> = Result<T, LessonError>;

/// Request-level failures returned by document operations.
///
/// A failed operation never changes the document; content problems are reported separately as
/// validation issues.
#[derive(thiserror::Error, Debug)]
pub enum LessonError {
    /// A scene identity that is not in the lesson, or one that is still referenced.
    #[error("unknown scene {scene}: {detail}")]
    UnknownScene { scene: SceneId, detail: String },

    /// A placed-object identity that is not in the given scene.
    #[error("unknown object {object} in scene {scene}")]
    UnknownObject { scene: SceneId, object: ObjectId },

    /// A language that is not enabled on the lesson.
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),

    /// A transition kind that is illegal for the scene it is set on.
    #[error("invalid transition on scene {scene}: {reason}")]
    InvalidTransition { scene: SceneId, reason: String },

    /// An identity that appears twice or can no longer be allocated.
    #[error("duplicate identity: {0}")]
    DuplicateIdentity(String),

    /// Enabling a language that is already enabled.
    #[error("language '{0}' is already enabled")]
    DuplicateLanguage(String),

    /// A required field left empty.
    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    /// A value outside its allowed range or format.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Errors when reading, writing or decoding lesson files.
    #[error("persistence error: {0}")]
    Persist(String),

    /// A background job observed its cancel token.
    #[error("job cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LessonError {
    /// Build a [`LessonError::UnknownScene`] value.
    pub fn unknown_scene(scene: SceneId, detail: impl Into<String>) -> Self {
        Self::UnknownScene {
            scene,
            detail: detail.into(),
        }
    }

    /// Build a [`LessonError::UnknownLanguage`] value.
    pub fn unknown_language(code: impl Into<String>) -> Self {
        Self::UnknownLanguage(code.into())
    }

    /// Build a [`LessonError::InvalidTransition`] value.
    pub fn invalid_transition(scene: SceneId, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            scene,
            reason: reason.into(),
        }
    }

    /// Build a [`LessonError::DuplicateIdentity`] value.
    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::DuplicateIdentity(msg.into())
    }

    /// Build a [`LessonError::MissingRequiredField`] value.
    pub fn missing_field(msg: impl Into<String>) -> Self {
        Self::MissingRequiredField(msg.into())
    }

    /// Build a [`LessonError::InvalidValue`] value.
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    /// Build a [`LessonError::Persist`] value.
    pub fn persist(msg: impl Into<String>) -> Self {
        Self::Persist(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
