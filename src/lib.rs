//! Lessonkit is the document engine behind a children's lesson authoring tool.
//!
//! A lesson is an ordered sequence of scenes (dialogue, pause, question, celebration) with
//! per-language text. The public API is store-oriented:
//!
//! - Load a [`Lesson`] from JSON or build one with [`LessonBuilder`]
//! - Open it in a [`DocumentStore`] and edit it through store operations
//! - Read the resulting [`ValidationIssue`] list, [`SceneGraph`] and [`LocalizationMatrix`]
#![forbid(unsafe_code)]

mod foundation;

/// Engine options loaded from JSON.
pub mod config;
/// Lesson model, editing session and persistence.
pub mod document;
/// Scene ordering, branch edges and transition rules.
pub mod graph;
/// Per-language text, duration estimates and background jobs.
pub mod localization;
/// Content checks and issue reporting.
pub mod validate;

pub use crate::foundation::core::{CanvasPos, round_tenths};
pub use crate::foundation::error::{LessonError, LessonResult};
pub use crate::foundation::ids::{LangCode, ObjectId, SceneId};

pub use crate::config::{EngineOpts, SpeechRateOpts, ValidationOpts};
pub use crate::document::builder::LessonBuilder;
pub use crate::document::edit::{LessonField, ObjectDraft, ObjectField, SceneDraft, SceneField};
pub use crate::document::history::{EditOp, EditRecord, History};
pub use crate::document::model::{
    AnimationRef, AnswerOption, Difficulty, Emotion, EntryStatus, FailurePolicy, Lesson,
    LessonHeader, LessonMeta, LessonSettings, LocalizationEntry, ObjectType, PausePart,
    PlacedObject, QuestionPart, QuestionSettings, Scene, SceneBody, SceneKind, SceneStatus,
    SpeakingPart, SuccessTarget, Topic, TransitionKind,
};
pub use crate::document::persist::{FORMAT_TAG, LessonFile};
pub use crate::document::store::DocumentStore;
pub use crate::graph::scene_graph::{Edge, EdgeKind, SceneGraph};
pub use crate::graph::transitions::{TransitionViolation, check_transition, validate_transition};
pub use crate::localization::estimate::{DurationEstimator, SpeechRateEstimator};
pub use crate::localization::jobs::{
    CancelToken, EntryProposal, PendingJob, TranslationProvider, TranslationRequest, spawn_job,
    spawn_translation, translation_requests,
};
pub use crate::localization::matrix::{
    LocalizationMatrix, MatrixCell, MatrixRow, Overrun, overrun,
};
pub use crate::validate::engine::Validator;
pub use crate::validate::issues::{IssueField, IssueSummary, Severity, ValidationIssue};
