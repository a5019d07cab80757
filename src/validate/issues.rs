use crate::document::model::{Lesson, SceneStatus};
use crate::foundation::ids::{LangCode, ObjectId, SceneId};
use std::cmp::Reverse;
use std::fmt;

/// Ordered so that `Error > Warning > Info`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl From<Severity> for SceneStatus {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Info => SceneStatus::Info,
            Severity::Warning => SceneStatus::Warning,
            Severity::Error => SceneStatus::Error,
        }
    }
}

/// Part of a scene an issue points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueField {
    Lesson,
    Dialogue,
    Transition,
    Options,
    Objects,
    Animation,
    Localization,
    Reachability,
}

impl IssueField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Dialogue => "dialogue",
            Self::Transition => "transition",
            Self::Options => "options",
            Self::Objects => "objects",
            Self::Animation => "animation",
            Self::Localization => "localization",
            Self::Reachability => "reachability",
        }
    }
}

/// A content problem in the document. Issues never block edits.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneId>,
    pub field: IssueField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<LangCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectId>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        scene: Option<SceneId>,
        field: IssueField,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            scene,
            field,
            language: None,
            object: None,
            message: message.into(),
        }
    }

    pub fn error(scene: SceneId, field: IssueField, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Some(scene), field, message)
    }

    pub fn warning(scene: SceneId, field: IssueField, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, Some(scene), field, message)
    }

    pub fn info(scene: SceneId, field: IssueField, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, Some(scene), field, message)
    }

    pub fn with_language(mut self, lang: LangCode) -> Self {
        self.language = Some(lang);
        self
    }

    pub fn with_object(mut self, object: ObjectId) -> Self {
        self.object = Some(object);
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity.label())?;
        match self.scene {
            Some(scene) => write!(f, " [{scene} {}", self.field.label())?,
            None => write!(f, " [{}", self.field.label())?,
        }
        if let Some(lang) = &self.language {
            write!(f, " {lang}")?;
        }
        if let Some(object) = self.object {
            write!(f, " {object}")?;
        }
        write!(f, "] {}", self.message)
    }
}

/// Sort by severity (errors first), then scene position; lesson-level issues lead their group.
/// The sort is stable, so checks keep their emission order within a scene.
pub fn sort_issues(issues: &mut [ValidationIssue], lesson: &Lesson) {
    issues.sort_by_key(|issue| {
        let position = issue
            .scene
            .map(|id| lesson.position_of(id).map_or(usize::MAX, |p| p + 1))
            .unwrap_or(0);
        (Reverse(issue.severity), position)
    });
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct IssueSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl IssueSummary {
    pub fn of(issues: &[ValidationIssue]) -> Self {
        let mut s = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Error => s.errors += 1,
                Severity::Warning => s.warnings += 1,
                Severity::Info => s.infos += 1,
            }
        }
        s
    }

    pub fn has_errors(self) -> bool {
        self.errors > 0
    }
}

/// Worst severity reported for `scene`.
pub fn worst_for(issues: &[ValidationIssue], scene: SceneId) -> Option<Severity> {
    issues
        .iter()
        .filter(|i| i.scene == Some(scene))
        .map(|i| i.severity)
        .max()
}

#[cfg(test)]
#[path = "../../tests/unit/validate/issues.rs"]
mod tests;
