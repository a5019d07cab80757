use crate::config::EngineOpts;
use crate::document::edit::SceneDraft;
use crate::document::model::{Difficulty, Lesson, SceneKind, Topic};
use crate::document::store::DocumentStore;
use crate::foundation::error::{LessonError, LessonResult};
use crate::foundation::ids::LangCode;

/// Fluent construction of a new lesson. Scenes go through the document store, so the result
/// carries store-assigned identities and estimated durations.
pub struct LessonBuilder {
    lesson: Lesson,
    drafts: Vec<SceneDraft>,
}

impl LessonBuilder {
    pub fn new(id: impl Into<String>, title: impl Into<String>, primary: LangCode) -> Self {
        Self {
            lesson: Lesson::new(id, title, primary),
            drafts: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.lesson.header.description = description.into();
        self
    }

    pub fn topic(mut self, topic: Topic) -> Self {
        self.lesson.header.topic = topic;
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.lesson.header.difficulty = difficulty;
        self
    }

    pub fn language(mut self, lang: LangCode) -> LessonResult<Self> {
        if !self.lesson.header.languages.insert(lang.clone()) {
            return Err(LessonError::DuplicateLanguage(lang.to_string()));
        }
        Ok(self)
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.lesson.header.tags.push(tag.into());
        self
    }

    pub fn scene(mut self, draft: SceneDraft) -> Self {
        self.drafts.push(draft);
        self
    }

    /// Append the default template for `kind`.
    pub fn template(self, kind: SceneKind) -> Self {
        let draft = SceneDraft::template(kind, &self.lesson.header.settings);
        self.scene(draft)
    }

    pub fn build(self) -> LessonResult<Lesson> {
        self.build_with(EngineOpts::default())
    }

    pub fn build_with(self, opts: EngineOpts) -> LessonResult<Lesson> {
        let mut store = DocumentStore::open(self.lesson, opts)?;
        for draft in self.drafts {
            store.add_scene(draft)?;
        }
        Ok(store.into_lesson())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/builder.rs"]
mod tests;
