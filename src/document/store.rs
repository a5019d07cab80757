use crate::config::EngineOpts;
use crate::document::edit::{LessonField, ObjectDraft, ObjectField, SceneDraft, SceneField};
use crate::document::history::{EditOp, History};
use crate::document::model::{
    EntryStatus, FailurePolicy, Lesson, LocalizationEntry, PlacedObject, Scene, SceneStatus,
    SuccessTarget,
};
use crate::foundation::core::positive_secs;
use crate::foundation::error::{LessonError, LessonResult};
use crate::foundation::ids::{LangCode, ObjectId, SceneId};
use crate::graph::scene_graph::SceneGraph;
use crate::graph::transitions::{check_transition, validate_transition};
use crate::localization::estimate::{DurationEstimator, SpeechRateEstimator};
use crate::localization::jobs::EntryProposal;
use crate::localization::matrix::LocalizationMatrix;
use crate::validate::engine::Validator;
use crate::validate::issues::{IssueSummary, ValidationIssue, worst_for};
use chrono::Utc;
use std::sync::Arc;

/// Single source of truth for one open lesson.
///
/// Every mutation runs against a copy of the document and is committed only if it succeeds and
/// the structural invariants still hold, so a failed call leaves the lesson untouched. Each
/// commit re-runs validation synchronously; [`DocumentStore::issues`] always describes the
/// current document.
///
/// The store has one writer. Background work (translation, remote timing) returns an
/// [`EntryProposal`] that is applied with [`DocumentStore::apply_proposal`].
pub struct DocumentStore {
    lesson: Lesson,
    issues: Vec<ValidationIssue>,
    validator: Validator,
    estimator: Arc<dyn DurationEstimator>,
    history: History,
}

impl DocumentStore {
    /// Open a lesson with the built-in speech-rate estimator.
    pub fn open(lesson: Lesson, opts: EngineOpts) -> LessonResult<Self> {
        let estimator = Arc::new(SpeechRateEstimator::new(opts.speech.clone()));
        Self::with_estimator(lesson, opts, estimator)
    }

    /// Open a lesson with an injected duration estimator.
    ///
    /// Entries without a stored duration are estimated; stored durations are kept.
    pub fn with_estimator(
        mut lesson: Lesson,
        opts: EngineOpts,
        estimator: Arc<dyn DurationEstimator>,
    ) -> LessonResult<Self> {
        opts.validate()?;
        lesson.check_structure()?;
        estimate_durations(&mut lesson, estimator.as_ref(), false);

        let mut store = Self {
            lesson,
            issues: Vec::new(),
            validator: Validator::new(opts.validation),
            estimator,
            history: History::new(opts.history_limit),
        };
        store.revalidate();
        tracing::debug!(
            lesson = %store.lesson.header.id,
            scenes = store.lesson.scenes.len(),
            issues = store.issues.len(),
            "document opened"
        );
        Ok(store)
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn into_lesson(self) -> Lesson {
        self.lesson
    }

    /// Current issue list, sorted by severity then scene position.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn issue_summary(&self) -> IssueSummary {
        IssueSummary::of(&self.issues)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn graph(&self) -> SceneGraph {
        SceneGraph::build(&self.lesson)
    }

    pub fn matrix(&self) -> LocalizationMatrix {
        LocalizationMatrix::build(&self.lesson, self.validator.opts())
    }

    /// Scenes unreachable from the first scene.
    pub fn reachability_check(&self) -> Vec<SceneId> {
        self.graph().reachability_check()
    }

    /// `InvalidTransition` when the scene's current transition is illegal.
    pub fn validate_transition(&self, id: SceneId) -> LessonResult<()> {
        let scene = self
            .lesson
            .scene(id)
            .ok_or_else(|| LessonError::unknown_scene(id, "not in lesson"))?;
        validate_transition(&self.lesson, scene)
            .map_err(|v| LessonError::invalid_transition(id, v.to_string()))
    }

    /// Append a scene at the end of the sequence.
    pub fn add_scene(&mut self, draft: SceneDraft) -> LessonResult<SceneId> {
        let end = self.lesson.scenes.len();
        self.insert_scene(end, draft)
    }

    /// Splice a new scene in at `position` (`0..=len`).
    ///
    /// Branch edges hold identities, so scenes after the insertion point keep their incoming
    /// edges without renumbering.
    #[tracing::instrument(skip(self, draft))]
    pub fn insert_scene(&mut self, position: usize, draft: SceneDraft) -> LessonResult<SceneId> {
        let upcoming = SceneId(self.lesson.ids.next);
        self.commit(
            EditOp::InsertScene,
            Some(upcoming),
            format!("insert scene at position {position}"),
            |lesson, estimator| {
                if position > lesson.scenes.len() {
                    return Err(LessonError::invalid_value(format!(
                        "insert position {position} is past the end ({} scenes)",
                        lesson.scenes.len()
                    )));
                }
                let id = lesson.ids.scene()?;
                let scene = materialize(lesson, id, draft, estimator)?;
                lesson.scenes.insert(position, scene);
                Ok(id)
            },
        )
    }

    /// Copy a scene to `position` (`0..=len`) under a fresh identity.
    ///
    /// Objects get fresh identities too. Text entries and branch targets are copied as they are,
    /// so a duplicated question still branches to the same scenes.
    #[tracing::instrument(skip(self))]
    pub fn duplicate_scene(&mut self, id: SceneId, position: usize) -> LessonResult<SceneId> {
        let upcoming = SceneId(self.lesson.ids.next);
        self.commit(
            EditOp::DuplicateScene,
            Some(upcoming),
            format!("duplicate scene {id} at position {position}"),
            |lesson, _| {
                let mut copy = lesson
                    .scene(id)
                    .cloned()
                    .ok_or_else(|| LessonError::unknown_scene(id, "not in lesson"))?;
                if position > lesson.scenes.len() {
                    return Err(LessonError::invalid_value(format!(
                        "duplicate position {position} is past the end ({} scenes)",
                        lesson.scenes.len()
                    )));
                }
                copy.id = lesson.ids.scene()?;
                copy.status = SceneStatus::Ok;
                for obj in copy.objects_mut() {
                    obj.id = lesson.ids.object()?;
                }
                let new_id = copy.id;
                lesson.scenes.insert(position, copy);
                Ok(new_id)
            },
        )
    }

    /// Remove a scene. Rejected while a question still targets it.
    #[tracing::instrument(skip(self))]
    pub fn remove_scene(&mut self, id: SceneId) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::RemoveScene,
            Some(id),
            format!("remove scene {id}"),
            |lesson, _| {
                let pos = lesson
                    .position_of(id)
                    .ok_or_else(|| LessonError::unknown_scene(id, "not in lesson"))?;
                let referrers = lesson.referrers_of(id);
                if !referrers.is_empty() {
                    let names: Vec<String> = referrers.iter().map(|r| r.to_string()).collect();
                    return Err(LessonError::unknown_scene(
                        id,
                        format!(
                            "still the branch target of {}; repoint or remove those edges first",
                            names.join(", ")
                        ),
                    ));
                }
                lesson.scenes.remove(pos);
                Ok(())
            },
        )?;
        Ok(&self.lesson)
    }

    /// Move a scene to `position` (`0..len`).
    #[tracing::instrument(skip(self))]
    pub fn move_scene(&mut self, id: SceneId, position: usize) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::MoveScene,
            Some(id),
            format!("move scene {id} to position {position}"),
            |lesson, _| {
                let from = lesson
                    .position_of(id)
                    .ok_or_else(|| LessonError::unknown_scene(id, "not in lesson"))?;
                if position >= lesson.scenes.len() {
                    return Err(LessonError::invalid_value(format!(
                        "move position {position} is out of range ({} scenes)",
                        lesson.scenes.len()
                    )));
                }
                let scene = lesson.scenes.remove(from);
                lesson.scenes.insert(position, scene);
                Ok(())
            },
        )?;
        Ok(&self.lesson)
    }

    #[tracing::instrument(skip(self, field), fields(field = field.name()))]
    pub fn update_scene_field(&mut self, id: SceneId, field: SceneField) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::UpdateScene,
            Some(id),
            format!("update {} of scene {id}", field.name()),
            |lesson, _| {
                let target = match &field {
                    SceneField::SuccessTarget(SuccessTarget::Scene { scene }) => Some(*scene),
                    SceneField::FailurePolicy(FailurePolicy::AlternateScene { scene }) => {
                        Some(*scene)
                    }
                    _ => None,
                };
                if let Some(t) = target
                    && !lesson.contains_scene(t)
                {
                    return Err(LessonError::unknown_scene(
                        t,
                        format!("{} target of scene {id} does not exist", field.name()),
                    ));
                }
                let primary = lesson.primary_language().clone();
                let scene = lesson.scene_mut(id)?;
                apply_scene_field(scene, field, &primary)
            },
        )?;
        Ok(&self.lesson)
    }

    /// Set one language's text for a scene. Blank text is stored as a `missing` entry.
    #[tracing::instrument(skip(self, text))]
    pub fn set_language_entry(
        &mut self,
        scene: SceneId,
        lang: &LangCode,
        text: impl Into<String>,
        status: EntryStatus,
    ) -> LessonResult<&Lesson> {
        let text = text.into();
        self.commit(
            EditOp::SetLanguageEntry,
            Some(scene),
            format!("set {lang} text of scene {scene}"),
            |lesson, estimator| {
                if !lesson.languages().contains(lang) {
                    return Err(LessonError::unknown_language(lang.as_str()));
                }
                let s = lesson.scene_mut(scene)?;
                let kind = s.kind();
                let part = s.speaking_mut().ok_or_else(|| {
                    LessonError::invalid_value(format!("{} scenes carry no text", kind.label()))
                })?;
                let blank = text.trim().is_empty();
                let entry = LocalizationEntry {
                    duration_secs: (!blank).then(|| estimator.estimate_secs(&text, lang)),
                    status: if blank { EntryStatus::Missing } else { status },
                    text,
                };
                part.texts.insert(lang.clone(), entry);
                Ok(())
            },
        )?;
        Ok(&self.lesson)
    }

    /// Drop one language's entry for a scene.
    #[tracing::instrument(skip(self))]
    pub fn clear_language_entry(
        &mut self,
        scene: SceneId,
        lang: &LangCode,
    ) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::ClearLanguageEntry,
            Some(scene),
            format!("clear {lang} text of scene {scene}"),
            |lesson, _| {
                if !lesson.languages().contains(lang) {
                    return Err(LessonError::unknown_language(lang.as_str()));
                }
                if let Some(part) = lesson.scene_mut(scene)?.speaking_mut() {
                    part.texts.remove(lang);
                }
                Ok(())
            },
        )?;
        Ok(&self.lesson)
    }

    /// Apply the result of a background translation job.
    pub fn apply_proposal(&mut self, proposal: EntryProposal) -> LessonResult<&Lesson> {
        self.set_language_entry(proposal.scene, &proposal.lang, proposal.text, proposal.status)
    }

    #[tracing::instrument(skip(self))]
    pub fn enable_language(&mut self, lang: LangCode) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::EnableLanguage,
            None,
            format!("enable {lang}"),
            |lesson, _| {
                if !lesson.header.languages.insert(lang.clone()) {
                    return Err(LessonError::DuplicateLanguage(lang.to_string()));
                }
                Ok(())
            },
        )?;
        Ok(&self.lesson)
    }

    /// Disable a language and drop its entries. The primary language cannot be disabled.
    #[tracing::instrument(skip(self))]
    pub fn disable_language(&mut self, lang: &LangCode) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::DisableLanguage,
            None,
            format!("disable {lang}"),
            |lesson, _| {
                if lang == lesson.primary_language() {
                    return Err(LessonError::invalid_value(format!(
                        "cannot disable the primary language '{lang}'"
                    )));
                }
                if !lesson.header.languages.remove(lang) {
                    return Err(LessonError::unknown_language(lang.as_str()));
                }
                for scene in &mut lesson.scenes {
                    if let Some(part) = scene.speaking_mut() {
                        part.texts.remove(lang);
                    }
                }
                Ok(())
            },
        )?;
        Ok(&self.lesson)
    }

    #[tracing::instrument(skip(self))]
    pub fn set_primary_language(&mut self, lang: &LangCode) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::SetPrimaryLanguage,
            None,
            format!("set primary language to {lang}"),
            |lesson, _| {
                if !lesson.languages().contains(lang) {
                    return Err(LessonError::unknown_language(lang.as_str()));
                }
                lesson.header.primary_language = lang.clone();
                Ok(())
            },
        )?;
        Ok(&self.lesson)
    }

    #[tracing::instrument(skip(self))]
    pub fn update_lesson(&mut self, field: LessonField) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::UpdateLesson,
            None,
            "update lesson settings".to_string(),
            |lesson, _| {
                let h = &mut lesson.header;
                match field {
                    LessonField::Title(title) => {
                        let title = title.trim();
                        if title.is_empty() {
                            return Err(LessonError::missing_field("lesson title"));
                        }
                        h.title = title.to_string();
                    }
                    LessonField::Description(d) => h.description = d,
                    LessonField::Topic(t) => h.topic = t,
                    LessonField::Difficulty(d) => h.difficulty = d,
                    LessonField::Tags(tags) => {
                        let mut cleaned: Vec<String> = Vec::new();
                        for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                            if !cleaned.iter().any(|c| c == tag) {
                                cleaned.push(tag.to_string());
                            }
                        }
                        h.tags = cleaned;
                    }
                    LessonField::DefaultPauseSecs(secs) => {
                        h.settings.default_pause_secs = positive_secs("default pause", secs)?;
                    }
                    LessonField::DefaultBackground(bg) => h.settings.default_background = bg,
                }
                Ok(())
            },
        )?;
        Ok(&self.lesson)
    }

    #[tracing::instrument(skip(self, draft))]
    pub fn add_object(&mut self, scene: SceneId, draft: ObjectDraft) -> LessonResult<ObjectId> {
        self.commit(
            EditOp::AddObject,
            Some(scene),
            format!("add {} to scene {scene}", draft.asset),
            |lesson, _| {
                if !lesson.contains_scene(scene) {
                    return Err(LessonError::unknown_scene(scene, "not in lesson"));
                }
                let id = lesson.ids.object()?;
                let obj = place(id, draft);
                obj.check()?;
                lesson.scene_mut(scene)?.objects_mut().push(obj);
                Ok(id)
            },
        )
    }

    #[tracing::instrument(skip(self, field))]
    pub fn update_object(
        &mut self,
        scene: SceneId,
        object: ObjectId,
        field: ObjectField,
    ) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::UpdateObject,
            Some(scene),
            format!("update object {object} in scene {scene}"),
            |lesson, _| {
                let obj = lesson
                    .scene_mut(scene)?
                    .objects_mut()
                    .iter_mut()
                    .find(|o| o.id == object)
                    .ok_or(LessonError::UnknownObject { scene, object })?;
                match field {
                    ObjectField::Asset(a) => obj.asset = a,
                    ObjectField::Count(c) => obj.count = c,
                    ObjectField::Position(p) => obj.position = p,
                    ObjectField::Entrance(a) => obj.entrance = a,
                    ObjectField::Active(a) => obj.active = a,
                    ObjectField::Exit(a) => obj.exit = a,
                    ObjectField::Sound(s) => obj.sound = s,
                }
                obj.check()
            },
        )?;
        Ok(&self.lesson)
    }

    #[tracing::instrument(skip(self))]
    pub fn remove_object(&mut self, scene: SceneId, object: ObjectId) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::RemoveObject,
            Some(scene),
            format!("remove object {object} from scene {scene}"),
            |lesson, _| {
                let objects = lesson.scene_mut(scene)?.objects_mut();
                let pos = objects
                    .iter()
                    .position(|o| o.id == object)
                    .ok_or(LessonError::UnknownObject { scene, object })?;
                objects.remove(pos);
                Ok(())
            },
        )?;
        Ok(&self.lesson)
    }

    /// Re-estimate every entry's duration with the current estimator.
    pub fn refresh_durations(&mut self) -> LessonResult<&Lesson> {
        self.commit(
            EditOp::RefreshDurations,
            None,
            "re-estimate speech durations".to_string(),
            |lesson, estimator| {
                estimate_durations(lesson, estimator, true);
                Ok(())
            },
        )?;
        Ok(&self.lesson)
    }

    /// Restore the document as it was before the last committed edit. Returns `false` when
    /// there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.lesson.clone();
        let Some(prev) = self.history.undo(current) else {
            return false;
        };
        self.restore(prev);
        true
    }

    pub fn redo(&mut self) -> bool {
        let current = self.lesson.clone();
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        self.restore(next);
        true
    }

    fn restore(&mut self, mut lesson: Lesson) {
        // Identities handed out after the snapshot stay retired.
        lesson.ids.next = lesson.ids.next.max(self.lesson.ids.next);
        self.lesson = lesson;
        self.revalidate();
    }

    fn commit<R>(
        &mut self,
        op: EditOp,
        scene: Option<SceneId>,
        detail: String,
        edit: impl FnOnce(&mut Lesson, &dyn DurationEstimator) -> LessonResult<R>,
    ) -> LessonResult<R> {
        let estimator = Arc::clone(&self.estimator);
        let mut draft = self.lesson.clone();
        let out = edit(&mut draft, estimator.as_ref())
            .and_then(|out| draft.check_structure().map(|()| out));
        let out = match out {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(?op, error = %e, "edit rejected");
                return Err(e);
            }
        };

        draft.header.meta.edited_at = Utc::now();
        let before = std::mem::replace(&mut self.lesson, draft);
        self.history.record(before, op, scene, detail);
        self.revalidate();
        tracing::debug!(?op, ?scene, issues = self.issues.len(), "edit committed");
        Ok(out)
    }

    fn revalidate(&mut self) {
        let issues = self.validator.run(&self.lesson);
        for scene in &mut self.lesson.scenes {
            scene.status = worst_for(&issues, scene.id).map_or(SceneStatus::Ok, SceneStatus::from);
        }
        self.issues = issues;
    }
}

fn materialize(
    lesson: &mut Lesson,
    id: SceneId,
    draft: SceneDraft,
    estimator: &dyn DurationEstimator,
) -> LessonResult<Scene> {
    positive_secs("scene duration", draft.duration_secs)?;
    let mut scene = Scene {
        id,
        duration_secs: draft.duration_secs,
        transition: draft.transition,
        status: SceneStatus::Ok,
        body: draft.body,
    };

    if let Some(part) = scene.speaking_mut() {
        for (lang, entry) in part.texts.iter_mut() {
            if !lesson.header.languages.contains(lang) {
                return Err(LessonError::unknown_language(lang.as_str()));
            }
            fill_entry(entry, lang, estimator, true);
        }
    }

    for obj in scene.objects_mut() {
        obj.id = lesson.ids.object()?;
    }
    for obj in draft.objects {
        let placed = place(lesson.ids.object()?, obj);
        scene.objects_mut().push(placed);
    }

    check_transition(&scene, scene.transition, lesson.primary_language())
        .map_err(|v| LessonError::invalid_transition(id, v.to_string()))?;
    Ok(scene)
}

fn place(id: ObjectId, d: ObjectDraft) -> PlacedObject {
    PlacedObject {
        id,
        object_type: d.object_type,
        asset: d.asset,
        count: d.count,
        position: d.position,
        entrance: d.entrance,
        active: d.active,
        exit: d.exit,
        sound: d.sound,
    }
}

fn apply_scene_field(scene: &mut Scene, field: SceneField, primary: &LangCode) -> LessonResult<()> {
    let not_applicable = |field: &SceneField, scene: &Scene| {
        LessonError::invalid_value(format!(
            "field '{}' does not apply to {} scenes",
            field.name(),
            scene.kind().label()
        ))
    };

    match field {
        SceneField::Duration(secs) => {
            scene.duration_secs = positive_secs("scene duration", secs)?;
        }
        SceneField::Transition(t) => {
            check_transition(scene, t, primary)
                .map_err(|v| LessonError::invalid_transition(scene.id, v.to_string()))?;
            scene.transition = t;
        }
        SceneField::Character(ref c) => {
            if c.trim().is_empty() {
                return Err(LessonError::missing_field("character"));
            }
            let err = not_applicable(&field, scene);
            scene.speaking_mut().ok_or(err)?.character = c.trim().to_string();
        }
        SceneField::Emotion(e) => {
            let err = not_applicable(&field, scene);
            scene.speaking_mut().ok_or(err)?.emotion = e;
        }
        SceneField::TranslatorNote(ref note) => {
            let err = not_applicable(&field, scene);
            scene.speaking_mut().ok_or(err)?.translator_note = note.clone();
        }
        SceneField::Options(ref options) => {
            let err = not_applicable(&field, scene);
            scene.question_mut().ok_or(err)?.options = options.clone();
        }
        SceneField::SuccessTarget(t) => {
            let err = not_applicable(&field, scene);
            scene.question_mut().ok_or(err)?.on_success = t;
        }
        SceneField::FailurePolicy(ref p) => {
            let err = not_applicable(&field, scene);
            scene.question_mut().ok_or(err)?.on_failure = p.clone();
        }
        SceneField::QuestionSettings(s) => {
            if s.answer_timeout_secs == 0 {
                return Err(LessonError::invalid_value("answer timeout must be >= 1 second"));
            }
            let err = not_applicable(&field, scene);
            scene.question_mut().ok_or(err)?.settings = s;
        }
    }
    Ok(())
}

fn fill_entry(
    entry: &mut LocalizationEntry,
    lang: &LangCode,
    estimator: &dyn DurationEstimator,
    overwrite: bool,
) {
    if entry.text.trim().is_empty() {
        entry.status = EntryStatus::Missing;
        entry.duration_secs = None;
    } else if overwrite || entry.duration_secs.is_none() {
        entry.duration_secs = Some(estimator.estimate_secs(&entry.text, lang));
    }
}

fn estimate_durations(lesson: &mut Lesson, estimator: &dyn DurationEstimator, overwrite: bool) {
    for scene in &mut lesson.scenes {
        if let Some(part) = scene.speaking_mut() {
            for (lang, entry) in part.texts.iter_mut() {
                fill_entry(entry, lang, estimator, overwrite);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/store.rs"]
mod tests;
