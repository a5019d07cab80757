use crate::foundation::core::{CanvasPos, positive_secs};
use crate::foundation::error::{LessonError, LessonResult};
use crate::foundation::ids::{IdAllocator, LangCode, ObjectId, SceneId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Counting,
    Letters,
    Colors,
    Shapes,
    Other,
}

/// Difficulty tier; the tiers map to age bands 3-4, 4-5 and 5-7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonMeta {
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl LessonMeta {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            edited_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonSettings {
    #[serde(default = "default_pause_secs")]
    pub default_pause_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_background: Option<String>,
}

fn default_pause_secs() -> f64 {
    3.0
}

impl Default for LessonSettings {
    fn default() -> Self {
        Self {
            default_pause_secs: default_pause_secs(),
            default_background: None,
        }
    }
}

/// Lesson-level fields. Everything but the scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonHeader {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub primary_language: LangCode,
    pub languages: BTreeSet<LangCode>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub meta: LessonMeta,
    #[serde(default)]
    pub settings: LessonSettings,
}

/// One lesson document: header plus the ordered scene sequence.
///
/// A `Lesson` is only mutated through [`crate::DocumentStore`]; readers get shared references.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub(crate) header: LessonHeader,
    pub(crate) scenes: Vec<Scene>,
    pub(crate) ids: IdAllocator,
}

impl Lesson {
    /// Empty lesson with only the primary language enabled.
    pub fn new(id: impl Into<String>, title: impl Into<String>, primary: LangCode) -> Self {
        let mut languages = BTreeSet::new();
        languages.insert(primary.clone());
        Self {
            header: LessonHeader {
                id: id.into(),
                title: title.into(),
                description: String::new(),
                topic: Topic::Other,
                difficulty: Difficulty::Easy,
                primary_language: primary,
                languages,
                tags: Vec::new(),
                meta: LessonMeta::now(),
                settings: LessonSettings::default(),
            },
            scenes: Vec::new(),
            ids: IdAllocator { next: 1 },
        }
    }

    pub fn header(&self) -> &LessonHeader {
        &self.header
    }

    pub fn primary_language(&self) -> &LangCode {
        &self.header.primary_language
    }

    pub fn languages(&self) -> &BTreeSet<LangCode> {
        &self.header.languages
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene_ids(&self) -> Vec<SceneId> {
        self.scenes.iter().map(|s| s.id).collect()
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub(crate) fn scene_mut(&mut self, id: SceneId) -> LessonResult<&mut Scene> {
        self.scenes
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| LessonError::unknown_scene(id, "not in lesson"))
    }

    /// 0-based position of a scene in the sequence. Positions are a view concern; edges and
    /// external references use identities.
    pub fn position_of(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    pub fn contains_scene(&self, id: SceneId) -> bool {
        self.position_of(id).is_some()
    }

    /// Question scenes whose success or failure edge targets `id`.
    pub fn referrers_of(&self, id: SceneId) -> Vec<SceneId> {
        self.scenes
            .iter()
            .filter(|s| s.id != id && s.branch_targets().any(|t| t == id))
            .map(|s| s.id)
            .collect()
    }

    /// Next identity the allocator will hand out.
    pub fn next_id(&self) -> u64 {
        self.ids.next
    }

    /// Structural invariants every committed document satisfies.
    pub(crate) fn check_structure(&self) -> LessonResult<()> {
        let h = &self.header;
        if h.title.trim().is_empty() {
            return Err(LessonError::missing_field("lesson title"));
        }
        if h.languages.is_empty() {
            return Err(LessonError::missing_field(
                "lesson needs at least one enabled language",
            ));
        }
        if !h.languages.contains(&h.primary_language) {
            return Err(LessonError::unknown_language(h.primary_language.as_str()));
        }
        positive_secs("default pause duration", h.settings.default_pause_secs)?;

        let mut scene_ids = HashSet::new();
        let mut object_ids = HashSet::new();
        for scene in &self.scenes {
            if !scene_ids.insert(scene.id) {
                return Err(LessonError::duplicate(format!("scene {} appears twice", scene.id)));
            }
            if scene.id.0 >= self.ids.next {
                return Err(LessonError::duplicate(format!(
                    "scene {} is not below the identity watermark {}",
                    scene.id, self.ids.next
                )));
            }
            positive_secs("scene duration", scene.duration_secs)
                .map_err(|e| LessonError::invalid_value(format!("scene {}: {e}", scene.id)))?;

            for obj in scene.objects() {
                if !object_ids.insert(obj.id) {
                    return Err(LessonError::duplicate(format!("object {} appears twice", obj.id)));
                }
                if obj.id.0 >= self.ids.next {
                    return Err(LessonError::duplicate(format!(
                        "object {} is not below the identity watermark {}",
                        obj.id, self.ids.next
                    )));
                }
                obj.check()?;
            }

            if let Some(part) = scene.speaking() {
                if let Some(lang) = part.texts.keys().find(|l| !h.languages.contains(*l)) {
                    return Err(LessonError::unknown_language(lang.as_str()));
                }
                for (lang, entry) in &part.texts {
                    if let Some(d) = entry.duration_secs
                        && (!d.is_finite() || d < 0.0)
                    {
                        return Err(LessonError::invalid_value(format!(
                            "scene {} {lang} duration must be finite and >= 0 (got {d})",
                            scene.id
                        )));
                    }
                }
            }
        }

        for scene in &self.scenes {
            for target in scene.branch_targets() {
                if !scene_ids.contains(&target) {
                    return Err(LessonError::unknown_scene(
                        target,
                        format!("branch target of question {}", scene.id),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Condition that advances from one scene to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    AutoTimer,
    AutoTts,
    ButtonTap,
    AwaitAnswer,
}

/// Worst validation severity last stamped on a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    #[default]
    Ok,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    Dialogue,
    Pause,
    Question,
    Celebration,
}

impl SceneKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dialogue => "dialogue",
            Self::Pause => "pause",
            Self::Question => "question",
            Self::Celebration => "celebration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub duration_secs: f64,
    pub transition: TransitionKind,
    #[serde(default)]
    pub status: SceneStatus,
    pub body: SceneBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneBody {
    Dialogue(SpeakingPart),
    Pause(PausePart),
    Question(QuestionPart),
    Celebration(SpeakingPart),
}

impl Scene {
    pub fn kind(&self) -> SceneKind {
        match self.body {
            SceneBody::Dialogue(_) => SceneKind::Dialogue,
            SceneBody::Pause(_) => SceneKind::Pause,
            SceneBody::Question(_) => SceneKind::Question,
            SceneBody::Celebration(_) => SceneKind::Celebration,
        }
    }

    /// Character, emotion and text; `None` for pauses.
    pub fn speaking(&self) -> Option<&SpeakingPart> {
        match &self.body {
            SceneBody::Dialogue(p) | SceneBody::Celebration(p) => Some(p),
            SceneBody::Question(q) => Some(&q.prompt),
            SceneBody::Pause(_) => None,
        }
    }

    pub(crate) fn speaking_mut(&mut self) -> Option<&mut SpeakingPart> {
        match &mut self.body {
            SceneBody::Dialogue(p) | SceneBody::Celebration(p) => Some(p),
            SceneBody::Question(q) => Some(&mut q.prompt),
            SceneBody::Pause(_) => None,
        }
    }

    pub fn question(&self) -> Option<&QuestionPart> {
        match &self.body {
            SceneBody::Question(q) => Some(q),
            _ => None,
        }
    }

    pub(crate) fn question_mut(&mut self) -> Option<&mut QuestionPart> {
        match &mut self.body {
            SceneBody::Question(q) => Some(q),
            _ => None,
        }
    }

    pub fn objects(&self) -> &[PlacedObject] {
        match &self.body {
            SceneBody::Dialogue(p) | SceneBody::Celebration(p) => &p.objects,
            SceneBody::Question(q) => &q.prompt.objects,
            SceneBody::Pause(p) => &p.objects,
        }
    }

    pub(crate) fn objects_mut(&mut self) -> &mut Vec<PlacedObject> {
        match &mut self.body {
            SceneBody::Dialogue(p) | SceneBody::Celebration(p) => &mut p.objects,
            SceneBody::Question(q) => &mut q.prompt.objects,
            SceneBody::Pause(p) => &mut p.objects,
        }
    }

    pub fn entry(&self, lang: &LangCode) -> Option<&LocalizationEntry> {
        self.speaking().and_then(|p| p.texts.get(lang))
    }

    /// Trimmed text for `lang`, or `None` when absent or blank.
    pub fn text(&self, lang: &LangCode) -> Option<&str> {
        self.entry(lang)
            .map(|e| e.text.trim())
            .filter(|t| !t.is_empty())
    }

    /// Explicit question edges (success scene, alternate scene).
    pub fn branch_targets(&self) -> impl Iterator<Item = SceneId> + '_ {
        let q = self.question();
        let success = q.and_then(|q| match q.on_success {
            SuccessTarget::Scene { scene } => Some(scene),
            SuccessTarget::Next => None,
        });
        let failure = q.and_then(|q| match q.on_failure {
            FailurePolicy::AlternateScene { scene } => Some(scene),
            FailurePolicy::Retry | FailurePolicy::Hint { .. } => None,
        });
        success.into_iter().chain(failure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Neutral,
    Happy,
    Excited,
    Thinking,
    Celebrating,
    Sad,
    Surprised,
}

/// Shared content of dialogue, question and celebration scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakingPart {
    pub character: String,
    pub emotion: Emotion,
    #[serde(default)]
    pub texts: BTreeMap<LangCode, LocalizationEntry>,
    #[serde(default)]
    pub objects: Vec<PlacedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator_note: Option<String>,
}

impl SpeakingPart {
    pub fn new(character: impl Into<String>, emotion: Emotion) -> Self {
        Self {
            character: character.into(),
            emotion,
            texts: BTreeMap::new(),
            objects: Vec::new(),
            translator_note: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PausePart {
    #[serde(default)]
    pub objects: Vec<PlacedObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPart {
    pub prompt: SpeakingPart,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    #[serde(default)]
    pub on_success: SuccessTarget,
    #[serde(default)]
    pub on_failure: FailurePolicy,
    #[serde(default)]
    pub settings: QuestionSettings,
}

impl QuestionPart {
    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.correct).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
    #[serde(default)]
    pub correct: bool,
}

impl AnswerOption {
    pub fn new(label: impl Into<String>, correct: bool) -> Self {
        Self {
            label: label.into(),
            correct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "to", rename_all = "snake_case")]
pub enum SuccessTarget {
    /// Continue with the following scene.
    #[default]
    Next,
    Scene {
        scene: SceneId,
    },
}

/// What happens after a wrong answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Re-enter the same question with no state change.
    #[default]
    Retry,
    AlternateScene {
        scene: SceneId,
    },
    /// Show a hint, then re-enter the question.
    Hint {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSettings {
    #[serde(default)]
    pub shuffle_options: bool,
    #[serde(default = "default_true")]
    pub show_previous_objects: bool,
    #[serde(default = "default_answer_timeout")]
    pub answer_timeout_secs: u32,
}

fn default_true() -> bool {
    true
}

fn default_answer_timeout() -> u32 {
    30
}

impl Default for QuestionSettings {
    fn default() -> Self {
        Self {
            shuffle_options: false,
            show_previous_objects: true,
            answer_timeout_secs: default_answer_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Original,
    MachineTranslated,
    HumanEdited,
    Missing,
}

impl EntryStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::MachineTranslated => "machine_translated",
            Self::HumanEdited => "human_edited",
            Self::Missing => "missing",
        }
    }
}

/// One language's text for one scene. The (scene, language) key is the owning map entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizationEntry {
    pub text: String,
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl LocalizationEntry {
    pub fn is_missing(&self) -> bool {
        self.status == EntryStatus::Missing || self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Animal,
    Item,
    Board,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationRef {
    pub name: String,
    pub duration_secs: f64,
}

impl AnimationRef {
    pub fn new(name: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            name: name.into(),
            duration_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub object_type: ObjectType,
    /// Asset key, e.g. `butterfly`.
    pub asset: String,
    pub count: u32,
    pub position: CanvasPos,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance: Option<AnimationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<AnimationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<AnimationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

impl PlacedObject {
    pub(crate) fn check(&self) -> LessonResult<()> {
        if self.asset.trim().is_empty() {
            return Err(LessonError::missing_field(format!("object {} asset", self.id)));
        }
        if self.count == 0 {
            return Err(LessonError::invalid_value(format!(
                "object {} count must be >= 1",
                self.id
            )));
        }
        self.position.validate()?;
        for anim in [&self.entrance, &self.active, &self.exit].into_iter().flatten() {
            if anim.name.trim().is_empty() {
                return Err(LessonError::missing_field(format!(
                    "object {} animation name",
                    self.id
                )));
            }
            positive_secs("animation duration", anim.duration_secs)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;
