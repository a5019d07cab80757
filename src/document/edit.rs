//! Arguments for document store mutations.

use crate::document::model::{
    AnimationRef, AnswerOption, Difficulty, Emotion, EntryStatus, FailurePolicy, LessonSettings,
    LocalizationEntry, ObjectType, PausePart, QuestionPart, QuestionSettings, SceneBody, SceneKind,
    SpeakingPart, SuccessTarget, Topic, TransitionKind,
};
use crate::foundation::core::CanvasPos;
use crate::foundation::ids::LangCode;

/// A scene before the store has given it an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDraft {
    pub duration_secs: f64,
    pub transition: TransitionKind,
    pub body: SceneBody,
    /// Objects to place; identities are assigned on insertion.
    pub objects: Vec<ObjectDraft>,
}

impl SceneDraft {
    /// Default draft for a scene kind, as offered by the scene template picker.
    pub fn template(kind: SceneKind, settings: &LessonSettings) -> Self {
        let (duration_secs, transition, body) = match kind {
            SceneKind::Dialogue => (
                4.0,
                TransitionKind::AutoTimer,
                SceneBody::Dialogue(SpeakingPart::new("orson", Emotion::Happy)),
            ),
            SceneKind::Pause => (
                settings.default_pause_secs,
                TransitionKind::AutoTimer,
                SceneBody::Pause(PausePart::default()),
            ),
            SceneKind::Question => (
                5.0,
                TransitionKind::AwaitAnswer,
                SceneBody::Question(QuestionPart {
                    prompt: SpeakingPart::new("orson", Emotion::Thinking),
                    options: Vec::new(),
                    on_success: SuccessTarget::Next,
                    on_failure: FailurePolicy::Retry,
                    settings: QuestionSettings::default(),
                }),
            ),
            SceneKind::Celebration => (
                3.0,
                TransitionKind::AutoTimer,
                SceneBody::Celebration(SpeakingPart::new("orson", Emotion::Celebrating)),
            ),
        };
        Self {
            duration_secs,
            transition,
            body,
            objects: Vec::new(),
        }
    }

    pub fn duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn transition(mut self, transition: TransitionKind) -> Self {
        self.transition = transition;
        self
    }

    pub fn character(mut self, character: impl Into<String>, emotion: Emotion) -> Self {
        if let Some(part) = speaking_mut(&mut self.body) {
            part.character = character.into();
            part.emotion = emotion;
        }
        self
    }

    /// Set text for a language. Ignored on pause drafts.
    pub fn text(mut self, lang: LangCode, text: impl Into<String>, status: EntryStatus) -> Self {
        if let Some(part) = speaking_mut(&mut self.body) {
            part.texts.insert(
                lang,
                LocalizationEntry {
                    text: text.into(),
                    status,
                    duration_secs: None,
                },
            );
        }
        self
    }

    /// Replace answer options. Ignored unless this is a question draft.
    pub fn options(mut self, options: Vec<AnswerOption>) -> Self {
        if let SceneBody::Question(q) = &mut self.body {
            q.options = options;
        }
        self
    }

    pub fn on_success(mut self, target: SuccessTarget) -> Self {
        if let SceneBody::Question(q) = &mut self.body {
            q.on_success = target;
        }
        self
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        if let SceneBody::Question(q) = &mut self.body {
            q.on_failure = policy;
        }
        self
    }

    pub fn object(mut self, object: ObjectDraft) -> Self {
        self.objects.push(object);
        self
    }
}

fn speaking_mut(body: &mut SceneBody) -> Option<&mut SpeakingPart> {
    match body {
        SceneBody::Dialogue(p) | SceneBody::Celebration(p) => Some(p),
        SceneBody::Question(q) => Some(&mut q.prompt),
        SceneBody::Pause(_) => None,
    }
}

/// A placed object before the store has given it an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDraft {
    pub object_type: ObjectType,
    pub asset: String,
    pub count: u32,
    pub position: CanvasPos,
    pub entrance: Option<AnimationRef>,
    pub active: Option<AnimationRef>,
    pub exit: Option<AnimationRef>,
    pub sound: Option<String>,
}

impl ObjectDraft {
    pub fn new(object_type: ObjectType, asset: impl Into<String>) -> Self {
        Self {
            object_type,
            asset: asset.into(),
            count: 1,
            position: CanvasPos::center(),
            entrance: None,
            active: None,
            exit: None,
            sound: None,
        }
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn at(mut self, position: CanvasPos) -> Self {
        self.position = position;
        self
    }

    pub fn entrance(mut self, anim: AnimationRef) -> Self {
        self.entrance = Some(anim);
        self
    }

    pub fn active(mut self, anim: AnimationRef) -> Self {
        self.active = Some(anim);
        self
    }

    pub fn exit(mut self, anim: AnimationRef) -> Self {
        self.exit = Some(anim);
        self
    }

    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }
}

/// Single-field scene edit for [`crate::DocumentStore::update_scene_field`].
#[derive(Debug, Clone, PartialEq)]
pub enum SceneField {
    Duration(f64),
    Transition(TransitionKind),
    Character(String),
    Emotion(Emotion),
    TranslatorNote(Option<String>),
    Options(Vec<AnswerOption>),
    SuccessTarget(SuccessTarget),
    FailurePolicy(FailurePolicy),
    QuestionSettings(QuestionSettings),
}

impl SceneField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Duration(_) => "duration",
            Self::Transition(_) => "transition",
            Self::Character(_) => "character",
            Self::Emotion(_) => "emotion",
            Self::TranslatorNote(_) => "translator_note",
            Self::Options(_) => "options",
            Self::SuccessTarget(_) => "on_success",
            Self::FailurePolicy(_) => "on_failure",
            Self::QuestionSettings(_) => "question_settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectField {
    Asset(String),
    Count(u32),
    Position(CanvasPos),
    Entrance(Option<AnimationRef>),
    Active(Option<AnimationRef>),
    Exit(Option<AnimationRef>),
    Sound(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LessonField {
    Title(String),
    Description(String),
    Topic(Topic),
    Difficulty(Difficulty),
    Tags(Vec<String>),
    DefaultPauseSecs(f64),
    DefaultBackground(Option<String>),
}
