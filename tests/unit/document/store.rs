use super::*;
use crate::document::model::{AnswerOption, LessonSettings, ObjectType, SceneKind, TransitionKind};
use crate::validate::issues::{IssueField, Severity};

fn lang(code: &str) -> LangCode {
    LangCode::new(code).unwrap()
}

fn draft(kind: SceneKind) -> SceneDraft {
    SceneDraft::template(kind, &LessonSettings::default())
}

fn dialogue(text: &str) -> SceneDraft {
    draft(SceneKind::Dialogue).text(lang("en"), text, EntryStatus::Original)
}

fn question(correct: &[bool]) -> SceneDraft {
    let options = correct
        .iter()
        .enumerate()
        .map(|(i, c)| AnswerOption::new((i + 1).to_string(), *c))
        .collect();
    draft(SceneKind::Question)
        .text(lang("en"), "How many butterflies?", EntryStatus::Original)
        .options(options)
}

fn open_en_fr() -> DocumentStore {
    let mut lesson = Lesson::new("counting-1-5", "Counting 1-5", lang("en"));
    lesson.header.languages.insert(lang("fr"));
    DocumentStore::open(lesson, EngineOpts::default()).unwrap()
}

/// s1 dialogue, s2 celebration, then a question inserted between them whose success edge
/// targets the celebration.
fn branching_store() -> (DocumentStore, SceneId, SceneId, SceneId) {
    let mut store = open_en_fr();
    let intro = store.add_scene(dialogue("Let's count!")).unwrap();
    let party = store.add_scene(draft(SceneKind::Celebration)).unwrap();
    let q = store
        .insert_scene(
            1,
            question(&[false, true, false]).on_success(SuccessTarget::Scene { scene: party }),
        )
        .unwrap();
    (store, intro, q, party)
}

#[test]
fn insert_assigns_fresh_ids_and_keeps_order() {
    let (store, intro, q, party) = branching_store();
    assert_eq!(store.lesson().scene_ids(), vec![intro, q, party]);
    assert_eq!((intro, party, q), (SceneId(1), SceneId(2), SceneId(3)));
    assert!(store.lesson().next_id() > q.0);
}

#[test]
fn insert_past_the_end_is_rejected() {
    let mut store = open_en_fr();
    let err = store.insert_scene(1, dialogue("Hi")).unwrap_err();
    assert!(matches!(err, LessonError::InvalidValue(_)));
    assert!(store.lesson().scenes().is_empty());
}

#[test]
fn insert_then_remove_restores_scenes() {
    let (mut store, _, _, _) = branching_store();
    let before = store.lesson().clone();

    let extra = store.insert_scene(2, dialogue("One more")).unwrap();
    assert_eq!(store.lesson().scenes().len(), before.scenes().len() + 1);
    store.remove_scene(extra).unwrap();

    assert_eq!(store.lesson().scenes(), before.scenes());
    assert_eq!(store.lesson().header().title, before.header().title);
}

#[test]
fn insertion_keeps_branch_targets_pointing_at_the_same_scene() {
    let (mut store, _, q, party) = branching_store();
    store.insert_scene(0, dialogue("Hello again")).unwrap();
    store.move_scene(party, 1).unwrap();

    let scene = store.lesson().scene(q).unwrap();
    assert_eq!(
        scene.question().unwrap().on_success,
        SuccessTarget::Scene { scene: party }
    );
    assert!(store.graph().successors(q).any(|to| to == party));
}

#[test]
fn removing_a_success_target_is_rejected_until_repointed() {
    let (mut store, _, q, party) = branching_store();
    let before = store.lesson().clone();

    let err = store.remove_scene(party).unwrap_err();
    match err {
        LessonError::UnknownScene { scene, detail } => {
            assert_eq!(scene, party);
            assert!(detail.contains(&q.to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.lesson(), &before);

    store
        .update_scene_field(q, SceneField::SuccessTarget(SuccessTarget::Next))
        .unwrap();
    store.remove_scene(party).unwrap();
    assert!(!store.lesson().contains_scene(party));
}

#[test]
fn branch_edit_to_missing_scene_is_rejected() {
    let (mut store, _, q, _) = branching_store();
    let err = store
        .update_scene_field(
            q,
            SceneField::FailurePolicy(FailurePolicy::AlternateScene { scene: SceneId(99) }),
        )
        .unwrap_err();
    assert!(matches!(err, LessonError::UnknownScene { scene: SceneId(99), .. }));
}

#[test]
fn auto_tts_needs_primary_text_first() {
    let mut store = open_en_fr();
    let s = store.add_scene(draft(SceneKind::Dialogue)).unwrap();

    let err = store
        .update_scene_field(s, SceneField::Transition(TransitionKind::AutoTts))
        .unwrap_err();
    assert!(matches!(err, LessonError::InvalidTransition { .. }));
    assert_eq!(
        store.lesson().scene(s).unwrap().transition,
        TransitionKind::AutoTimer
    );

    store
        .set_language_entry(s, &lang("en"), "Let's count butterflies!", EntryStatus::Original)
        .unwrap();
    store
        .update_scene_field(s, SceneField::Transition(TransitionKind::AutoTts))
        .unwrap();
    assert_eq!(
        store.lesson().scene(s).unwrap().transition,
        TransitionKind::AutoTts
    );
    store.validate_transition(s).unwrap();
}

#[test]
fn await_answer_only_on_questions() {
    let mut store = open_en_fr();
    let s = store.add_scene(dialogue("Hi")).unwrap();
    let err = store
        .update_scene_field(s, SceneField::Transition(TransitionKind::AwaitAnswer))
        .unwrap_err();
    assert!(matches!(err, LessonError::InvalidTransition { .. }));

    let err = store
        .add_scene(dialogue("Hi").transition(TransitionKind::AwaitAnswer))
        .unwrap_err();
    assert!(matches!(err, LessonError::InvalidTransition { .. }));
    assert_eq!(store.lesson().scenes().len(), 1);
}

#[test]
fn question_fields_do_not_apply_to_dialogue() {
    let mut store = open_en_fr();
    let s = store.add_scene(dialogue("Hi")).unwrap();
    let err = store
        .update_scene_field(s, SceneField::Options(vec![AnswerOption::new("1", true)]))
        .unwrap_err();
    assert!(err.to_string().contains("does not apply to dialogue scenes"));
}

#[test]
fn zero_duration_is_rejected() {
    let mut store = open_en_fr();
    let s = store.add_scene(dialogue("Hi")).unwrap();
    assert!(store.update_scene_field(s, SceneField::Duration(0.0)).is_err());
    assert!(store.add_scene(dialogue("Hi").duration(-1.0)).is_err());
    assert_eq!(store.lesson().scene(s).unwrap().duration_secs, 4.0);
}

#[test]
fn language_entries_respect_enabled_languages() {
    let mut store = open_en_fr();
    let s = store.add_scene(dialogue("Hi")).unwrap();

    let err = store
        .set_language_entry(s, &lang("de"), "Hallo", EntryStatus::HumanEdited)
        .unwrap_err();
    assert!(matches!(err, LessonError::UnknownLanguage(code) if code == "de"));

    store
        .set_language_entry(s, &lang("fr"), "Salut", EntryStatus::HumanEdited)
        .unwrap();
    let entry = store.lesson().scene(s).unwrap().entry(&lang("fr")).unwrap();
    assert_eq!(entry.status, EntryStatus::HumanEdited);
    assert!(entry.duration_secs.unwrap() > 0.0);

    store
        .set_language_entry(s, &lang("fr"), "   ", EntryStatus::HumanEdited)
        .unwrap();
    let entry = store.lesson().scene(s).unwrap().entry(&lang("fr")).unwrap();
    assert_eq!(entry.status, EntryStatus::Missing);
    assert_eq!(entry.duration_secs, None);
}

#[test]
fn pause_scenes_carry_no_text() {
    let mut store = open_en_fr();
    let p = store.add_scene(draft(SceneKind::Pause)).unwrap();
    let err = store
        .set_language_entry(p, &lang("en"), "Hi", EntryStatus::Original)
        .unwrap_err();
    assert!(matches!(err, LessonError::InvalidValue(_)));
}

#[test]
fn language_management() {
    let mut store = open_en_fr();
    let s = store.add_scene(dialogue("Hi")).unwrap();
    store
        .set_language_entry(s, &lang("fr"), "Salut", EntryStatus::HumanEdited)
        .unwrap();

    let err = store.enable_language(lang("fr")).unwrap_err();
    assert!(matches!(err, LessonError::DuplicateLanguage(_)));

    let err = store.disable_language(&lang("en")).unwrap_err();
    assert!(matches!(err, LessonError::InvalidValue(_)));

    store.disable_language(&lang("fr")).unwrap();
    assert!(!store.lesson().languages().contains(&lang("fr")));
    assert!(store.lesson().scene(s).unwrap().entry(&lang("fr")).is_none());

    store.enable_language(lang("my")).unwrap();
    store.set_primary_language(&lang("my")).unwrap();
    assert_eq!(store.lesson().primary_language(), &lang("my"));
    assert!(store.set_primary_language(&lang("fr")).is_err());
}

#[test]
fn lesson_fields_are_cleaned() {
    let mut store = open_en_fr();
    let err = store
        .update_lesson(LessonField::Title("   ".to_string()))
        .unwrap_err();
    assert!(matches!(err, LessonError::MissingRequiredField(_)));

    store
        .update_lesson(LessonField::Title("  Counting to five ".to_string()))
        .unwrap();
    store
        .update_lesson(LessonField::Tags(vec![
            "numbers".to_string(),
            " numbers ".to_string(),
            "".to_string(),
            "butterflies".to_string(),
        ]))
        .unwrap();
    let header = store.lesson().header();
    assert_eq!(header.title, "Counting to five");
    assert_eq!(header.tags, vec!["numbers", "butterflies"]);

    assert!(store.update_lesson(LessonField::DefaultPauseSecs(0.0)).is_err());
}

#[test]
fn object_lifecycle() {
    let mut store = open_en_fr();
    let s = store.add_scene(dialogue("Look!")).unwrap();
    let o = store
        .add_object(s, ObjectDraft::new(ObjectType::Animal, "butterfly").count(3))
        .unwrap();
    assert_eq!(store.lesson().scene(s).unwrap().objects()[0].id, o);

    store.update_object(s, o, ObjectField::Count(5)).unwrap();
    assert_eq!(store.lesson().scene(s).unwrap().objects()[0].count, 5);
    assert!(store.update_object(s, o, ObjectField::Count(0)).is_err());

    let err = store.remove_object(s, ObjectId(42)).unwrap_err();
    assert!(matches!(err, LessonError::UnknownObject { .. }));
    store.remove_object(s, o).unwrap();
    assert!(store.lesson().scene(s).unwrap().objects().is_empty());
}

#[test]
fn validation_runs_after_every_edit() {
    let mut store = open_en_fr();
    let q = store.add_scene(question(&[false, false])).unwrap();
    assert!(store.issue_summary().has_errors());
    assert_eq!(store.lesson().scene(q).unwrap().status, SceneStatus::Error);

    store
        .update_scene_field(
            q,
            SceneField::Options(vec![AnswerOption::new("1", false), AnswerOption::new("2", true)]),
        )
        .unwrap();
    assert!(
        !store
            .issues()
            .iter()
            .any(|i| i.field == IssueField::Options && i.severity == Severity::Error)
    );
}

#[test]
fn failed_edit_leaves_document_untouched() {
    let (mut store, intro, _, _) = branching_store();
    let before = store.lesson().clone();
    let journal = store.history().entries().count();

    assert!(store.move_scene(intro, 7).is_err());
    assert!(store.remove_scene(SceneId(50)).is_err());

    assert_eq!(store.lesson(), &before);
    assert_eq!(store.history().entries().count(), journal);
}

#[test]
fn undo_redo_and_identity_watermark() {
    let mut store = open_en_fr();
    let a = store.add_scene(dialogue("One")).unwrap();
    let b = store.add_scene(dialogue("Two")).unwrap();

    assert!(store.undo());
    assert!(!store.lesson().contains_scene(b));
    assert!(store.redo());
    assert!(store.lesson().contains_scene(b));

    assert!(store.undo());
    let c = store.add_scene(dialogue("Three")).unwrap();
    assert_ne!(c, b);
    assert!(c.0 > b.0);
    assert!(!store.redo());
    assert_eq!(store.lesson().scene_ids(), vec![a, c]);

    assert_eq!(store.history().entries().next().unwrap().op, EditOp::InsertScene);
}

#[test]
fn overrun_flags_follow_thresholds() {
    let estimator: Arc<dyn DurationEstimator> =
        Arc::new(|_: &str, lang: &LangCode| match lang.as_str() {
            "en" => 2.1,
            "my" => 3.5,
            "ru" => 2.8,
            "fr" => 2.3,
            _ => 1.0,
        });
    let mut lesson = Lesson::new("l", "Overruns", lang("en"));
    for code in ["my", "ru", "fr"] {
        lesson.header.languages.insert(lang(code));
    }
    let mut store = DocumentStore::with_estimator(lesson, EngineOpts::default(), estimator).unwrap();

    let s = store
        .add_scene(
            dialogue("Let's count!")
                .duration(10.0)
                .transition(TransitionKind::AutoTts)
                .text(lang("my"), "x", EntryStatus::MachineTranslated)
                .text(lang("ru"), "x", EntryStatus::MachineTranslated)
                .text(lang("fr"), "x", EntryStatus::HumanEdited),
        )
        .unwrap();

    let flagged = |store: &DocumentStore| -> Vec<String> {
        store
            .issues()
            .iter()
            .filter(|i| i.field == IssueField::Localization)
            .filter_map(|i| i.language.as_ref().map(|l| l.to_string()))
            .collect()
    };
    assert_eq!(flagged(&store), vec!["my"]);

    store.update_scene_field(s, SceneField::Duration(2.5)).unwrap();
    let mut langs = flagged(&store);
    langs.sort();
    assert_eq!(langs, vec!["my", "ru"]);
}

#[test]
fn proposals_apply_through_the_store() {
    let mut store = open_en_fr();
    let s = store.add_scene(dialogue("Hi")).unwrap();
    store
        .apply_proposal(EntryProposal {
            scene: s,
            lang: lang("fr"),
            text: "Salut".to_string(),
            status: EntryStatus::MachineTranslated,
        })
        .unwrap();
    let entry = store.lesson().scene(s).unwrap().entry(&lang("fr")).unwrap();
    assert_eq!(entry.status, EntryStatus::MachineTranslated);
}

#[test]
fn refresh_durations_uses_current_estimator() {
    let mut lesson = Lesson::new("l", "T", lang("en"));
    lesson.header.languages.insert(lang("fr"));
    let estimator: Arc<dyn DurationEstimator> = Arc::new(|_: &str, _: &LangCode| 1.5);
    let mut store = DocumentStore::with_estimator(lesson, EngineOpts::default(), estimator).unwrap();
    let s = store.add_scene(dialogue("Hi")).unwrap();
    store.refresh_durations().unwrap();
    let entry = store.lesson().scene(s).unwrap().entry(&lang("en")).unwrap();
    assert_eq!(entry.duration_secs, Some(1.5));
}

#[test]
fn duplicate_scene_gets_fresh_identities() {
    let (mut store, intro, q, party) = branching_store();
    let obj = store
        .add_object(q, ObjectDraft::new(ObjectType::Animal, "butterfly").count(3))
        .unwrap();
    let watermark = store.lesson().next_id();

    let copy = store.duplicate_scene(q, 2).unwrap();
    let lesson = store.lesson();
    assert_eq!(copy, SceneId(watermark));
    assert_eq!(lesson.scene_ids(), vec![intro, q, copy, party]);

    let original = lesson.scene(q).unwrap();
    let dup = lesson.scene(copy).unwrap();
    assert_eq!(dup.text(&lang("en")), original.text(&lang("en")));
    assert_eq!(
        dup.question().unwrap().on_success,
        SuccessTarget::Scene { scene: party }
    );
    assert_eq!(dup.objects().len(), 1);
    assert_ne!(dup.objects()[0].id, obj);
    assert!(dup.objects()[0].id.0 > copy.0);
    assert_eq!(lesson.referrers_of(party), vec![q, copy]);
    assert_eq!(store.history().entries().last().unwrap().op, EditOp::DuplicateScene);
}

#[test]
fn duplicate_scene_rejects_bad_requests_unchanged() {
    let (mut store, intro, _, _) = branching_store();
    let before = store.lesson().clone();
    assert!(matches!(
        store.duplicate_scene(SceneId(99), 0),
        Err(LessonError::UnknownScene { .. })
    ));
    assert!(store.duplicate_scene(intro, 4).is_err());
    assert_eq!(store.lesson(), &before);

    store.duplicate_scene(intro, 3).unwrap();
    store.undo();
    let again = store.duplicate_scene(intro, 0).unwrap();
    assert!(again.0 >= before.next_id() + 1);
}
