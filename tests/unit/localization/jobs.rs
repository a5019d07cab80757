use super::*;
use crate::config::EngineOpts;
use crate::document::edit::SceneDraft;
use crate::document::model::{LessonSettings, SceneKind};
use crate::document::store::DocumentStore;
use std::time::{Duration, Instant};

fn lang(code: &str) -> LangCode {
    LangCode::new(code).unwrap()
}

struct Shouting;

impl TranslationProvider for Shouting {
    fn translate(
        &self,
        text: &str,
        _from: &LangCode,
        to: &LangCode,
        cancel: &CancelToken,
    ) -> LessonResult<String> {
        cancel.check()?;
        Ok(format!("[{to}] {}", text.to_uppercase()))
    }
}

#[test]
fn job_delivers_its_result() {
    let job = spawn_job("sum", |_| Ok(2 + 2)).unwrap();
    assert_eq!(job.wait().unwrap(), 4);
}

#[test]
fn job_errors_are_propagated() {
    let job = spawn_job::<(), _>("fail", |_| Err(LessonError::invalid_value("nope"))).unwrap();
    assert!(matches!(job.wait(), Err(LessonError::InvalidValue(_))));
}

#[test]
fn cancellation_is_observed() {
    let job = spawn_job("spin", |cancel| {
        let start = Instant::now();
        while !cancel.is_cancelled() && start.elapsed() < Duration::from_secs(10) {
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    })
    .unwrap();
    job.cancel();
    assert!(job.token().is_cancelled());
    assert!(matches!(job.wait(), Err(LessonError::Cancelled)));
}

#[test]
fn try_take_polls_until_done() {
    let mut job = spawn_job("quick", |_| Ok("done")).unwrap();
    let start = Instant::now();
    let res = loop {
        if let Some(res) = job.try_take() {
            break res;
        }
        assert!(start.elapsed() < Duration::from_secs(10));
        std::thread::sleep(Duration::from_millis(1));
    };
    assert_eq!(res.unwrap(), "done");
}

#[test]
fn translation_round_trip_through_the_store() {
    let mut lesson = Lesson::new("l", "Jobs", lang("en"));
    lesson.header.languages.insert(lang("fr"));
    let mut store = DocumentStore::open(lesson, EngineOpts::default()).unwrap();
    let settings = LessonSettings::default();
    let hello = store
        .add_scene(SceneDraft::template(SceneKind::Dialogue, &settings).text(
            lang("en"),
            "Hello",
            EntryStatus::Original,
        ))
        .unwrap();
    store
        .add_scene(SceneDraft::template(SceneKind::Pause, &settings))
        .unwrap();
    let done = store
        .add_scene(
            SceneDraft::template(SceneKind::Celebration, &settings)
                .text(lang("en"), "Great job", EntryStatus::Original)
                .text(lang("fr"), "Bravo", EntryStatus::HumanEdited),
        )
        .unwrap();

    let requests = translation_requests(store.lesson(), &lang("fr"));
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].scene, hello);
    assert!(translation_requests(store.lesson(), &lang("en")).is_empty());

    let provider: Arc<dyn TranslationProvider> = Arc::new(Shouting);
    let job = spawn_translation(provider, requests[0].clone()).unwrap();
    let proposal = job.wait().unwrap();
    assert_eq!(proposal.text, "[fr] HELLO");
    assert_eq!(proposal.status, EntryStatus::MachineTranslated);

    store.apply_proposal(proposal).unwrap();
    assert!(translation_requests(store.lesson(), &lang("fr")).is_empty());
    assert_eq!(
        store.lesson().scene(done).unwrap().text(&lang("fr")),
        Some("Bravo")
    );
}
