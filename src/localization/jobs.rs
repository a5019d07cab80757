//! Background capabilities (translation, remote speech timing).
//!
//! Jobs run on their own worker thread and never touch the document. They hand back an
//! [`EntryProposal`] that the editing session applies through the store, so the store keeps a
//! single writer.

use crate::document::model::{EntryStatus, Lesson};
use crate::foundation::error::{LessonError, LessonResult};
use crate::foundation::ids::{LangCode, SceneId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;

/// Cooperative cancellation flag shared between a job and its owner.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancellation was requested; call between units of work.
    pub fn check(&self) -> LessonResult<()> {
        if self.is_cancelled() {
            return Err(LessonError::Cancelled);
        }
        Ok(())
    }
}

/// Handle to a running background job.
pub struct PendingJob<T> {
    token: CancelToken,
    rx: mpsc::Receiver<LessonResult<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T> PendingJob<T> {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Non-blocking poll. `None` while the job is still running.
    pub fn try_take(&mut self) -> Option<LessonResult<T>> {
        match self.rx.try_recv() {
            Ok(res) => {
                self.join();
                Some(res)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.join();
                Some(Err(worker_lost()))
            }
        }
    }

    /// Block until the job finishes or observes cancellation.
    pub fn wait(mut self) -> LessonResult<T> {
        let res = self.rx.recv().unwrap_or_else(|_| Err(worker_lost()));
        self.join();
        res
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("background job worker panicked");
            }
        }
    }
}

fn worker_lost() -> LessonError {
    LessonError::Other(anyhow::anyhow!("background job worker exited without a result"))
}

/// Run `work` on a named worker thread.
///
/// A result produced after cancellation was requested is replaced by `Err(Cancelled)`.
pub fn spawn_job<T, F>(name: &str, work: F) -> LessonResult<PendingJob<T>>
where
    T: Send + 'static,
    F: FnOnce(&CancelToken) -> LessonResult<T> + Send + 'static,
{
    let token = CancelToken::default();
    let (tx, rx) = mpsc::sync_channel(1);
    let worker_token = token.clone();
    let job_name = name.to_string();
    let handle = std::thread::Builder::new()
        .name(format!("lessonkit-{name}"))
        .spawn(move || {
            let span = tracing::debug_span!("job", name = %job_name);
            let _enter = span.enter();
            let res = worker_token.check().and_then(|()| work(&worker_token));
            let res = match res {
                Ok(_) if worker_token.is_cancelled() => Err(LessonError::Cancelled),
                other => other,
            };
            if let Err(e) = &res {
                tracing::debug!(error = %e, "job finished with error");
            }
            // The owner may have dropped the handle; nothing to deliver to then.
            let _ = tx.send(res);
        })
        .map_err(|e| LessonError::Other(anyhow::anyhow!("spawn worker thread: {e}")))?;

    Ok(PendingJob {
        token,
        rx,
        handle: Some(handle),
    })
}

/// External machine-translation service.
pub trait TranslationProvider: Send + Sync {
    /// Translate `text`. Long-running implementations should poll `cancel`.
    fn translate(
        &self,
        text: &str,
        from: &LangCode,
        to: &LangCode,
        cancel: &CancelToken,
    ) -> LessonResult<String>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationRequest {
    pub scene: SceneId,
    pub from: LangCode,
    pub to: LangCode,
    pub text: String,
}

/// A localization entry computed off-thread, to be applied by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryProposal {
    pub scene: SceneId,
    pub lang: LangCode,
    pub text: String,
    pub status: EntryStatus,
}

/// Requests for every speaking scene that has primary text but no usable `target` entry.
pub fn translation_requests(lesson: &Lesson, target: &LangCode) -> Vec<TranslationRequest> {
    let primary = lesson.primary_language();
    if target == primary {
        return Vec::new();
    }
    lesson
        .scenes()
        .iter()
        .filter(|s| s.entry(target).is_none_or(|e| e.is_missing()))
        .filter_map(|s| {
            s.text(primary).map(|text| TranslationRequest {
                scene: s.id,
                from: primary.clone(),
                to: target.clone(),
                text: text.to_string(),
            })
        })
        .collect()
}

pub fn spawn_translation(
    provider: Arc<dyn TranslationProvider>,
    request: TranslationRequest,
) -> LessonResult<PendingJob<EntryProposal>> {
    let name = format!("translate-{}-{}", request.scene, request.to);
    spawn_job(&name, move |cancel| {
        let text = provider.translate(&request.text, &request.from, &request.to, cancel)?;
        Ok(EntryProposal {
            scene: request.scene,
            lang: request.to,
            text,
            status: EntryStatus::MachineTranslated,
        })
    })
}

#[cfg(test)]
#[path = "../../tests/unit/localization/jobs.rs"]
mod tests;
