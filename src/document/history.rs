use crate::document::model::Lesson;
use crate::foundation::ids::SceneId;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOp {
    InsertScene,
    DuplicateScene,
    RemoveScene,
    MoveScene,
    UpdateScene,
    SetLanguageEntry,
    ClearLanguageEntry,
    EnableLanguage,
    DisableLanguage,
    SetPrimaryLanguage,
    UpdateLesson,
    AddObject,
    UpdateObject,
    RemoveObject,
    RefreshDurations,
    Undo,
    Redo,
}

/// One line of the edit journal.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct EditRecord {
    pub seq: u64,
    pub op: EditOp,
    pub scene: Option<SceneId>,
    pub detail: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct Snapshot {
    lesson: Lesson,
    seq: u64,
}

/// Bounded undo/redo stacks of whole-document snapshots plus a journal of committed edits.
#[derive(Clone, Debug)]
pub struct History {
    limit: usize,
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    journal: VecDeque<EditRecord>,
    next_seq: u64,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            undo: VecDeque::new(),
            redo: Vec::new(),
            journal: VecDeque::new(),
            next_seq: 1,
        }
    }

    /// Record a committed edit; `before` is the document it replaced.
    pub(crate) fn record(
        &mut self,
        before: Lesson,
        op: EditOp,
        scene: Option<SceneId>,
        detail: String,
    ) {
        let seq = self.log(op, scene, detail);
        self.redo.clear();
        if self.limit == 0 {
            return;
        }
        self.undo.push_back(Snapshot { lesson: before, seq });
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Swap `current` for the previous snapshot.
    pub(crate) fn undo(&mut self, current: Lesson) -> Option<Lesson> {
        let snap = self.undo.pop_back()?;
        self.redo.push(Snapshot {
            lesson: current,
            seq: snap.seq,
        });
        self.log(EditOp::Undo, None, format!("undo #{}", snap.seq));
        Some(snap.lesson)
    }

    pub(crate) fn redo(&mut self, current: Lesson) -> Option<Lesson> {
        let snap = self.redo.pop()?;
        self.undo.push_back(Snapshot {
            lesson: current,
            seq: snap.seq,
        });
        self.log(EditOp::Redo, None, format!("redo #{}", snap.seq));
        Some(snap.lesson)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Journal entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &EditRecord> + '_ {
        self.journal.iter().rev()
    }

    fn log(&mut self, op: EditOp, scene: Option<SceneId>, detail: String) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.journal.push_back(EditRecord {
            seq,
            op,
            scene,
            detail,
            at: Utc::now(),
        });
        while self.journal.len() > self.limit.max(1) {
            self.journal.pop_front();
        }
        seq
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/history.rs"]
mod tests;
