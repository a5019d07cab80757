use crate::document::model::{Lesson, LessonHeader, Scene};
use crate::foundation::error::{LessonError, LessonResult};
use crate::foundation::ids::{IdAllocator, SceneId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const FORMAT_TAG: &str = "lessonkit/1";

/// On-disk layout of a lesson.
///
/// Scenes are keyed by identity and ordered by a separate list, so branch edges survive
/// reordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonFile {
    pub format: String,
    pub lesson: LessonHeader,
    pub order: Vec<SceneId>,
    #[serde(default)]
    pub scenes: BTreeMap<SceneId, Scene>,
    #[serde(default)]
    pub next_id: u64,
}

impl LessonFile {
    pub fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            lesson: lesson.header.clone(),
            order: lesson.scene_ids(),
            scenes: lesson.scenes.iter().map(|s| (s.id, s.clone())).collect(),
            next_id: lesson.ids.next,
        }
    }

    pub fn into_lesson(self) -> LessonResult<Lesson> {
        if self.format != FORMAT_TAG {
            return Err(LessonError::persist(format!(
                "format must be \"{FORMAT_TAG}\" (got \"{}\")",
                self.format
            )));
        }

        let mut scenes_by_id = self.scenes;
        let mut seen = HashSet::new();
        let mut scenes = Vec::with_capacity(self.order.len());
        for id in &self.order {
            if !seen.insert(*id) {
                return Err(LessonError::duplicate(format!("scene {id} is listed twice in order")));
            }
            let scene = scenes_by_id
                .remove(id)
                .ok_or_else(|| LessonError::unknown_scene(*id, "listed in order but not defined"))?;
            if scene.id != *id {
                return Err(LessonError::persist(format!(
                    "scene stored under key {id} declares id {}",
                    scene.id
                )));
            }
            scenes.push(scene);
        }
        if let Some(orphan) = scenes_by_id.keys().next() {
            return Err(LessonError::unknown_scene(*orphan, "defined but missing from order"));
        }

        // Older files may omit the watermark; never hand out an identity already in use.
        let max_id = scenes
            .iter()
            .flat_map(|s| std::iter::once(s.id.0).chain(s.objects().iter().map(|o| o.id.0)))
            .max()
            .unwrap_or(0);
        let next = max_id.checked_add(1).ok_or_else(|| {
            LessonError::persist(format!("identity {max_id} leaves no room for new identities"))
        })?;
        let lesson = Lesson {
            header: self.lesson,
            scenes,
            ids: IdAllocator {
                next: self.next_id.max(next),
            },
        };
        lesson.check_structure()?;
        Ok(lesson)
    }
}

impl Lesson {
    /// Parse a lesson from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> LessonResult<Self> {
        let file: LessonFile = serde_json::from_reader(r)
            .map_err(|e| LessonError::persist(format!("parse lesson JSON: {e}")))?;
        file.into_lesson()
    }

    /// Parse a lesson from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> LessonResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            LessonError::persist(format!("open lesson JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn to_writer<W: Write>(&self, w: W) -> LessonResult<()> {
        serde_json::to_writer_pretty(w, &LessonFile::from_lesson(self))
            .map_err(|e| LessonError::persist(format!("write lesson JSON: {e}")))
    }

    pub fn to_path(&self, path: impl AsRef<Path>) -> LessonResult<()> {
        let path = path.as_ref();
        let f = File::create(path).map_err(|e| {
            LessonError::persist(format!("create lesson JSON '{}': {e}", path.display()))
        })?;
        let mut w = BufWriter::new(f);
        self.to_writer(&mut w)?;
        w.flush()
            .map_err(|e| LessonError::persist(format!("flush '{}': {e}", path.display())))
    }

    pub fn to_json_string(&self) -> LessonResult<String> {
        serde_json::to_string_pretty(&LessonFile::from_lesson(self))
            .map_err(|e| LessonError::persist(format!("serialize lesson: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/persist.rs"]
mod tests;
