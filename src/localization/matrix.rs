use crate::config::ValidationOpts;
use crate::document::model::{EntryStatus, Lesson, Scene, SceneKind, TransitionKind};
use crate::foundation::ids::{LangCode, SceneId};
use crate::validate::issues::{IssueField, Severity, ValidationIssue};

// Keeps 3.1s against a 2.1s baseline at "exactly one second over".
const OVERRUN_EPSILON: f64 = 1e-9;

/// Why a translation is flagged as too long.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Overrun {
    /// Longer than the primary-language baseline by more than the threshold.
    Baseline { delta_secs: f64, threshold_secs: f64 },
    /// Longer than the scene's own fixed duration.
    SceneDuration {
        duration_secs: f64,
        scene_secs: f64,
    },
}

/// Duration-overrun policy for one translation of a TTS-driven scene.
///
/// The baseline rule wins when both apply.
pub fn overrun(
    baseline_secs: f64,
    candidate_secs: f64,
    scene_secs: f64,
    threshold_secs: f64,
) -> Option<Overrun> {
    let delta = candidate_secs - baseline_secs;
    if delta > threshold_secs + OVERRUN_EPSILON {
        return Some(Overrun::Baseline {
            delta_secs: delta,
            threshold_secs,
        });
    }
    if candidate_secs > scene_secs + OVERRUN_EPSILON {
        return Some(Overrun::SceneDuration {
            duration_secs: candidate_secs,
            scene_secs,
        });
    }
    None
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MatrixCell {
    pub lang: LangCode,
    pub status: EntryStatus,
    pub text: String,
    pub duration_secs: Option<f64>,
    /// Difference to the primary-language duration.
    pub delta_secs: Option<f64>,
    pub overrun: Option<Overrun>,
}

impl MatrixCell {
    pub fn is_missing(&self) -> bool {
        self.status == EntryStatus::Missing || self.text.trim().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MatrixRow {
    pub scene: SceneId,
    pub kind: SceneKind,
    pub position: usize,
    pub transition: TransitionKind,
    pub scene_secs: f64,
    pub baseline_secs: Option<f64>,
    /// One cell per enabled language, primary first.
    pub cells: Vec<MatrixCell>,
}

impl MatrixRow {
    pub fn cell(&self, lang: &LangCode) -> Option<&MatrixCell> {
        self.cells.iter().find(|c| &c.lang == lang)
    }
}

/// Scene x language table of text, provenance and duration for every speaking scene.
#[derive(Clone, Debug, serde::Serialize)]
pub struct LocalizationMatrix {
    primary: LangCode,
    languages: Vec<LangCode>,
    rows: Vec<MatrixRow>,
}

impl LocalizationMatrix {
    #[tracing::instrument(skip_all, fields(scenes = lesson.scenes().len()))]
    pub fn build(lesson: &Lesson, opts: &ValidationOpts) -> Self {
        let primary = lesson.primary_language().clone();
        let mut languages = vec![primary.clone()];
        languages.extend(lesson.languages().iter().filter(|l| **l != primary).cloned());

        let rows = lesson
            .scenes()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.speaking().is_some())
            .map(|(position, scene)| build_row(scene, position, &primary, &languages, opts))
            .collect();

        Self {
            primary,
            languages,
            rows,
        }
    }

    pub fn primary(&self) -> &LangCode {
        &self.primary
    }

    pub fn languages(&self) -> &[LangCode] {
        &self.languages
    }

    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    pub fn row(&self, scene: SceneId) -> Option<&MatrixRow> {
        self.rows.iter().find(|r| r.scene == scene)
    }

    /// `(present, total)` entries for a language across speaking scenes.
    pub fn coverage(&self, lang: &LangCode) -> (usize, usize) {
        let total = self.rows.len();
        let present = self
            .rows
            .iter()
            .filter_map(|r| r.cell(lang))
            .filter(|c| !c.is_missing())
            .count();
        (present, total)
    }

    pub fn overruns(&self) -> impl Iterator<Item = (&MatrixRow, &MatrixCell)> + '_ {
        self.rows.iter().flat_map(|row| {
            row.cells
                .iter()
                .filter(|c| c.overrun.is_some())
                .map(move |c| (row, c))
        })
    }

    /// Missing translations and duration overruns.
    ///
    /// Blank primary text on dialogue and question scenes is a structural error reported by the
    /// validator, so those cells are skipped here.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for row in &self.rows {
            let tts = row.transition == TransitionKind::AutoTts;
            let needs_text = matches!(row.kind, SceneKind::Dialogue | SceneKind::Question);
            let cells = row
                .cells
                .iter()
                .filter(|c| !(needs_text && c.lang == self.primary));
            for cell in cells {
                if cell.is_missing() {
                    let severity = if tts {
                        Severity::Error
                    } else {
                        Severity::Warning
                    };
                    issues.push(
                        ValidationIssue::new(
                            severity,
                            Some(row.scene),
                            IssueField::Localization,
                            format!("Missing {} translation", cell.lang),
                        )
                        .with_language(cell.lang.clone()),
                    );
                    continue;
                }
                if let Some(o) = cell.overrun {
                    let message = match o {
                        Overrun::Baseline { delta_secs, .. } => format!(
                            "{} TTS is {delta_secs:.1}s longer than {}",
                            cell.lang, self.primary
                        ),
                        Overrun::SceneDuration {
                            duration_secs,
                            scene_secs,
                        } => format!(
                            "{} TTS ({duration_secs:.1}s) exceeds scene duration ({scene_secs:.1}s)",
                            cell.lang
                        ),
                    };
                    issues.push(
                        ValidationIssue::warning(row.scene, IssueField::Localization, message)
                            .with_language(cell.lang.clone()),
                    );
                }
            }
        }
        issues
    }
}

fn build_row(
    scene: &Scene,
    position: usize,
    primary: &LangCode,
    languages: &[LangCode],
    opts: &ValidationOpts,
) -> MatrixRow {
    let baseline_secs = scene
        .entry(primary)
        .filter(|e| !e.is_missing())
        .and_then(|e| e.duration_secs);
    let tts = scene.transition == TransitionKind::AutoTts;

    let cells = languages
        .iter()
        .map(|lang| {
            let entry = scene.entry(lang);
            let duration_secs = entry.filter(|e| !e.is_missing()).and_then(|e| e.duration_secs);
            let delta_secs = match (baseline_secs, duration_secs) {
                (Some(b), Some(d)) if lang != primary => Some(d - b),
                _ => None,
            };
            let overrun = match (baseline_secs, duration_secs) {
                (Some(b), Some(d)) if tts && lang != primary => {
                    overrun(b, d, scene.duration_secs, opts.overrun_threshold_secs)
                }
                _ => None,
            };
            MatrixCell {
                lang: lang.clone(),
                status: entry.map_or(EntryStatus::Missing, |e| e.status),
                text: entry.map(|e| e.text.clone()).unwrap_or_default(),
                duration_secs,
                delta_secs,
                overrun,
            }
        })
        .collect();

    MatrixRow {
        scene: scene.id,
        kind: scene.kind(),
        position,
        transition: scene.transition,
        scene_secs: scene.duration_secs,
        baseline_secs,
        cells,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/localization/matrix.rs"]
mod tests;
