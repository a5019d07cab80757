use crate::config::ValidationOpts;
use crate::document::model::{Lesson, Scene, SceneKind};
use crate::graph::scene_graph::SceneGraph;
use crate::graph::transitions::validate_transition;
use crate::localization::matrix::LocalizationMatrix;
use crate::validate::issues::{IssueField, Severity, ValidationIssue, sort_issues};

/// Runs every content check over a lesson and returns one ordered issue list.
#[derive(Clone, Debug, Default)]
pub struct Validator {
    opts: ValidationOpts,
}

impl Validator {
    pub fn new(opts: ValidationOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> &ValidationOpts {
        &self.opts
    }

    #[tracing::instrument(skip_all, fields(scenes = lesson.scenes().len()))]
    pub fn run(&self, lesson: &Lesson) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if lesson.scenes().is_empty() {
            issues.push(ValidationIssue::new(
                Severity::Info,
                None,
                IssueField::Lesson,
                "Lesson has no scenes yet",
            ));
        }

        for scene in lesson.scenes() {
            if let Err(v) = validate_transition(lesson, scene) {
                issues.push(ValidationIssue::error(
                    scene.id,
                    IssueField::Transition,
                    v.to_string(),
                ));
            }
            self.check_scene(lesson, scene, &mut issues);
        }

        let graph = SceneGraph::build(lesson);
        for id in graph.reachability_check() {
            issues.push(ValidationIssue::warning(
                id,
                IssueField::Reachability,
                "Scene is unreachable from the first scene",
            ));
        }

        issues.extend(LocalizationMatrix::build(lesson, &self.opts).issues());

        sort_issues(&mut issues, lesson);
        tracing::debug!(issues = issues.len(), "validation finished");
        issues
    }

    fn check_scene(&self, lesson: &Lesson, scene: &Scene, issues: &mut Vec<ValidationIssue>) {
        let primary = lesson.primary_language();
        let needs_text = matches!(scene.kind(), SceneKind::Dialogue | SceneKind::Question);
        if needs_text && scene.text(primary).is_none() {
            let what = if scene.kind() == SceneKind::Question {
                "question"
            } else {
                "dialogue"
            };
            issues.push(
                ValidationIssue::error(
                    scene.id,
                    IssueField::Dialogue,
                    format!("Missing {what} text"),
                )
                .with_language(primary.clone()),
            );
        }

        if let Some(q) = scene.question() {
            match q.correct_count() {
                1 => {}
                0 => issues.push(ValidationIssue::error(
                    scene.id,
                    IssueField::Options,
                    "Question has no correct answer",
                )),
                n => issues.push(ValidationIssue::error(
                    scene.id,
                    IssueField::Options,
                    format!("Question has {n} correct answers; exactly one is required"),
                )),
            }
            if q.options.len() < self.opts.min_answer_options {
                issues.push(ValidationIssue::warning(
                    scene.id,
                    IssueField::Options,
                    format!(
                        "Question offers {} option(s); at least {} recommended",
                        q.options.len(),
                        self.opts.min_answer_options
                    ),
                ));
            }
            if let Some(idx) = q.options.iter().position(|o| o.label.trim().is_empty()) {
                issues.push(ValidationIssue::warning(
                    scene.id,
                    IssueField::Options,
                    format!("Answer option {} has an empty label", idx + 1),
                ));
            }
        }

        for obj in scene.objects() {
            let missing: Vec<&str> = [
                ("entrance", obj.entrance.is_none()),
                ("exit", obj.exit.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, missing)| missing.then_some(name))
            .collect();
            if !missing.is_empty() {
                issues.push(
                    ValidationIssue::warning(
                        scene.id,
                        IssueField::Animation,
                        format!("No {} animation for {}", missing.join(" or "), obj.asset),
                    )
                    .with_object(obj.id),
                );
            }
        }

        if scene.kind() == SceneKind::Pause
            && scene.objects().is_empty()
            && self.opts.suggest_pause_objects
        {
            issues.push(ValidationIssue::info(
                scene.id,
                IssueField::Objects,
                "Consider adding objects to pause scene",
            ));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/validate/engine.rs"]
mod tests;
