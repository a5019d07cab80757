use crate::document::model::{FailurePolicy, Lesson, SuccessTarget};
use crate::foundation::ids::SceneId;
use std::collections::{BTreeSet, HashMap, VecDeque};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Scene `i` to scene `i + 1`.
    Default,
    Success,
    Failure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Edge {
    pub from: SceneId,
    pub to: SceneId,
    pub kind: EdgeKind,
}

/// Directed view of a lesson's scene sequence plus question branch edges.
///
/// Non-question scenes get a default edge to the following scene. A question's outgoing edges are
/// exactly its success edge (to the following scene for `next`) and its failure edge (a self loop
/// for `retry`/`hint`). Edges hold identities, so reordering never retargets them.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    order: Vec<SceneId>,
    edges: Vec<Edge>,
    out: HashMap<SceneId, Vec<usize>>,
}

impl SceneGraph {
    #[tracing::instrument(skip(lesson), fields(scenes = lesson.scenes().len()))]
    pub fn build(lesson: &Lesson) -> Self {
        let scenes = lesson.scenes();
        let order: Vec<SceneId> = scenes.iter().map(|s| s.id).collect();
        let mut edges = Vec::new();

        for (i, scene) in scenes.iter().enumerate() {
            let following = order.get(i + 1).copied();
            match scene.question() {
                None => {
                    if let Some(to) = following {
                        edges.push(Edge {
                            from: scene.id,
                            to,
                            kind: EdgeKind::Default,
                        });
                    }
                }
                Some(q) => {
                    let success = match q.on_success {
                        SuccessTarget::Next => following,
                        SuccessTarget::Scene { scene } => Some(scene),
                    };
                    if let Some(to) = success {
                        edges.push(Edge {
                            from: scene.id,
                            to,
                            kind: EdgeKind::Success,
                        });
                    }
                    let failure = match q.on_failure {
                        FailurePolicy::Retry | FailurePolicy::Hint { .. } => scene.id,
                        FailurePolicy::AlternateScene { scene } => scene,
                    };
                    edges.push(Edge {
                        from: scene.id,
                        to: failure,
                        kind: EdgeKind::Failure,
                    });
                }
            }
        }

        let mut out: HashMap<SceneId, Vec<usize>> = HashMap::new();
        for (idx, e) in edges.iter().enumerate() {
            out.entry(e.from).or_default().push(idx);
        }

        Self { order, edges, out }
    }

    /// First scene of the sequence.
    pub fn entry(&self) -> Option<SceneId> {
        self.order.first().copied()
    }

    pub fn order(&self) -> &[SceneId] {
        &self.order
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn outgoing(&self, id: SceneId) -> impl Iterator<Item = &Edge> + '_ {
        self.out
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.edges[idx])
    }

    pub fn successors(&self, id: SceneId) -> impl Iterator<Item = SceneId> + '_ {
        self.outgoing(id).map(|e| e.to)
    }

    pub fn predecessors(&self, id: SceneId) -> Vec<SceneId> {
        let mut preds: Vec<SceneId> = self
            .edges
            .iter()
            .filter(|e| e.to == id && e.from != id)
            .map(|e| e.from)
            .collect();
        preds.dedup();
        preds
    }

    /// Scenes reachable from the entry scene (entry included).
    pub fn reachable(&self) -> BTreeSet<SceneId> {
        let mut seen = BTreeSet::new();
        let Some(entry) = self.entry() else {
            return seen;
        };
        let mut queue = VecDeque::from([entry]);
        seen.insert(entry);
        while let Some(id) = queue.pop_front() {
            for next in self.successors(id) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Scenes not reachable from the entry scene, in sequence order.
    pub fn reachability_check(&self) -> Vec<SceneId> {
        let reachable = self.reachable();
        self.order
            .iter()
            .copied()
            .filter(|id| !reachable.contains(id))
            .collect()
    }

    /// Scenes where the lesson can end: no outgoing edge to a different scene.
    pub fn terminals(&self) -> Vec<SceneId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.successors(id).all(|to| to == id))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/scene_graph.rs"]
mod tests;
