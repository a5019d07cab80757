pub mod scene_graph;
pub mod transitions;
