pub mod estimate;
pub mod jobs;
pub mod matrix;
