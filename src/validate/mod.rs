pub mod engine;
pub mod issues;
