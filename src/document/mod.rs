pub mod builder;
pub mod edit;
pub mod history;
pub mod model;
pub mod persist;
pub mod store;
