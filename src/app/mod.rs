pub mod launcher;
pub mod model;
pub mod queue;
pub mod registry;
