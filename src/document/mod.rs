//! Document model and navigable nodes.

pub mod node;
pub mod value;
