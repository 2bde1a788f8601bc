pub mod decision;
pub mod engine;
pub mod insights;
pub mod locks;
pub mod metrics;
pub mod patterns;
pub mod recommendation;
pub mod session;
pub mod types;

pub use engine::DifficultyEngine;
pub use types::*;
