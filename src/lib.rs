pub mod config;
pub mod difficulty;
pub mod logging;
pub mod store;

pub use config::EngineConfig;
pub use difficulty::engine::{DifficultyEngine, EngineError, EngineResult};
pub use difficulty::types::*;
pub use store::{MemoryProfileStore, ProfileStore, StoreError, StoreResult};
pub use store::sqlite::SqliteProfileStore;
