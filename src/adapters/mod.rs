// Adapters layer: concrete implementations for files on disk and in memory.

pub mod cases;
pub mod model_file;

pub use model_file::{InMemoryModel, LocalModelFile};
