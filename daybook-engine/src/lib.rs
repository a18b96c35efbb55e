mod config;
mod edit_buffer;
mod engine;
mod error;
mod gateway;
mod history;
mod model;
mod registry;
mod scheduler;
pub mod snapshot;

pub use config::*;
pub use edit_buffer::*;
pub use engine::*;
pub use error::*;
pub use gateway::*;
pub use history::*;
pub use model::*;
pub use registry::*;
pub use scheduler::*;
pub use snapshot::EngineSnapshot;
