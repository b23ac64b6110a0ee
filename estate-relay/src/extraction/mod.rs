//! Document extraction through the assistant platform.

mod orchestrator;
pub mod prompt;
mod types;

pub use orchestrator::{ExtractionOrchestrator, Step};
pub use types::{CreatedResources, Upload};
