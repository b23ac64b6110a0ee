mod handlers;
pub mod openapi;
pub mod response;
mod routes;
mod state;

pub use handlers::health::{HealthData, LIVENESS_MESSAGE};
pub use routes::{create_extraction_router, create_relay_router};
pub use state::{ExtractionState, RelayState, ServiceInfo};
