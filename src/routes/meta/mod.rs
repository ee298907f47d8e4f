mod handler;
mod model;

pub use handler::{health, version};
pub use model::{HealthResponse, VersionResponse};
