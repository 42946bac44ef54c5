pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::*;
pub use router::{scheduling_router, scheduling_routes, SchedulingState};
