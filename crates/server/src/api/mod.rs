pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod status;
pub mod upload;

pub use routes::create_router;
