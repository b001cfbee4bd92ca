pub mod dto;
pub mod handlers;
mod response;
mod routes;
mod state;

pub use response::ApiResponse;
pub use routes::create_router;
pub use state::AppState;
