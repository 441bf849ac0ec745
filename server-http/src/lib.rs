pub mod cors;
pub mod handlers;
pub mod proxy;
pub mod routes;
pub mod state;
pub mod upstream;

// Re-export key types
pub use proxy::EdgeProxy;
pub use routes::build_router;
pub use state::AppState;
