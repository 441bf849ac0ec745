pub mod animate;
pub mod client;
pub mod domain;
pub mod features;
pub mod format;
pub mod github;
pub mod ports;
pub mod render;

// Re-export key types
pub use client::{ClientError, DataClient};
pub use domain::{CacheEntry, CachedResponse, FetchResult, ResponseHandle};
pub use ports::{CacheStore, SessionStorage};
