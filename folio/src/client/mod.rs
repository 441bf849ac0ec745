// Client data-access layer: every JSON request the site makes to the edge
// goes through here.

mod error;
mod fetch;

pub use error::ClientError;
pub use fetch::{DataClient, API_CACHE_PREFIX};
