//! Data loaders behind each section of the page. Every loader fans out one
//! request per repository and tolerates any subset of them failing.

pub mod cards;
pub mod stats;
pub mod timeline;

use crate::client::ClientError;
use crate::render::{Container, render_error};

/// Fill `container` from a loader result, or show the error panel wired to `retry`.
pub fn show_result<T, R, F>(
    container: &mut Container,
    result: Result<T, ClientError>,
    render: R,
    retry: F,
) where
    R: FnOnce(T) -> String,
    F: FnMut() + Send + 'static,
{
    match result {
        Ok(data) => container.set_html(render(data)),
        Err(e) => {
            tracing::warn!("Section failed to load: {}", e);
            render_error(container, &e.to_string(), retry);
        }
    }
}
