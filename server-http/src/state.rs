use crate::proxy::EdgeProxy;
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<EdgeProxy>,
}

impl AppState {
    pub fn new(proxy: Arc<EdgeProxy>) -> Self {
        Self { proxy }
    }
}
