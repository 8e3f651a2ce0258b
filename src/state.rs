use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::store::PortalStore;

/// Dependencies shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PortalStore>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(store: Arc<dyn PortalStore>, tokens: TokenIssuer) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
        }
    }
}
