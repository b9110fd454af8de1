use crate::auth::TokenIssuer;
use crate::media::MediaStore;
use crate::store::DataStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn DataStore>,
    pub media: Arc<dyn MediaStore>,
    pub tokens: TokenIssuer,
}

impl ServerState {
    pub fn new(
        store: Arc<dyn DataStore>,
        media: Arc<dyn MediaStore>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            store,
            media,
            tokens,
        }
    }
}
