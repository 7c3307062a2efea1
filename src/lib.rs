pub mod app;
pub mod client;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;
pub mod jobs;

use std::sync::Arc;

use crate::app::auth::TokenService;
use crate::app::interactions::InteractionService;
use crate::infra::cache::CounterCache;
use crate::infra::store::InteractionStore;

#[derive(Clone)]
pub struct AppState {
    pub interactions: InteractionService,
    pub tokens: TokenService,
    pub trust_user_id_header: bool,
}

impl AppState {
    pub fn new(
        store: Arc<dyn InteractionStore>,
        cache: Option<Arc<dyn CounterCache>>,
        tokens: TokenService,
        trust_user_id_header: bool,
    ) -> Self {
        Self {
            interactions: InteractionService::new(store, cache),
            tokens,
            trust_user_id_header,
        }
    }
}
