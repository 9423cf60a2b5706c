//! Shared handler state. The configuration is the only thing requests share,
//! and it is immutable after startup.

use std::sync::Arc;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}
