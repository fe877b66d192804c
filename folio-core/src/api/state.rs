use std::sync::Arc;

use crate::{
    blog::{BlogService, PostStore},
    config::Config,
    now_playing::NowPlayingService,
    weather::WeatherService,
};

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone; nothing in it is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub weather: Arc<WeatherService>,
    pub now_playing: Arc<NowPlayingService>,
    pub blog: Arc<BlogService>,
}

impl AppState {
    /// Wire the upstream clients named in `config` to the services.
    pub fn new(config: Config, store: Arc<dyn PostStore>) -> Self {
        Self {
            weather: Arc::new(WeatherService::from_endpoints(&config.endpoints)),
            now_playing: Arc::new(NowPlayingService::from_config(&config)),
            blog: Arc::new(BlogService::new(store)),
            config: Arc::new(config),
        }
    }
}
