use crate::config::{ConfigError, FeedConfig};
use crate::feed::Feed;
use crate::pagination::{PageRequest, Pagination};
use crate::preview::{Preview, Viewport};
use crate::AppError;

/// All state of the feed screen, owned by the core and changed only in
/// `App::update`.
#[derive(Debug)]
pub struct Model {
    pub config: FeedConfig,
    pub feed: Feed,
    pub pagination: Pagination,
    pub preview: Preview,
    pub viewport: Viewport,
    pub mounted: bool,
    /// Bumped on unmount; callbacks issued under an older generation are
    /// dropped.
    pub generation: u64,
    pub active_error: Option<AppError>,
    pub failed_request: Option<PageRequest>,
}

impl Default for Model {
    fn default() -> Self {
        Self::from_valid_config(FeedConfig::default())
    }
}

impl Model {
    /// Swaps in a new configuration. The feed is rebuilt so the dedup
    /// strategy takes effect; an invalid config leaves the model untouched.
    pub fn configure(&mut self, config: FeedConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.feed = Feed::new(config.dedup);
        self.config = config;
        Ok(())
    }

    fn from_valid_config(config: FeedConfig) -> Self {
        Self {
            feed: Feed::new(config.dedup),
            config,
            pagination: Pagination::new(),
            preview: Preview::new(),
            viewport: Viewport::default(),
            mounted: false,
            generation: 0,
            active_error: None,
            failed_request: None,
        }
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
        self.failed_request = None;
    }

    /// Releases everything tied to the mounted screen.
    pub fn tear_down(&mut self) {
        self.mounted = false;
        self.generation = self.generation.wrapping_add(1);
        self.feed.clear();
        self.pagination.reset();
        self.preview.cancel();
        self.clear_error();
    }
}
