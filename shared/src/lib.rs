// lib.rs - Shared core of the public gist feed

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod config;
pub mod event;
pub mod feed;
pub mod model;
pub mod pagination;
pub mod preview;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect, FetchError};
pub use config::{ConfigError, DedupStrategy, FadeTiming, FeedConfig};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use feed::{get_filename, GistId, GistRecord};
pub use model::Model;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: u32 = 30;
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_FADE_MS: u64 = 1000;
pub const DEFAULT_HOLD_MS: u64 = 0;
pub const DEFAULT_END_REACHED_THRESHOLD: f64 = 0.5;
pub const FEED_HEADER: &str = "Gists";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    RateLimited,
    NotFound,
    Server,
    InvalidResponse,
    InvalidConfig,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::NotFound => "NOT_FOUND",
            Self::Server => "SERVER_ERROR",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::RateLimited | Self::Server | Self::InvalidResponse => {
                ErrorSeverity::Transient
            }
            Self::NotFound | Self::InvalidConfig | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self.default_severity(), ErrorSeverity::Transient)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && matches!(self.severity, ErrorSeverity::Transient)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::RateLimited => {
                "GitHub is limiting requests right now. Please wait a moment and try again.".into()
            }
            ErrorKind::NotFound => "No more gists could be found.".into(),
            ErrorKind::Server => "GitHub is having trouble right now. Please try again.".into(),
            ErrorKind::InvalidResponse => {
                "Received an unexpected response. Please try again.".into()
            }
            ErrorKind::InvalidConfig => self.message.clone(),
            ErrorKind::Unknown => "An unexpected error occurred. Please try again.".into(),
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16) -> Self {
        let kind = match status {
            403 | 429 => ErrorKind::RateLimited,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Network,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        };

        Self::new(kind, format!("HTTP error: {status}"))
            .with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<&FetchError> for AppError {
    fn from(e: &FetchError) -> Self {
        match e {
            FetchError::Network(msg) => {
                AppError::new(ErrorKind::Network, "Network error").with_internal(msg)
            }
            FetchError::Status { status } => AppError::from_http_status(*status),
            FetchError::EmptyBody => {
                AppError::new(ErrorKind::InvalidResponse, "Response had no body")
            }
            FetchError::InvalidBody(reason) => {
                AppError::new(ErrorKind::InvalidResponse, "Response was not a gist list")
                    .with_internal(reason)
            }
            FetchError::InvalidUrl { .. } => {
                AppError::new(ErrorKind::InvalidConfig, "The gist API address is invalid.")
                    .with_internal(e.to_string())
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::InvalidConfig, e.to_string())
    }
}

// --- View model ---

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GistRow {
    pub id: String,
    pub avatar_url: Option<String>,
    pub filename: String,
}

impl From<&GistRecord> for GistRow {
    fn from(record: &GistRecord) -> Self {
        Self {
            id: record.id.to_string(),
            avatar_url: record.avatar_url().map(str::to_owned),
            filename: record.filename().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PreviewView {
    pub phase: preview::PreviewPhase,
    pub uri: Option<String>,
    pub visible: bool,
    /// Opacity the shell should animate towards.
    pub opacity: f64,
    pub transition_ms: u64,
    pub frame: preview::OverlayFrame,
}

impl PreviewView {
    fn build(state: &preview::Preview, viewport: preview::Viewport, timing: FadeTiming) -> Self {
        let phase = state.phase();
        let transition_ms = match phase {
            preview::PreviewPhase::FadingIn | preview::PreviewPhase::FadingOut => timing.fade_ms,
            preview::PreviewPhase::Hidden | preview::PreviewPhase::Visible => 0,
        };
        Self {
            phase,
            uri: state.uri().map(str::to_owned),
            visible: phase.is_in_flight(),
            opacity: phase.target_opacity(),
            transition_ms,
            frame: state.frame(viewport),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub header: String,
    pub rows: Vec<GistRow>,
    pub show_spinner: bool,
    pub is_loading_more: bool,
    pub error: Option<UserFacingError>,
    pub preview: PreviewView,
}

pub mod app {
    use tracing::{debug, info, warn};

    use super::*;
    use crate::capabilities::{gists_url, page_result, GITHUB_ACCEPT};
    use crate::feed::RawGist;
    use crate::pagination::{PageKind, PageRequest, ScrollMetrics};
    use crate::preview::{PreviewStep, Viewport};

    #[derive(Default)]
    pub struct App;

    impl App {
        /// Starts a page fetch if the pagination allows one. Returns whether
        /// the model changed.
        fn request_page(model: &mut Model, kind: PageKind, caps: &Capabilities) -> bool {
            if !model.mounted {
                debug!(?kind, "fetch skipped, feed not mounted");
                return false;
            }

            let Some(request) = model.pagination.begin(kind) else {
                debug!(?kind, "fetch skipped, request already in flight");
                return false;
            };

            let url = match gists_url(
                &model.config.api_base_url,
                request.page,
                model.config.per_page,
            ) {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "cannot build gist url");
                    Self::record_failure(model, request, &e);
                    return true;
                }
            };

            info!(page = request.page, ?kind, "fetching gists");

            let generation = model.generation;
            let mut builder = caps.http.get(url.as_str());
            if kind == PageKind::Initial {
                builder = builder.header("Accept", GITHUB_ACCEPT);
            }
            builder
                .expect_json::<Vec<RawGist>>()
                .send(move |result| Event::PageLoaded {
                    generation,
                    request,
                    result: page_result(result),
                });

            true
        }

        fn record_failure(model: &mut Model, request: PageRequest, error: &FetchError) {
            model.pagination.fail(request);
            model.failed_request = Some(request);
            model.set_error(AppError::from(error));
        }

        fn handle_page(
            model: &mut Model,
            request: PageRequest,
            result: Result<Vec<GistRecord>, FetchError>,
        ) {
            match result {
                Ok(records) => {
                    model.pagination.complete(request);
                    model.clear_error();

                    match request.kind {
                        PageKind::Initial => {
                            let count = records.len();
                            model.feed.replace(records);
                            info!(count, "initial page loaded");
                        }
                        PageKind::More => {
                            let outcome = model.feed.merge_page(records);
                            info!(
                                page = request.page,
                                appended = outcome.appended,
                                skipped = outcome.skipped,
                                total = model.feed.len(),
                                "page merged"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(page = request.page, error = %e, "gist fetch failed");
                    Self::record_failure(model, request, &e);
                }
            }
        }

        fn schedule_preview(model: &Model, step: PreviewStep, caps: &Capabilities) {
            match step {
                PreviewStep::Schedule { cycle, millis } => {
                    caps.delay.milliseconds(
                        millis,
                        Event::PreviewStageElapsed {
                            generation: model.generation,
                            cycle,
                        },
                    );
                }
                PreviewStep::Finished => debug!("preview cycle finished"),
                PreviewStep::Ignored => debug!("preview busy, tap ignored"),
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            if event.is_user_initiated() {
                debug!(event = event.name(), "user action");
            }

            match event {
                Event::Noop => {}

                Event::Configure { config } => {
                    if model.mounted {
                        warn!("configuration change ignored while mounted");
                        return;
                    }
                    match model.configure(config) {
                        Ok(()) => {
                            model.clear_error();
                            info!(
                                per_page = model.config.per_page,
                                dedup = ?model.config.dedup,
                                "feed configured"
                            );
                        }
                        Err(e) => {
                            warn!(error = %e, "rejected feed configuration");
                            model.set_error(AppError::from(e));
                        }
                    }
                    caps.render.render();
                }

                Event::Mounted => {
                    if model.mounted {
                        debug!("feed already mounted");
                        return;
                    }
                    model.mounted = true;
                    Self::request_page(model, PageKind::Initial, caps);
                    caps.render.render();
                }

                Event::Unmounted => {
                    model.tear_down();
                    info!(generation = model.generation, "feed unmounted");
                }

                Event::ViewportChanged { width, height } => {
                    model.viewport = Viewport { width, height };
                    caps.render.render();
                }

                Event::Scrolled {
                    offset,
                    visible_length,
                    content_length,
                } => {
                    let metrics = ScrollMetrics {
                        offset,
                        visible_length,
                        content_length,
                    };
                    if metrics.is_near_end(model.config.end_reached_threshold) {
                        self.update(Event::EndReached, model, caps);
                    }
                }

                Event::EndReached => {
                    if Self::request_page(model, PageKind::More, caps) {
                        caps.render.render();
                    }
                }

                Event::RetryRequested => {
                    let Some(failed) = model.failed_request else {
                        debug!("nothing to retry");
                        return;
                    };
                    model.clear_error();
                    Self::request_page(model, failed.kind, caps);
                    caps.render.render();
                }

                Event::RowTapped { id } => {
                    let Some(uri) = model
                        .feed
                        .get(&id)
                        .and_then(GistRecord::avatar_url)
                        .map(str::to_owned)
                    else {
                        debug!(%id, "tapped row has no avatar");
                        return;
                    };
                    let step = model.preview.tap(uri, model.config.fade);
                    if step != PreviewStep::Ignored {
                        caps.render.render();
                    }
                    Self::schedule_preview(model, step, caps);
                }

                Event::PreviewImageLaidOut { width, height } => {
                    model.preview.image_laid_out(width, height);
                    caps.render.render();
                }

                Event::PageLoaded {
                    generation,
                    request,
                    result,
                } => {
                    if generation != model.generation {
                        debug!(page = request.page, "dropping page from previous mount");
                        return;
                    }
                    Self::handle_page(model, request, result);
                    caps.render.render();
                }

                Event::PreviewStageElapsed { generation, cycle } => {
                    if generation != model.generation {
                        debug!(cycle, "dropping timer from previous mount");
                        return;
                    }
                    let step = model.preview.stage_elapsed(cycle, model.config.fade);
                    if step == PreviewStep::Ignored {
                        debug!(cycle, "stale preview timer");
                        return;
                    }
                    Self::schedule_preview(model, step, caps);
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let error = model.active_error.as_ref().map(UserFacingError::from);

            ViewModel {
                header: FEED_HEADER.to_string(),
                rows: model.feed.records().iter().map(GistRow::from).collect(),
                show_spinner: model.feed.is_empty() && error.is_none(),
                is_loading_more: model
                    .pagination
                    .in_flight()
                    .is_some_and(|r| r.kind == PageKind::More),
                error,
                preview: PreviewView::build(&model.preview, model.viewport, model.config.fade),
            }
        }
    }
}
