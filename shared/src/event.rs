use serde::{Deserialize, Serialize};

use crate::capabilities::FetchError;
use crate::config::FeedConfig;
use crate::feed::{GistId, GistRecord};
use crate::pagination::PageRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Event {
    #[default]
    Noop,

    // --- Lifecycle ---
    /// Only honoured while the feed is unmounted.
    Configure {
        config: FeedConfig,
    },
    Mounted,
    Unmounted,
    ViewportChanged {
        width: f64,
        height: f64,
    },

    // --- List ---
    Scrolled {
        offset: f64,
        visible_length: f64,
        content_length: f64,
    },
    EndReached,
    RetryRequested,

    // --- Preview ---
    RowTapped {
        id: GistId,
    },
    PreviewImageLaidOut {
        width: f64,
        height: f64,
    },

    // --- Capability callbacks ---
    PageLoaded {
        generation: u64,
        request: PageRequest,
        result: Result<Vec<GistRecord>, FetchError>,
    },
    PreviewStageElapsed {
        generation: u64,
        cycle: u64,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure { .. } => "configure",
            Self::Mounted => "mounted",
            Self::Unmounted => "unmounted",
            Self::ViewportChanged { .. } => "viewport_changed",
            Self::Scrolled { .. } => "scrolled",
            Self::EndReached => "end_reached",
            Self::RetryRequested => "retry_requested",
            Self::RowTapped { .. } => "row_tapped",
            Self::PreviewImageLaidOut { .. } => "preview_image_laid_out",
            Self::PageLoaded { .. } => "page_loaded",
            Self::PreviewStageElapsed { .. } => "preview_stage_elapsed",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::Scrolled { .. }
                | Self::EndReached
                | Self::RetryRequested
                | Self::RowTapped { .. }
        )
    }
}
