//! Page cursor and fetch bookkeeping for the feed.
//!
//! The cursor starts at 1 and moves forward by one after every successful
//! fetch. At most one request is in flight; triggers that arrive while a
//! page is loading are dropped.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// First page, replaces the feed.
    Initial,
    /// Later page, merged into the feed.
    More,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub kind: PageKind,
}

/// Where the list is scrolled, in the shell's layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScrollMetrics {
    pub offset: f64,
    pub visible_length: f64,
    pub content_length: f64,
}

impl ScrollMetrics {
    #[must_use]
    pub fn distance_from_end(self) -> f64 {
        (self.content_length - self.offset - self.visible_length).max(0.0)
    }

    /// True when less than `threshold` visible lengths of content remain.
    #[must_use]
    pub fn is_near_end(self, threshold: f64) -> bool {
        if !self.visible_length.is_finite() || self.visible_length <= 0.0 {
            return false;
        }
        self.distance_from_end() < threshold * self.visible_length
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    next_page: u32,
    in_flight: Option<PageRequest>,
    initial_loaded: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new()
    }
}

impl Pagination {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_page: 1,
            in_flight: None,
            initial_loaded: false,
        }
    }

    #[must_use]
    pub const fn next_page(&self) -> u32 {
        self.next_page
    }

    #[must_use]
    pub const fn in_flight(&self) -> Option<PageRequest> {
        self.in_flight
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub const fn initial_loaded(&self) -> bool {
        self.initial_loaded
    }

    /// Reserves the next request, or `None` if one is already running or a
    /// fetch-more arrives before the first page landed.
    pub fn begin(&mut self, kind: PageKind) -> Option<PageRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        match kind {
            PageKind::Initial if self.initial_loaded => return None,
            PageKind::More if !self.initial_loaded => return None,
            _ => {}
        }
        let request = PageRequest {
            page: self.next_page,
            kind,
        };
        self.in_flight = Some(request);
        Some(request)
    }

    /// Records a successful fetch of `request` and advances the cursor.
    pub fn complete(&mut self, request: PageRequest) {
        if self.in_flight == Some(request) {
            self.in_flight = None;
        }
        self.next_page = request.page.saturating_add(1);
        if request.kind == PageKind::Initial {
            self.initial_loaded = true;
        }
    }

    /// Releases the in-flight slot without moving the cursor.
    pub fn fail(&mut self, request: PageRequest) {
        if self.in_flight == Some(request) {
            self.in_flight = None;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
