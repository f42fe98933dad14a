use serde::{Deserialize, Serialize};

use crate::config::FadeTiming;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreviewPhase {
    #[default]
    Hidden,
    FadingIn,
    Visible,
    FadingOut,
}

impl PreviewPhase {
    #[must_use]
    pub const fn target_opacity(self) -> f64 {
        match self {
            Self::FadingIn | Self::Visible => 1.0,
            Self::Hidden | Self::FadingOut => 0.0,
        }
    }

    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

/// What the caller has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStep {
    /// Start a timer; when it fires, feed `cycle` back into
    /// [`Preview::stage_elapsed`].
    Schedule { cycle: u64, millis: u64 },
    /// The cycle ended and the overlay is hidden again.
    Finished,
    /// Input did not apply to the current phase.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct OverlayFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Tap-to-preview overlay. One fade cycle at a time; a cycle always runs to
/// completion unless the owning scope calls [`Preview::cancel`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Preview {
    phase: PreviewPhase,
    uri: Option<String>,
    width: f64,
    height: f64,
    cycle: u64,
}

impl Preview {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> PreviewPhase {
        self.phase
    }

    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        self.phase.is_in_flight()
    }

    pub fn tap(&mut self, uri: impl Into<String>, timing: FadeTiming) -> PreviewStep {
        if self.phase.is_in_flight() {
            return PreviewStep::Ignored;
        }
        self.uri = Some(uri.into());
        self.phase = PreviewPhase::FadingIn;
        self.cycle = self.cycle.wrapping_add(1);
        PreviewStep::Schedule {
            cycle: self.cycle,
            millis: timing.fade_ms,
        }
    }

    pub fn stage_elapsed(&mut self, cycle: u64, timing: FadeTiming) -> PreviewStep {
        if cycle != self.cycle {
            return PreviewStep::Ignored;
        }
        match self.phase {
            PreviewPhase::Hidden => PreviewStep::Ignored,
            PreviewPhase::FadingIn => {
                self.phase = PreviewPhase::Visible;
                PreviewStep::Schedule {
                    cycle,
                    millis: timing.hold_ms,
                }
            }
            PreviewPhase::Visible => {
                self.phase = PreviewPhase::FadingOut;
                PreviewStep::Schedule {
                    cycle,
                    millis: timing.fade_ms,
                }
            }
            PreviewPhase::FadingOut => {
                self.phase = PreviewPhase::Hidden;
                PreviewStep::Finished
            }
        }
    }

    /// Intrinsic size of the overlay image, reported by the shell on layout.
    pub fn image_laid_out(&mut self, width: f64, height: f64) {
        if width.is_finite() && height.is_finite() {
            self.width = width.max(0.0);
            self.height = height.max(0.0);
        }
    }

    /// Drops any running cycle. Timers already scheduled carry the old
    /// cycle number and are ignored when they fire.
    pub fn cancel(&mut self) {
        self.phase = PreviewPhase::Hidden;
        self.uri = None;
        self.cycle = self.cycle.wrapping_add(1);
    }

    #[must_use]
    pub fn frame(&self, viewport: Viewport) -> OverlayFrame {
        OverlayFrame {
            left: viewport.width / 2.0 - self.width / 2.0,
            top: viewport.height / 2.0 - self.height / 2.0,
            width: self.width,
            height: self.height,
        }
    }
}
