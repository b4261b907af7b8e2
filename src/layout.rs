//! Geometry sampling and the stability gate that decides when the overlay
//! may be shown.

use crate::host::HostDom;
use crate::locator::HostAnchor;
use crate::settings::Settings;

const MIN_ANCHOR_WIDTH_PX: f64 = 200.0;
const MAX_ANCHOR_VIEWPORT_RATIO: f64 = 1.2;
const MIN_THREAD_WIDTH_PX: f64 = 320.0;
const MAX_CONTAINER_VIEWPORT_RATIO: f64 = 1.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySample {
    pub left: f64,
    pub width: f64,
    pub container_max_width: f64,
    pub timestamp_ms: u64,
}

impl GeometrySample {
    fn within(&self, other: &GeometrySample, tolerance: f64) -> bool {
        (self.left - other.left).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.container_max_width - other.container_max_width).abs() <= tolerance
    }
}

/// Turns the current anchor into a [`GeometrySample`].
///
/// The chat column width is sticky: once the input row has been measured at
/// a plausible width, later samples reuse it until a new plausible
/// measurement arrives.
#[derive(Debug, Clone)]
pub struct GeometrySampler {
    thread_max_width: f64,
}

impl GeometrySampler {
    pub fn new(fallback_thread_max_width: f64) -> Self {
        Self {
            thread_max_width: fallback_thread_max_width,
        }
    }

    pub fn thread_max_width(&self) -> f64 {
        self.thread_max_width
    }

    /// `None` when the scroll region is missing or has an implausible width.
    pub fn sample<H: HostDom + ?Sized>(
        &mut self,
        host: &H,
        anchor: &HostAnchor,
        now_ms: u64,
    ) -> Option<GeometrySample> {
        let region = anchor.scroll_region?;
        let rect = host.bounding_rect(region)?;
        let vw = host.viewport().width.max(1.0);
        if rect.width <= 0.0
            || rect.width < MIN_ANCHOR_WIDTH_PX
            || rect.width > vw * MAX_ANCHOR_VIEWPORT_RATIO
        {
            tracing::trace!(width = rect.width, "anchor width out of range");
            return None;
        }

        if let Some(container) = anchor.input_container.and_then(|c| host.bounding_rect(c)) {
            if container.width > MIN_THREAD_WIDTH_PX
                && container.width < vw * MAX_CONTAINER_VIEWPORT_RATIO
            {
                self.thread_max_width = container.width.round();
            }
        }

        Some(GeometrySample {
            left: rect.left.round(),
            width: rect.width.round(),
            container_max_width: self.thread_max_width.round(),
            timestamp_ms: now_ms,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Not locked yet; `streak` consecutive matches so far.
    Settling { streak: u32 },
    /// This sample locked the layout.
    Locked,
    /// Already locked earlier.
    Steady,
}

/// `Unstable -> Locked` gate. Locking is sticky.
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    required_count: u32,
    tolerance_px: f64,
    last_sample: Option<GeometrySample>,
    streak: u32,
    locked: bool,
}

impl StabilityTracker {
    pub fn new(required_count: u32, tolerance_px: f64) -> Self {
        Self {
            required_count,
            tolerance_px,
            last_sample: None,
            streak: 0,
            locked: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.stable_required_count, settings.stable_tolerance_px)
    }

    /// Feed one sample. `native_seen` tells whether the host's input control
    /// has been visible at least once; without it the page is still a shell
    /// and the tracker refuses to lock.
    pub fn observe(&mut self, sample: GeometrySample, native_seen: bool) -> Observation {
        let matched = self
            .last_sample
            .map_or(false, |prev| prev.within(&sample, self.tolerance_px));
        self.streak = if matched { self.streak.saturating_add(1) } else { 0 };
        self.last_sample = Some(sample);

        if self.locked {
            return Observation::Steady;
        }
        if self.streak >= self.required_count
            && native_seen
            && sample.container_max_width > MIN_THREAD_WIDTH_PX
        {
            self.locked = true;
            tracing::debug!(streak = self.streak, "layout locked");
            return Observation::Locked;
        }
        Observation::Settling {
            streak: self.streak,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn last_sample(&self) -> Option<GeometrySample> {
        self.last_sample
    }
}
