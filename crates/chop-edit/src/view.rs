//! Zoom/scroll view window and screen↔time mapping
//!
//! The view window is an explicit value passed to the controller (no
//! global zoom state): the editor strip's screen bounds, the length of
//! the audio range it covers, a magnification factor, and how far the
//! window is scrolled into the source. `time_at_x` and `x_at_time` are
//! exact inverses of each other.

use chop_core::types::{Beats, Seconds};

/// Horizontal screen extent of the timeline strip, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub left: f64,
    pub width: f64,
}

impl ViewBounds {
    /// Create screen bounds; width is clamped to at least one pixel
    pub fn new(left: f64, width: f64) -> Self {
        Self {
            left,
            width: width.max(1.0),
        }
    }
}

/// Visible window onto the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewWindow {
    bounds: ViewBounds,
    source_length: Seconds,
    zoom: f64,
    scroll: f64,
    grid_size: Beats,
}

impl ViewWindow {
    /// Create a view window
    ///
    /// `zoom` is clamped to >= 1, `scroll` to `[0, 1 - 1/zoom]` (the
    /// fraction of the source scrolled past), and `source_length` to a
    /// small positive value so the mapping stays finite.
    pub fn new(
        bounds: ViewBounds,
        source_length: Seconds,
        zoom: f64,
        scroll: f64,
        grid_size: Beats,
    ) -> Self {
        let zoom = zoom.max(1.0);
        Self {
            bounds,
            source_length: source_length.max(f64::EPSILON),
            zoom,
            scroll: scroll.clamp(0.0, 1.0 - 1.0 / zoom),
            grid_size,
        }
    }

    /// Magnification factor (>= 1)
    #[inline]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Scroll position as a fraction of the source length
    #[inline]
    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    /// Grid spacing in beats
    #[inline]
    pub fn grid_size(&self) -> Beats {
        self.grid_size
    }

    /// Set the grid spacing in beats
    pub fn set_grid_size(&mut self, grid_size: Beats) {
        self.grid_size = grid_size;
    }

    /// Change zoom, re-clamping scroll so the window stays in range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.max(1.0);
        self.scroll = self.scroll.clamp(0.0, 1.0 - 1.0 / self.zoom);
    }

    /// Change scroll position (clamped to the valid range)
    pub fn set_scroll(&mut self, scroll: f64) {
        self.scroll = scroll.clamp(0.0, 1.0 - 1.0 / self.zoom);
    }

    /// Timeline time under a screen x coordinate
    pub fn time_at_x(&self, x: f64) -> Seconds {
        let visible = self.source_length / self.zoom;
        (x - self.bounds.left) / self.bounds.width * visible + self.source_length * self.scroll
    }

    /// Screen x coordinate of a timeline time
    pub fn x_at_time(&self, time: Seconds) -> f64 {
        let visible = self.source_length / self.zoom;
        self.bounds.left + self.bounds.width * (time - self.source_length * self.scroll) / visible
    }

    /// Time range currently on screen
    pub fn visible_range(&self) -> (Seconds, Seconds) {
        let start = self.source_length * self.scroll;
        (start, start + self.source_length / self.zoom)
    }
}
