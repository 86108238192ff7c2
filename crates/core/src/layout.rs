//! Time-to-pixel layout for the flame chart.
//!
//! X-axis = elapsed seconds mapped linearly onto `[0, viewport_width]`
//! through the active [`TimeWindow`]; Y-axis = call depth in fixed rows.

use std::collections::HashMap;

use callflame_protocol::{CallRecord, Point, Rect};
use thiserror::Error;

/// Height of one depth row in pixels.
pub const ROW_HEIGHT: f64 = 40.0;

/// Output width used when the caller has no container size yet.
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LayoutError {
    #[error("time window [{start}, {end}] has no positive duration")]
    DegenerateWindow { start: f64, end: f64 },
    #[error("invalid viewport width {0}")]
    InvalidViewport(f64),
}

/// The interval of the trace currently mapped onto the viewport, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Result<Self, LayoutError> {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return Err(LayoutError::DegenerateWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Pixel rectangle of one call for the current window and viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub x: f64,
    pub width: f64,
    pub y: f64,
}

impl Geometry {
    /// The full row-height rectangle this geometry occupies.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, ROW_HEIGHT)
    }
}

/// Linear map from seconds to pixels. Rebuilt whenever either end changes.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TimeScale {
    domain_start: f64,
    domain_span: f64,
    range_width: f64,
}

impl TimeScale {
    fn new(window: TimeWindow, range_width: f64) -> Self {
        Self {
            domain_start: window.start,
            domain_span: window.duration(),
            range_width,
        }
    }

    fn apply(&self, t: f64) -> f64 {
        // A zero-span trace collapses every call onto x = 0.
        if self.domain_span <= 0.0 {
            return 0.0;
        }
        ((t - self.domain_start) / self.domain_span) * self.range_width
    }

    fn invert(&self, x: f64) -> f64 {
        if self.range_width <= 0.0 || self.domain_span <= 0.0 {
            return self.domain_start;
        }
        self.domain_start + (x / self.range_width) * self.domain_span
    }
}

/// Zoomable mapping from call intervals to screen rectangles.
///
/// Every successful mutation bumps [`TimeLayout::version`]; renderers poll
/// it to know when previously computed geometry is stale.
#[derive(Debug, Clone)]
pub struct TimeLayout {
    full: TimeWindow,
    window: TimeWindow,
    viewport_width: f64,
    scale: TimeScale,
    version: u64,
}

impl TimeLayout {
    /// Layout over `[0, total_seconds]`.
    ///
    /// A zero `total_seconds` is accepted: every call then has zero width
    /// at `x = 0` until a real span is available. Only a negative or
    /// non-finite total is rejected.
    pub fn new(total_seconds: f64, viewport_width: f64) -> Result<Self, LayoutError> {
        if !total_seconds.is_finite() || total_seconds < 0.0 {
            return Err(LayoutError::DegenerateWindow {
                start: 0.0,
                end: total_seconds,
            });
        }
        check_width(viewport_width)?;
        let full = TimeWindow {
            start: 0.0,
            end: total_seconds,
        };
        Ok(Self {
            full,
            window: full,
            viewport_width,
            scale: TimeScale::new(full, viewport_width),
            version: 0,
        })
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn total_seconds(&self) -> f64 {
        self.full.end
    }

    /// Whether the window differs from the full trace span.
    pub fn is_zoomed(&self) -> bool {
        self.window != self.full
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Pixel x-coordinate of a point in time.
    pub fn x_of(&self, t: f64) -> f64 {
        self.scale.apply(t)
    }

    /// Point in time under a pixel x-coordinate.
    pub fn time_at(&self, x: f64) -> f64 {
        self.scale.invert(x)
    }

    pub fn geometry_of(&self, call: &CallRecord) -> Geometry {
        let x = self.scale.apply(call.call_time);
        let raw_width = self.scale.apply(call.ret_time) - x;
        Geometry {
            x,
            width: raw_width.max(0.0),
            y: f64::from(call.depth) * ROW_HEIGHT,
        }
    }

    /// Geometry for every record, keyed by call id.
    ///
    /// Only negative widths are clamped; `x` is left as computed even when
    /// it falls outside the viewport.
    pub fn compute_geometry(&self, calls: &[CallRecord]) -> HashMap<u64, Geometry> {
        calls
            .iter()
            .map(|call| (call.id, self.geometry_of(call)))
            .collect()
    }

    /// Narrow the window to `[call_time, ret_time]`.
    pub fn zoom_to(&mut self, call_time: f64, ret_time: f64) -> Result<(), LayoutError> {
        let window = TimeWindow::new(call_time, ret_time)?;
        tracing::debug!(start = call_time, end = ret_time, "zoom");
        self.set_window(window);
        Ok(())
    }

    pub fn zoom_to_call(&mut self, call: &CallRecord) -> Result<(), LayoutError> {
        self.zoom_to(call.call_time, call.ret_time)
    }

    pub fn resize_viewport(&mut self, width: f64) -> Result<(), LayoutError> {
        check_width(width)?;
        tracing::debug!(width, "resize viewport");
        self.viewport_width = width;
        self.rebuild();
        Ok(())
    }

    /// Restore the window to the whole trace.
    pub fn reset(&mut self) {
        tracing::debug!(total_seconds = self.full.end, "reset zoom");
        self.set_window(self.full);
    }

    /// Id of the call whose rectangle contains `(x, y)`.
    ///
    /// Rows are disjoint, so at most one depth matches; within a row the
    /// first record in input order wins.
    pub fn call_at(&self, calls: &[CallRecord], x: f64, y: f64) -> Option<u64> {
        let point = Point::new(x, y);
        calls
            .iter()
            .find(|call| self.geometry_of(call).rect().contains(point))
            .map(|call| call.id)
    }

    fn set_window(&mut self, window: TimeWindow) {
        self.window = window;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.scale = TimeScale::new(self.window, self.viewport_width);
        self.version += 1;
    }
}

fn check_width(width: f64) -> Result<(), LayoutError> {
    if width.is_finite() && width >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidViewport(width))
    }
}
