use std::collections::HashMap;

use callflame_protocol::{CallRecord, RenderCommand, Trace, Viewport};
use thiserror::Error;

use super::call_index::{CallIndex, IndexError};
use super::highlight::HighlightSet;
use crate::filter::CallFilter;
use crate::layout::{Geometry, LayoutError, TimeLayout};
use crate::views::flame_chart::render_flame_chart;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// One loaded trace and the view state around it.
///
/// Tree queries go through the [`CallIndex`], geometry through the
/// [`TimeLayout`]. Hover, zoom and filter interactions mutate only view
/// state; the index is fixed once the trace is loaded. Every failing
/// operation leaves the session exactly as it was.
#[derive(Debug, Clone)]
pub struct ChartSession {
    start_time: Option<String>,
    index: CallIndex,
    layout: TimeLayout,
    highlights: HighlightSet,
    filter: CallFilter,
    geometry: HashMap<u64, Geometry>,
    /// Layout version `geometry` was computed at.
    geometry_version: u64,
}

impl ChartSession {
    pub fn from_trace(trace: Trace, viewport_width: f64) -> Result<Self, SessionError> {
        let layout = TimeLayout::new(trace.total_seconds, viewport_width)?;
        let index = CallIndex::new(trace.calls);
        let geometry = layout.compute_geometry(index.calls());
        let geometry_version = layout.version();
        Ok(Self {
            start_time: trace.start_time,
            index,
            layout,
            highlights: HighlightSet::new(),
            filter: CallFilter::new(),
            geometry,
            geometry_version,
        })
    }

    pub fn index(&self) -> &CallIndex {
        &self.index
    }

    pub fn layout(&self) -> &TimeLayout {
        &self.layout
    }

    pub fn highlights(&self) -> &HighlightSet {
        &self.highlights
    }

    pub fn filter(&self) -> &CallFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut CallFilter {
        &mut self.filter
    }

    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    /// Highlight the call under the pointer and its callers.
    ///
    /// Returns the call stack root first, ending with `id`.
    pub fn hover(&mut self, id: u64) -> Result<Vec<&CallRecord>, SessionError> {
        Ok(self.highlights.highlight_chain(&self.index, id)?)
    }

    pub fn clear_hover(&mut self) {
        self.highlights.clear();
    }

    /// Zoom the window onto a call. Clicks in the chart and selections from
    /// the call list both land here.
    pub fn zoom_to_call(&mut self, id: u64) -> Result<(), SessionError> {
        let call = self.index.get_call(id)?;
        self.layout.zoom_to_call(call)?;
        Ok(())
    }

    pub fn reset_zoom(&mut self) {
        self.layout.reset();
    }

    pub fn resize(&mut self, viewport_width: f64) -> Result<(), SessionError> {
        self.layout.resize_viewport(viewport_width)?;
        Ok(())
    }

    /// Geometry for every call at the current window and width, recomputed
    /// only when the layout changed since the last read.
    pub fn geometry(&mut self) -> &HashMap<u64, Geometry> {
        if self.geometry_version != self.layout.version() {
            self.geometry = self.layout.compute_geometry(self.index.calls());
            self.geometry_version = self.layout.version();
        }
        &self.geometry
    }

    /// Calls passing the name/file filter, in trace order.
    pub fn filtered_calls(&self) -> Vec<&CallRecord> {
        self.filter.apply(self.index.calls())
    }

    /// Id of the call drawn at `(x, y)`.
    pub fn call_at(&self, x: f64, y: f64) -> Option<u64> {
        self.layout.call_at(self.index.calls(), x, y)
    }

    pub fn render(&mut self, viewport: &Viewport) -> Vec<RenderCommand> {
        self.geometry();
        render_flame_chart(
            self.index.calls(),
            &self.geometry,
            &self.highlights,
            viewport,
        )
    }
}
