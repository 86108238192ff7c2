//! Call-trace flame chart engine.
//!
//! [`model::CallIndex`] answers tree queries over a flat call list,
//! [`layout::TimeLayout`] maps call intervals onto pixels for the current
//! zoom window, and [`model::ChartSession`] composes both with hover, filter
//! and rendering state for a front end.

pub mod filter;
pub mod format;
pub mod layout;
pub mod model;
pub mod parsers;
pub mod svg;
pub mod views;
