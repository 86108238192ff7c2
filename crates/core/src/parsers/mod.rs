pub mod event_log;
pub mod flame_json;

use callflame_protocol::Trace;
use thiserror::Error;

pub use event_log::{DEFAULT_MAX_DEPTH, parse_event_log};
pub use flame_json::parse_flame_json;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("flame json: {0}")]
    FlameJson(#[from] flame_json::FlameJsonError),
    #[error("event log: {0}")]
    EventLog(#[from] event_log::EventLogError),
}

/// Detect the input format and build a [`Trace`].
///
/// A single JSON object with a `calls` key is a flame chart document;
/// anything else is treated as a newline-delimited event log, whose calls
/// are kept down to `max_depth`.
pub fn parse_auto(data: &[u8], max_depth: u32) -> Result<Trace, ParseError> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data)
        && value.as_object().is_some_and(|obj| obj.contains_key("calls"))
    {
        return Ok(flame_json::parse_flame_json(data)?);
    }

    Ok(event_log::parse_event_log(data, max_depth)?)
}
