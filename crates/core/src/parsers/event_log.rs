use callflame_protocol::{CallRecord, Trace};
use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

/// Calls nested deeper than this are dropped unless the caller asks for more.
pub const DEFAULT_MAX_DEPTH: u32 = 100;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
    #[error("line {line}: unknown event type {kind:?}")]
    UnknownEventType { line: usize, kind: String },
    #[error("line {line}: missing timestamp")]
    MissingTimestamp { line: usize },
    #[error("line {line}: bad timestamp {value:?}: {source}")]
    BadTimestamp {
        line: usize,
        value: String,
        source: chrono::ParseError,
    },
    #[error("line {line}: return without a matching call")]
    UnbalancedReturn { line: usize },
}

/// One line of the recorder's output. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    timestamp: Option<String>,
    function_name: Option<String>,
    file_name: Option<String>,
    #[serde(default)]
    args: serde_json::Value,
    #[serde(default)]
    retval: serde_json::Value,
}

#[derive(Debug)]
struct Node {
    name: String,
    file_name: String,
    args: String,
    retval: String,
    called: NaiveDateTime,
    returned: Option<NaiveDateTime>,
    children: Vec<usize>,
}

/// Build a [`Trace`] from a newline-delimited JSON event log.
///
/// `call` events open a frame and `return` events close the innermost open
/// one. `line`, `exception` and bare `event`/`function` records don't change
/// the stack: a frame unwound by an exception still gets its own `return`.
/// Frames left open at end of input are closed at the last timestamp seen.
///
/// Records are emitted in pre-order so ids are contiguous and 1-based; calls
/// nested deeper than `max_depth` are omitted together with their subtrees.
pub fn parse_event_log(data: &[u8], max_depth: u32) -> Result<Trace, EventLogError> {
    let text = std::str::from_utf8(data)?;

    let mut nodes: Vec<Node> = Vec::new();
    let mut roots: Vec<usize> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut last_seen: Option<NaiveDateTime> = None;

    for (i, raw_line) in text.lines().enumerate() {
        let line = i + 1;
        let raw_line = raw_line.trim();
        if raw_line.is_empty() {
            continue;
        }

        let event: RawEvent = serde_json::from_str(raw_line)
            .map_err(|source| EventLogError::Json { line, source })?;

        match event.kind.as_str() {
            "call" => {
                let called = parse_timestamp(event.timestamp.as_deref(), line)?;
                let idx = nodes.len();
                nodes.push(Node {
                    name: event.function_name.unwrap_or_default(),
                    file_name: event.file_name.unwrap_or_default(),
                    args: value_to_string(event.args),
                    retval: String::new(),
                    called,
                    returned: None,
                    children: Vec::new(),
                });
                match stack.last() {
                    Some(&parent) => nodes[parent].children.push(idx),
                    None => roots.push(idx),
                }
                stack.push(idx);
                last_seen = Some(called);
            }
            "return" => {
                let returned = parse_timestamp(event.timestamp.as_deref(), line)?;
                let Some(idx) = stack.pop() else {
                    return Err(EventLogError::UnbalancedReturn { line });
                };
                nodes[idx].returned = Some(returned);
                nodes[idx].retval = value_to_string(event.retval);
                last_seen = Some(returned);
            }
            "exception" | "line" | "event" | "function" => {}
            other => {
                return Err(EventLogError::UnknownEventType {
                    line,
                    kind: other.to_string(),
                });
            }
        }
    }

    if let Some(end) = last_seen
        && !stack.is_empty()
    {
        tracing::warn!(open = stack.len(), "closing unreturned calls at end of log");
        for idx in stack.drain(..) {
            nodes[idx].returned = Some(end);
        }
    }

    let (Some(&first), Some(&last)) = (roots.first(), roots.last()) else {
        return Ok(Trace::new(0.0, Vec::new()));
    };
    let start = nodes[first].called;
    let stop = nodes[last].returned.unwrap_or(start);

    let calls = flatten(&nodes, &roots, start, max_depth);
    tracing::debug!(
        events = nodes.len(),
        calls = calls.len(),
        max_depth,
        "built trace from event log"
    );

    Ok(Trace {
        start_time: Some(start.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()),
        total_seconds: seconds_between(start, stop),
        calls,
    })
}

/// Pre-order walk assigning ids as records are emitted.
fn flatten(
    nodes: &[Node],
    roots: &[usize],
    start: NaiveDateTime,
    max_depth: u32,
) -> Vec<CallRecord> {
    let mut calls = Vec::with_capacity(nodes.len());
    let mut pending: Vec<(usize, u32, Option<u64>)> =
        roots.iter().rev().map(|&idx| (idx, 0, None)).collect();

    while let Some((idx, depth, parent_id)) = pending.pop() {
        let node = &nodes[idx];
        let id = calls.len() as u64 + 1;
        let returned = node.returned.unwrap_or(node.called);
        calls.push(CallRecord {
            id,
            parent_id,
            name: node.name.clone(),
            file_name: node.file_name.clone(),
            args: node.args.clone(),
            retval: node.retval.clone(),
            call_time: seconds_between(start, node.called),
            ret_time: seconds_between(start, returned),
            depth,
        });

        if depth < max_depth {
            pending.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|&child| (child, depth + 1, Some(id))),
            );
        }
    }

    calls
}

fn parse_timestamp(value: Option<&str>, line: usize) -> Result<NaiveDateTime, EventLogError> {
    let value = value.ok_or(EventLogError::MissingTimestamp { line })?;
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|source| {
        EventLogError::BadTimestamp {
            line,
            value: value.to_string(),
            source,
        }
    })
}

fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let delta = to - from;
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

/// Recorder output is usually a pre-rendered string; anything else is kept
/// as compact JSON so it can still be displayed.
fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
