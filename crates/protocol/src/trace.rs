use serde::{Deserialize, Deserializer, Serialize};

/// The trace document handed to the viewer.
///
/// ```text
///   event log ─┐
///              ├─▶ Trace ──▶ CallIndex  (roots, children, ancestors)
///   flame JSON ┘     │
///                    └────▶ TimeLayout (x, width, y per call)
/// ```
///
/// `calls` is ordered so that the record at index `i` has `id == i + 1`.
/// Producers must keep that positional contract; parent pointers and depth
/// are only checked lazily, per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Wall-clock timestamp of the first call, if the producer recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Span of the whole trace in seconds.
    pub total_seconds: f64,
    pub calls: Vec<CallRecord>,
}

impl Trace {
    pub fn new(total_seconds: f64, calls: Vec<CallRecord>) -> Self {
        Self {
            start_time: None,
            total_seconds,
            calls,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// Deepest nesting level present in the trace.
    pub fn max_depth(&self) -> u32 {
        self.calls.iter().map(|c| c.depth).max().unwrap_or(0)
    }
}

/// One traced function invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Unique, 1-based id matching the record's position in the trace.
    pub id: u64,
    /// Caller id; `None` for a top-level call.
    pub parent_id: Option<u64>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub file_name: String,
    /// Argument list, already rendered by the recorder.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub args: String,
    /// Return value, already rendered by the recorder.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub retval: String,
    /// Seconds since trace start.
    pub call_time: f64,
    /// Seconds since trace start, `>= call_time`.
    pub ret_time: f64,
    /// Nesting level (0 = root); equals the number of ancestors.
    pub depth: u32,
}

impl CallRecord {
    pub fn duration(&self) -> f64 {
        self.ret_time - self.call_time
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_recorder_output() {
        let json = r#"{
            "start_time": "2015-03-01T10:00:00.000000",
            "total_seconds": 2.5,
            "calls": [
                {"id": 1, "parent_id": null, "name": "main", "file_name": "/src/app.py",
                 "args": "None", "retval": "0", "call_time": 0.0, "ret_time": 2.5, "depth": 0},
                {"id": 2, "parent_id": 1, "name": "helper", "args": null, "retval": null,
                 "call_time": 0.5, "ret_time": 1.0, "depth": 1}
            ]
        }"#;
        let trace: Trace = serde_json::from_str(json).unwrap();
        assert_eq!(trace.call_count(), 2);
        assert_eq!(trace.start_time.as_deref(), Some("2015-03-01T10:00:00.000000"));
        assert_eq!(trace.calls[0].args, "None");
        assert!(trace.calls[0].is_root());

        let helper = &trace.calls[1];
        assert_eq!(helper.parent_id, Some(1));
        assert_eq!(helper.file_name, "");
        assert_eq!(helper.args, "");
        assert_eq!(helper.retval, "");
        assert!((helper.duration() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn max_depth_of_empty_trace() {
        let trace = Trace::new(0.0, vec![]);
        assert_eq!(trace.max_depth(), 0);
    }

    #[test]
    fn start_time_is_optional_on_the_wire() {
        let trace = Trace::new(1.0, vec![]);
        let json = serde_json::to_string(&trace).unwrap();
        assert!(!json.contains("start_time"));
        let back: Trace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trace);
    }
}
