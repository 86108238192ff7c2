use callflame_protocol::Trace;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlameJsonError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("call at position {position} has id {id}, expected {expected}")]
    NonPositionalId { position: usize, id: u64, expected: u64 },
    #[error("total_seconds must be a non-negative number, got {0}")]
    InvalidTotal(f64),
}

/// Parse the flame chart document: `{ total_seconds, calls: [...] }`.
///
/// Only the document-wide contract is enforced here: `calls[i].id == i + 1`
/// and a sane `total_seconds`. Parent links, cycles and depths are left to
/// per-query checks in [`crate::model::CallIndex`], so one malformed record
/// does not take the rest of the trace down with it.
pub fn parse_flame_json(data: &[u8]) -> Result<Trace, FlameJsonError> {
    let trace: Trace = serde_json::from_slice(data)?;

    if !trace.total_seconds.is_finite() || trace.total_seconds < 0.0 {
        return Err(FlameJsonError::InvalidTotal(trace.total_seconds));
    }

    for (position, call) in trace.calls.iter().enumerate() {
        let expected = position as u64 + 1;
        if call.id != expected {
            return Err(FlameJsonError::NonPositionalId {
                position,
                id: call.id,
                expected,
            });
        }
    }

    tracing::debug!(
        calls = trace.calls.len(),
        total_seconds = trace.total_seconds,
        "parsed flame json"
    );
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document() {
        let input = br#"{"total_seconds": 10, "calls": [
            {"id": 1, "parent_id": null, "name": "main", "file_name": "a.py",
             "args": "None", "retval": "None", "call_time": 0, "ret_time": 10, "depth": 0},
            {"id": 2, "parent_id": 1, "name": "work", "file_name": "a.py",
             "args": "x=1", "retval": "2", "call_time": 1, "ret_time": 5, "depth": 1}
        ]}"#;
        let trace = parse_flame_json(input).unwrap();
        assert_eq!(trace.call_count(), 2);
        assert_eq!(trace.total_seconds, 10.0);
        assert_eq!(trace.calls[1].name, "work");
    }

    #[test]
    fn rejects_non_positional_ids() {
        let input = br#"{"total_seconds": 1, "calls": [
            {"id": 2, "parent_id": null, "name": "main", "call_time": 0, "ret_time": 1, "depth": 0}
        ]}"#;
        let err = parse_flame_json(input).unwrap_err();
        assert!(matches!(
            err,
            FlameJsonError::NonPositionalId {
                position: 0,
                id: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn rejects_negative_total() {
        let input = br#"{"total_seconds": -1, "calls": []}"#;
        assert!(matches!(
            parse_flame_json(input),
            Err(FlameJsonError::InvalidTotal(_))
        ));
    }

    #[test]
    fn dangling_parent_is_not_a_parse_error() {
        let input = br#"{"total_seconds": 1, "calls": [
            {"id": 1, "parent_id": 7, "name": "orphan", "call_time": 0, "ret_time": 1, "depth": 1}
        ]}"#;
        assert!(parse_flame_json(input).is_ok());
    }

    #[test]
    fn invalid_json() {
        assert!(matches!(
            parse_flame_json(b"{not json"),
            Err(FlameJsonError::Json(_))
        ));
    }
}
