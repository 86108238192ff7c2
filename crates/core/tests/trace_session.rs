//! Integration test: load both input formats through `parse_auto` into a
//! `ChartSession` and drive hover, zoom, filter and rendering end to end.

use callflame_core::layout::LayoutError;
use callflame_core::model::{ChartSession, IndexError, SessionError};
use callflame_core::parsers::{DEFAULT_MAX_DEPTH, parse_auto};
use callflame_core::svg::render_svg;
use callflame_core::views::time_ruler::render_time_ruler;
use callflame_protocol::{RenderCommand, ThemeToken, Viewport};

fn ids(calls: &[&callflame_protocol::CallRecord]) -> Vec<u64> {
    calls.iter().map(|c| c.id).collect()
}

#[test]
fn flame_json_session() {
    let data = include_bytes!("fixtures/basic_trace.json");
    let trace = parse_auto(data, DEFAULT_MAX_DEPTH).expect("failed to parse flame json");
    assert_eq!(trace.call_count(), 7);
    assert_eq!(trace.max_depth(), 2);

    let mut session = ChartSession::from_trace(trace, 500.0).expect("valid trace");
    assert_eq!(session.start_time(), Some("2021-03-04T10:00:00.000000"));

    let index = session.index();
    assert_eq!(ids(&index.get_roots()), vec![1, 7]);
    assert_eq!(ids(&index.get_children(4)), vec![5, 6]);
    assert_eq!(ids(&index.get_ancestors(3).unwrap()), vec![2, 1]);
    assert_eq!(index.get_call(7).unwrap().retval, "");

    // Full window: 10s over 500px.
    let g = session.geometry()[&5];
    assert_eq!((g.x, g.width, g.y), (150.0, 100.0, 80.0));

    // Hover a leaf: it and its callers are highlighted.
    let stack = ids(&session.hover(5).unwrap());
    assert_eq!(stack, vec![1, 4, 5]);

    let cmds = session.render(&Viewport::new(500.0, 200.0));
    let bordered = |token: ThemeToken| -> Vec<u64> {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    border_color: Some(border),
                    call_id,
                    ..
                } if *border == token => *call_id,
                _ => None,
            })
            .collect()
    };
    assert_eq!(bordered(ThemeToken::HoverHighlight), vec![1, 4]);
    assert_eq!(bordered(ThemeToken::SelectionHighlight), vec![5]);

    // Zoom onto `run` (2.5s..7.5s): it fills the viewport.
    session.zoom_to_call(4).unwrap();
    let g = session.geometry()[&4];
    assert_eq!((g.x, g.width), (0.0, 500.0));
    assert_eq!(session.geometry()[&1].x, -250.0);

    // Zero-duration call: zoom refused, window unchanged.
    assert!(matches!(
        session.zoom_to_call(6),
        Err(SessionError::Layout(LayoutError::DegenerateWindow { .. }))
    ));
    assert_eq!(session.geometry()[&4].width, 500.0);

    assert_eq!(
        session.zoom_to_call(99),
        Err(SessionError::Index(IndexError::NotFound(99)))
    );

    session.reset_zoom();
    assert!(!session.layout().is_zoomed());
    assert_eq!(session.geometry()[&1].width, 400.0);

    session.filter_mut().set_file("main.py");
    session.filter_mut().set_name("n");
    assert_eq!(ids(&session.filtered_calls()), vec![1, 4, 6, 7]);

    let svg = render_svg(&cmds, 500.0, 200.0, false);
    assert!(svg.contains(r#"data-call-id="5""#));
    assert!(svg.contains("<title>fetch</title>"));
}

#[test]
fn event_log_session() {
    let data = include_bytes!("fixtures/events.jsonl");
    let trace = parse_auto(data, DEFAULT_MAX_DEPTH).expect("failed to parse event log");
    assert_eq!(trace.start_time.as_deref(), Some("2021-03-04T10:00:00.000000"));
    assert!((trace.total_seconds - 8.0).abs() < 1e-9);

    let names: Vec<&str> = trace.calls.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["main", "load_config", "run", "fetch"]);

    let load = &trace.calls[1];
    assert_eq!(load.args, r#"{"path":"app.toml"}"#);
    assert!((load.call_time - 0.5).abs() < 1e-9);
    assert_eq!(trace.calls[0].retval, "0");

    // The exception record doesn't unwind `fetch`; its own return does.
    let fetch = &trace.calls[3];
    assert_eq!((fetch.parent_id, fetch.depth), (Some(3), 2));
    assert!((fetch.ret_time - 5.0).abs() < 1e-9);

    let mut session = ChartSession::from_trace(trace, 800.0).expect("valid trace");
    assert_eq!(ids(&session.index().get_ancestors(4).unwrap()), vec![3, 1]);
    assert_eq!(session.call_at(400.0, 90.0), Some(4));
    session.zoom_to_call(2).unwrap();
    assert!(session.layout().is_zoomed());
}

#[test]
fn event_log_depth_limit() {
    let data = include_bytes!("fixtures/events.jsonl");
    let trace = parse_auto(data, 1).expect("failed to parse event log");
    assert_eq!(trace.call_count(), 3);
    assert!(trace.calls.iter().all(|c| c.depth <= 1));
}

#[test]
fn instantaneous_event_log_session() {
    let log = concat!(
        r#"{"type": "call", "timestamp": "2020-01-01T00:00:00.000000", "function_name": "tick"}"#,
        "\n",
        r#"{"type": "return", "timestamp": "2020-01-01T00:00:00.000000", "function_name": "tick"}"#,
        "\n",
    );
    let trace = parse_auto(log.as_bytes(), DEFAULT_MAX_DEPTH).expect("failed to parse event log");
    assert_eq!(trace.call_count(), 1);
    assert_eq!(trace.total_seconds, 0.0);

    let mut session = ChartSession::from_trace(trace, 500.0).expect("zero span is a valid trace");
    assert_eq!(ids(&session.index().get_roots()), vec![1]);
    assert_eq!(session.index().get_call(1).unwrap().name, "tick");
    assert_eq!(session.hover(1).unwrap().len(), 1);

    let g = session.geometry()[&1];
    assert_eq!((g.x, g.width), (0.0, 0.0));
    assert!(matches!(
        session.zoom_to_call(1),
        Err(SessionError::Layout(LayoutError::DegenerateWindow { .. }))
    ));

    let mut cmds = session.render(&Viewport::new(500.0, 40.0));
    cmds.extend(render_time_ruler(session.layout(), 40.0));
    assert!(render_svg(&cmds, 500.0, 60.0, false).ends_with("</svg>"));
}
