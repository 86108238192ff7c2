use std::collections::HashMap;

use callflame_protocol::{CallRecord, Rect, RenderCommand, ThemeToken, Viewport};

use crate::layout::{Geometry, ROW_HEIGHT};
use crate::model::HighlightSet;

/// Drawn height of a call bar; the rest of the row is spacing.
pub const BAR_HEIGHT: f64 = ROW_HEIGHT - 10.0;

/// Render calls as a flame chart: X-axis = elapsed time in the current
/// window, Y-axis = call depth.
///
/// `geometry` comes from [`crate::layout::TimeLayout::compute_geometry`];
/// `viewport.x`/`viewport.y` scroll the chart. Bars are clipped to the
/// viewport so a call wider than the window keeps its label on screen. The
/// hovered call gets the selection border, its callers the hover border.
pub fn render_flame_chart(
    calls: &[CallRecord],
    geometry: &HashMap<u64, Geometry>,
    highlights: &HighlightSet,
    viewport: &Viewport,
) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(calls.len() + 2);

    commands.push(RenderCommand::BeginGroup {
        id: "flame-chart".to_string(),
        label: Some("Flame Chart".to_string()),
    });

    for call in calls {
        let Some(g) = geometry.get(&call.id) else {
            continue;
        };
        let x = g.x - viewport.x;
        let y = g.y - viewport.y;

        // Skip calls outside the viewport
        if x + g.width < 0.0 || x > viewport.width {
            continue;
        }
        if y + BAR_HEIGHT < 0.0 || y > viewport.height {
            continue;
        }

        // Skip sub-pixel calls
        if g.width < 0.5 {
            continue;
        }

        let left = x.max(0.0);
        let right = (x + g.width).min(viewport.width);

        let border_color = if highlights.focus() == Some(call.id) {
            ThemeToken::SelectionHighlight
        } else if highlights.is_highlighted(call.id) {
            ThemeToken::HoverHighlight
        } else {
            ThemeToken::Border
        };

        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(left, y, right - left, BAR_HEIGHT),
            color: color_for_depth(call.depth),
            border_color: Some(border_color),
            label: Some(call.name.clone()),
            call_id: Some(call.id),
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

fn color_for_depth(depth: u32) -> ThemeToken {
    match depth % 4 {
        0 => ThemeToken::FlameHot,
        1 => ThemeToken::FlameWarm,
        2 => ThemeToken::FlameCold,
        _ => ThemeToken::FlameNeutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TimeLayout;
    use crate::model::CallIndex;

    fn calls() -> Vec<CallRecord> {
        let call = |id, parent_id, call_time, ret_time, depth| CallRecord {
            id,
            parent_id,
            name: format!("f{id}"),
            file_name: String::new(),
            args: String::new(),
            retval: String::new(),
            call_time,
            ret_time,
            depth,
        };
        vec![
            call(1, None, 0.0, 10.0, 0),
            call(2, Some(1), 1.0, 5.0, 1),
            call(3, Some(1), 6.0, 6.001, 1),
        ]
    }

    fn rects(cmds: &[RenderCommand]) -> Vec<(u64, Rect, Option<ThemeToken>)> {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    rect,
                    call_id: Some(id),
                    border_color,
                    ..
                } => Some((*id, *rect, *border_color)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn produces_grouped_draw_rects() {
        let calls = calls();
        let layout = TimeLayout::new(10.0, 500.0).unwrap();
        let geometry = layout.compute_geometry(&calls);
        let cmds = render_flame_chart(
            &calls,
            &geometry,
            &HighlightSet::new(),
            &Viewport::new(500.0, 400.0),
        );
        assert!(matches!(cmds.first(), Some(RenderCommand::BeginGroup { .. })));
        assert!(matches!(cmds.last(), Some(RenderCommand::EndGroup)));

        // Call 3 is 0.05px wide and gets skipped.
        let drawn = rects(&cmds);
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[1].0, 2);
        assert_eq!(drawn[1].1, Rect::new(50.0, 40.0, 200.0, BAR_HEIGHT));
    }

    #[test]
    fn zoomed_parent_clipped_to_viewport() {
        let calls = calls();
        let mut layout = TimeLayout::new(10.0, 500.0).unwrap();
        layout.zoom_to(1.0, 5.0).unwrap();
        let geometry = layout.compute_geometry(&calls);
        let cmds = render_flame_chart(
            &calls,
            &geometry,
            &HighlightSet::new(),
            &Viewport::new(500.0, 400.0),
        );
        let drawn = rects(&cmds);
        assert_eq!(drawn[0].0, 1);
        assert_eq!(drawn[0].1, Rect::new(0.0, 0.0, 500.0, BAR_HEIGHT));
        // Call 3 starts after the window ends.
        assert!(drawn.iter().all(|(id, ..)| *id != 3));
    }

    #[test]
    fn hovered_call_and_callers_get_distinct_borders() {
        let calls = calls();
        let index = CallIndex::new(calls.clone());
        let mut highlights = HighlightSet::new();
        highlights.highlight_chain(&index, 2).unwrap();

        let layout = TimeLayout::new(10.0, 500.0).unwrap();
        let geometry = layout.compute_geometry(&calls);
        let cmds = render_flame_chart(
            &calls,
            &geometry,
            &highlights,
            &Viewport::new(500.0, 400.0),
        );
        let borders: Vec<_> = rects(&cmds).into_iter().map(|(id, _, b)| (id, b)).collect();
        assert_eq!(
            borders,
            vec![
                (1, Some(ThemeToken::HoverHighlight)),
                (2, Some(ThemeToken::SelectionHighlight)),
            ]
        );
    }

    #[test]
    fn rows_below_viewport_culled() {
        let calls = calls();
        let layout = TimeLayout::new(10.0, 500.0).unwrap();
        let geometry = layout.compute_geometry(&calls);
        let cmds = render_flame_chart(
            &calls,
            &geometry,
            &HighlightSet::new(),
            &Viewport::new(500.0, 20.0),
        );
        let ids: Vec<_> = rects(&cmds).into_iter().map(|(id, ..)| id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn empty_trace_renders_only_group() {
        let layout = TimeLayout::new(1.0, 500.0).unwrap();
        let geometry = layout.compute_geometry(&[]);
        let cmds = render_flame_chart(
            &[],
            &geometry,
            &HighlightSet::new(),
            &Viewport::new(500.0, 400.0),
        );
        assert_eq!(cmds.len(), 2);
    }
}
