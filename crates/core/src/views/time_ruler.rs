use callflame_protocol::{Point, RenderCommand, TextAlign, ThemeToken};

use crate::layout::TimeLayout;

/// Vertical space the ruler occupies below its baseline.
pub const RULER_HEIGHT: f64 = 20.0;

const TICK_HEIGHT: f64 = 6.0;
const FONT_SIZE: f64 = 10.0;
const MIN_TICK_SPACING_PX: f64 = 80.0;

/// Render a time ruler for the layout's current window with its baseline
/// at `y`: a line across the viewport, ticks at a "nice" interval in
/// seconds, and a label per tick. A zero-span window gets a single tick at
/// its start.
pub fn render_time_ruler(layout: &TimeLayout, y: f64) -> Vec<RenderCommand> {
    let width = layout.viewport_width();
    let window = layout.window();
    if width <= 0.0 {
        return Vec::new();
    }

    let mut commands = Vec::with_capacity(32);
    commands.push(RenderCommand::DrawLine {
        from: Point::new(0.0, y),
        to: Point::new(width, y),
        color: ThemeToken::Border,
        width: 1.0,
    });

    let interval = nice_interval(window.duration(), width);
    if !interval.is_finite() || interval <= 0.0 {
        push_tick(&mut commands, layout, y, window.start(), 0);
        return commands;
    }
    let decimals = label_decimals(interval);

    // Ticks are counted up front: near the limits of f64 precision, stepping
    // a float counter can stall.
    let max_ticks = (width / MIN_TICK_SPACING_PX).ceil() as usize + 2;
    let first = (window.start() / interval).ceil() * interval;
    let span = ((window.end() - first) / interval).floor();
    if span.is_nan() || span < 0.0 {
        return commands;
    }
    let count = (span as usize).min(max_ticks);

    let mut previous = None;
    for i in 0..=count {
        let t = first + i as f64 * interval;
        if t > window.end() {
            break;
        }
        if previous == Some(t) {
            continue;
        }
        previous = Some(t);
        push_tick(&mut commands, layout, y, t, decimals);
    }

    commands
}

fn push_tick(
    commands: &mut Vec<RenderCommand>,
    layout: &TimeLayout,
    y: f64,
    t: f64,
    decimals: usize,
) {
    let x = layout.x_of(t);
    commands.push(RenderCommand::DrawLine {
        from: Point::new(x, y),
        to: Point::new(x, y + TICK_HEIGHT),
        color: ThemeToken::TextMuted,
        width: 1.0,
    });
    commands.push(RenderCommand::DrawText {
        position: Point::new(x + 2.0, y + TICK_HEIGHT + FONT_SIZE),
        text: format!("{t:.decimals$}s"),
        color: ThemeToken::TextMuted,
        font_size: FONT_SIZE,
        align: TextAlign::Left,
    });
}

/// Smallest 1/2/5 × 10^k seconds keeping ticks at least
/// `MIN_TICK_SPACING_PX` apart.
fn nice_interval(duration: f64, width_px: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    let target_count = (width_px / MIN_TICK_SPACING_PX).max(1.0);
    let raw = duration / target_count;
    let magnitude = 10f64.powf(raw.log10().floor());
    for step in [1.0, 2.0, 5.0, 10.0] {
        if step * magnitude >= raw {
            return step * magnitude;
        }
    }
    10.0 * magnitude
}

/// Enough decimals to tell adjacent ticks apart.
fn label_decimals(interval: f64) -> usize {
    (-interval.log10().floor()).max(0.0) as usize
}
