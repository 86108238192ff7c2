//! `callflame`: view a call trace as a flame chart in the terminal, or
//! export it as SVG.
//!
//! Usage:
//!   callflame trace.jsonl
//!   callflame flame.json --zoom 12 --svg chart.svg --dark
//!   callflame trace.jsonl --name load --list

mod app;
mod renderer;

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use callflame_core::filter::CallFilter;
use callflame_core::format::call_summary;
use callflame_core::layout::{DEFAULT_VIEWPORT_WIDTH, ROW_HEIGHT};
use callflame_core::model::{CallIndex, ChartSession};
use callflame_core::parsers::{DEFAULT_MAX_DEPTH, parse_auto};
use callflame_core::svg::render_svg;
use callflame_core::views::time_ruler::{RULER_HEIGHT, render_time_ruler};
use callflame_protocol::{CallRecord, Viewport};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

/// Flame chart viewer for function call traces.
#[derive(Parser, Debug)]
#[command(name = "callflame")]
#[command(about = "Flame chart viewer for function call traces")]
struct Args {
    /// Trace file: a flame chart JSON document or a JSON-lines event log
    trace: PathBuf,

    /// Deepest call level kept when building a chart from an event log
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u32,

    /// Chart width in pixels for SVG export
    #[arg(long, default_value_t = DEFAULT_VIEWPORT_WIDTH)]
    width: f64,

    /// Write an SVG to this path instead of opening the viewer
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Dark palette for SVG export
    #[arg(long)]
    dark: bool,

    /// Start zoomed onto this call id
    #[arg(long)]
    zoom: Option<u64>,

    /// Only list calls whose name contains this text
    #[arg(long, default_value = "")]
    name: String,

    /// Only list calls whose file name contains this text
    #[arg(long, default_value = "")]
    file: String,

    /// Print the (filtered) call list and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let data = std::fs::read(&args.trace)
        .with_context(|| format!("reading {}", args.trace.display()))?;
    let trace = parse_auto(&data, args.max_depth)
        .with_context(|| format!("parsing {}", args.trace.display()))?;
    tracing::info!(
        calls = trace.call_count(),
        total_seconds = trace.total_seconds,
        "trace loaded"
    );

    let filter = CallFilter::new()
        .with_name(args.name.as_str())
        .with_file(args.file.as_str());

    if args.list {
        return list_calls(&CallIndex::new(trace.calls), &filter);
    }

    let mut session = ChartSession::from_trace(trace, args.width)?;
    *session.filter_mut() = filter;
    if let Some(id) = args.zoom {
        session
            .zoom_to_call(id)
            .with_context(|| format!("zooming to call {id}"))?;
    }

    if let Some(out) = &args.svg {
        return export_svg(&mut session, args.width, args.dark, out);
    }

    renderer::run(app::App::new(session))
}

/// The call list needs no layout, so it works for any trace that parses.
fn list_calls(index: &CallIndex, filter: &CallFilter) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for call in filter.apply(index.calls()) {
        writeln!(out, "{:>6}  {}", call.id, call_summary(call))?;
    }
    Ok(())
}

fn export_svg(session: &mut ChartSession, width: f64, dark: bool, out: &Path) -> Result<()> {
    let chart_height = f64::from(chart_rows(session.index().calls())) * ROW_HEIGHT;

    let mut commands = session.render(&Viewport::new(width, chart_height));
    commands.extend(render_time_ruler(session.layout(), chart_height));

    let svg = render_svg(&commands, width, chart_height + RULER_HEIGHT, dark);
    std::fs::write(out, svg).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(path = %out.display(), "svg written");
    Ok(())
}

/// Depth rows needed to draw every call.
fn chart_rows(calls: &[CallRecord]) -> u32 {
    calls
        .iter()
        .map(|c| c.depth.saturating_add(1))
        .max()
        .unwrap_or(0)
}
