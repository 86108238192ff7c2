use std::io::stdout;

use anyhow::Result;
use callflame_core::format::format_duration;
use callflame_core::layout::ROW_HEIGHT;
use callflame_protocol::{RenderCommand, ThemeToken, Viewport};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

/// Rows taken by the header line and the two status lines.
const CHROME_ROWS: u16 = 3;

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::FlameHot => Color::Red,
        ThemeToken::FlameWarm => Color::Yellow,
        ThemeToken::FlameCold => Color::Blue,
        ThemeToken::FlameNeutral => Color::Gray,
        ThemeToken::TextPrimary => Color::White,
        ThemeToken::TextMuted => Color::DarkGray,
        ThemeToken::HoverHighlight => Color::LightYellow,
        ThemeToken::SelectionHighlight => Color::Green,
        ThemeToken::Background => Color::Black,
        ThemeToken::Border => Color::DarkGray,
    }
}

pub fn run(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        let term_size = terminal.size()?;
        let columns = f64::from(term_size.width);
        if app.session.layout().viewport_width() != columns {
            app.session.resize(columns)?;
        }

        let content_rows = term_size.height.saturating_sub(CHROME_ROWS);
        let viewport = Viewport {
            x: 0.0,
            y: f64::from(app.scroll_rows) * ROW_HEIGHT,
            width: columns,
            height: f64::from(content_rows) * ROW_HEIGHT,
        };
        let cmds = app.session.render(&viewport);
        let (detail, chain) = app.status();
        let header = header_text(app);

        terminal.draw(|frame| {
            let area = frame.area();

            let header_area = Rect::new(0, 0, area.width, 1);
            frame.render_widget(
                Block::default()
                    .title(header)
                    .style(Style::default().fg(Color::White).bg(Color::DarkGray)),
                header_area,
            );

            let content_area = Rect::new(0, 1, area.width, content_rows);
            frame.render_widget(
                Block::default()
                    .borders(Borders::NONE)
                    .style(Style::default().bg(Color::Black)),
                content_area,
            );
            draw_commands(frame.buffer_mut(), content_area, &cmds);

            let status_area = Rect::new(0, 1 + content_rows, area.width, 2);
            let status_text = match &app.message {
                Some(msg) => format!("{detail}\n{msg}"),
                None => format!("{detail}\n{chain}"),
            };
            frame.render_widget(
                Paragraph::new(status_text)
                    .style(Style::default().fg(Color::White).bg(Color::Rgb(20, 20, 20))),
                status_area,
            );
        })?;

        if !event::poll(std::time::Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Up => app.select_parent(),
                KeyCode::Down => app.select_first_child(),
                KeyCode::Left => app.select_sibling(-1),
                KeyCode::Right => app.select_sibling(1),
                KeyCode::Tab | KeyCode::Char('n') => app.select_next_match(),
                KeyCode::Enter => app.zoom_to_selected(),
                KeyCode::Char('r') => app.reset_zoom(),
                KeyCode::PageDown => app.scroll(1),
                KeyCode::PageUp => app.scroll(-1),
                _ => {}
            },
            Event::Mouse(mouse) => {
                let in_content = mouse.row >= 1 && mouse.row < 1 + content_rows;
                match mouse.kind {
                    MouseEventKind::Moved if in_content => {
                        app.hover_cell(mouse.column, mouse.row - 1);
                    }
                    MouseEventKind::Down(MouseButton::Left) if in_content => {
                        app.hover_cell(mouse.column, mouse.row - 1);
                        app.zoom_to_selected();
                    }
                    MouseEventKind::ScrollDown => app.scroll(1),
                    MouseEventKind::ScrollUp => app.scroll(-1),
                    _ => {}
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn header_text(app: &App) -> String {
    let window = app.session.layout().window();
    let zoom = if app.session.layout().is_zoomed() {
        format!(
            "zoom {}..{}",
            format_duration(window.start()),
            format_duration(window.end())
        )
    } else {
        format!("total {}", format_duration(window.duration()))
    };
    let mut extras = String::new();
    if let Some(t) = app.pointer_time {
        extras.push_str(&format!(" | at {}", format_duration(t)));
    }
    let filter = app.session.filter();
    if !filter.is_empty() {
        extras.push_str(&format!(" | filter {:?} {:?}", filter.name(), filter.file()));
    }
    format!(
        " callflame | {} calls | {zoom}{extras} | arrows navigate | enter zoom | r reset | n next match | q quit ",
        app.session.index().len()
    )
}

/// Paint flame chart rects into the buffer: one column per pixel of layout
/// width, one row per depth level.
fn draw_commands(buf: &mut Buffer, area: Rect, cmds: &[RenderCommand]) {
    for cmd in cmds {
        let RenderCommand::DrawRect {
            rect,
            color,
            border_color,
            label,
            ..
        } = cmd
        else {
            continue;
        };

        let col = rect.x.round() as u16;
        let row = (rect.y / ROW_HEIGHT) as u16;
        let width = (rect.w.round() as u16).max(1);
        if row >= area.height || col >= area.width {
            continue;
        }

        let (fg, bg) = match border_color {
            Some(token @ (ThemeToken::HoverHighlight | ThemeToken::SelectionHighlight)) => {
                (Color::Black, theme_to_color(*token))
            }
            _ => (theme_to_color(*color), Color::Black),
        };

        let label_str = label.as_deref().unwrap_or("");
        let display: String = if width as usize >= label_str.chars().count() + 2 {
            format!(" {label_str:<w$}", w = (width as usize).saturating_sub(1))
        } else {
            "█".repeat(width as usize)
        };

        let clamped_width = width.min(area.width.saturating_sub(col));
        for (i, ch) in display.chars().take(clamped_width as usize).enumerate() {
            let x = area.x + col + i as u16;
            let y = area.y + row;
            buf[(x, y)].set_char(ch).set_fg(fg).set_bg(bg);
        }
    }
}
