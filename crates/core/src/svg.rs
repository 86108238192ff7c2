//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use callflame_protocol::{RenderCommand, TextAlign, ThemeToken};

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions.
/// `dark` selects the color palette.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 200);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:monospace;font-size:11px">"#,
    ));

    let bg = resolve_color(ThemeToken::Background, dark);
    svg.push_str(&format!(r#"<rect width="{width}" height="{height}" fill="{bg}"/>"#));

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
                call_id,
            } => {
                let fill = resolve_color(*color, dark);
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}""#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
                if let Some(border) = border_color {
                    svg.push_str(&format!(r#" stroke="{}""#, resolve_color(*border, dark)));
                }
                if let Some(id) = call_id {
                    svg.push_str(&format!(r#" data-call-id="{id}""#));
                }
                svg.push('>');
                if let Some(label) = label {
                    svg.push_str(&format!("<title>{}</title>", escape_xml(label)));
                }
                svg.push_str("</rect>");

                // Inline label only when the bar can fit a few characters
                if let Some(label) = label
                    && rect.w > 30.0
                {
                    let text_color = resolve_color(ThemeToken::TextPrimary, dark);
                    let tx = rect.x + 3.0;
                    let ty = rect.y + rect.h * 0.65;
                    let max_chars = (rect.w / 7.0) as usize;
                    let text = if label.chars().count() > max_chars && max_chars > 2 {
                        let truncated: String = label.chars().take(max_chars - 1).collect();
                        format!("{truncated}…")
                    } else {
                        label.clone()
                    };
                    svg.push_str(&format!(
                        r#"<text x="{tx}" y="{ty}" fill="{text_color}" style="pointer-events:none">{}</text>"#,
                        escape_xml(&text),
                    ));
                }
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
            } => {
                let stroke = resolve_color(*color, dark);
                svg.push_str(&format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{stroke}" stroke-width="{line_width}"/>"#,
                    from.x, from.y, to.x, to.y,
                ));
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                font_size,
                align,
            } => {
                let fill = resolve_color(*color, dark);
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" fill="{fill}" font-size="{font_size}" text-anchor="{anchor}">{}</text>"#,
                    position.x,
                    position.y,
                    escape_xml(text),
                ));
            }
            RenderCommand::BeginGroup { id, .. } => {
                svg.push_str(&format!(r#"<g id="{}">"#, escape_xml(id)));
            }
            RenderCommand::EndGroup => svg.push_str("</g>"),
        }
    }

    svg.push_str("</svg>");
    svg
}

fn resolve_color(token: ThemeToken, dark: bool) -> &'static str {
    if dark {
        match token {
            ThemeToken::FlameHot => "#f44336",
            ThemeToken::FlameWarm => "#ffa726",
            ThemeToken::FlameCold => "#42a5f5",
            ThemeToken::FlameNeutral => "#9575cd",
            ThemeToken::TextPrimary => "#ececec",
            ThemeToken::TextMuted => "#9e9e9e",
            ThemeToken::HoverHighlight => "#ffeb3b",
            ThemeToken::SelectionHighlight => "#448aff",
            ThemeToken::Background => "#181818",
            ThemeToken::Border => "#303030",
        }
    } else {
        match token {
            ThemeToken::FlameHot => "#e63946",
            ThemeToken::FlameWarm => "#f4845f",
            ThemeToken::FlameCold => "#457b9d",
            ThemeToken::FlameNeutral => "#adb5bd",
            ThemeToken::TextPrimary => "#1a1a2e",
            ThemeToken::TextMuted => "#666677",
            ThemeToken::HoverHighlight => "#ffd60a",
            ThemeToken::SelectionHighlight => "#00b87a",
            ThemeToken::Background => "#ffffff",
            ThemeToken::Border => "#dee2e6",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
