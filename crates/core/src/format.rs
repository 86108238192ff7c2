//! Text helpers for call labels, list rows and the info panel.

use callflame_protocol::CallRecord;

/// Format seconds as `minutes:seconds.millis`, e.g. `75.5` → `"1:15.500"`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "?".to_string();
    }
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor();
    let rest = seconds - minutes * 60.0;
    format!("{}:{:06.3}", minutes as u64, rest)
}

/// Last path component prefixed with `.../`; empty paths stay empty.
pub fn short_file_name(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let base = path.rsplit('/').next().unwrap_or(path);
    format!(".../{base}")
}

/// The recorder writes `None` for calls without arguments.
pub fn display_args(args: &str) -> &str {
    if args == "None" { "" } else { args }
}

/// `name(args): retval`
pub fn call_signature(call: &CallRecord) -> String {
    format!(
        "{}({}): {}",
        call.name,
        display_args(&call.args),
        call.retval
    )
}

/// One line of the call list: signature, duration and short file name.
pub fn call_summary(call: &CallRecord) -> String {
    let file = short_file_name(&call.file_name);
    let mut line = format!("{}  {}", call_signature(call), format_duration(call.duration()));
    if !file.is_empty() {
        line.push_str("  ");
        line.push_str(&file);
    }
    line
}
