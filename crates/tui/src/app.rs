use callflame_core::format::{call_signature, format_duration, short_file_name};
use callflame_core::layout::ROW_HEIGHT;
use callflame_core::model::ChartSession;

/// Interactive viewer state on top of a [`ChartSession`]: the selected
/// call, vertical scroll and the last status message.
pub struct App {
    pub session: ChartSession,
    selected: Option<u64>,
    /// First visible depth row.
    pub scroll_rows: u32,
    pub message: Option<String>,
    /// Trace time under the mouse pointer.
    pub pointer_time: Option<f64>,
}

impl App {
    pub fn new(session: ChartSession) -> Self {
        let mut app = Self {
            session,
            selected: None,
            scroll_rows: 0,
            message: None,
            pointer_time: None,
        };
        app.select_first_root();
        app
    }

    pub fn selected(&self) -> Option<u64> {
        self.selected
    }

    /// Select a call and highlight its ancestor chain.
    pub fn select(&mut self, id: u64) {
        match self.session.hover(id) {
            Ok(_) => {
                self.selected = Some(id);
                self.message = None;
            }
            Err(err) => self.message = Some(err.to_string()),
        }
    }

    pub fn select_first_root(&mut self) {
        let root = self.session.index().get_roots().first().map(|c| c.id);
        if let Some(id) = root {
            self.select(id);
        }
    }

    /// Drop the selection and its highlighted chain.
    pub fn clear_selection(&mut self) {
        self.session.clear_hover();
        self.selected = None;
    }

    pub fn select_parent(&mut self) {
        let Some(id) = self.selected else {
            return self.select_first_root();
        };
        if let Ok(Some(parent)) = self.session.index().get_parent(id) {
            let parent_id = parent.id;
            self.select(parent_id);
        }
    }

    pub fn select_first_child(&mut self) {
        let Some(id) = self.selected else {
            return self.select_first_root();
        };
        let child = self.session.index().get_children(id).first().map(|c| c.id);
        if let Some(child) = child {
            self.select(child);
        }
    }

    /// Move to the previous (`-1`) or next (`+1`) call at the same level.
    pub fn select_sibling(&mut self, step: isize) {
        let Some(id) = self.selected else {
            return self.select_first_root();
        };
        let siblings = self.sibling_ids(id);
        let Some(pos) = siblings.iter().position(|&s| s == id) else {
            return;
        };
        let target = pos as isize + step;
        if target >= 0
            && let Some(&next) = siblings.get(target as usize)
        {
            self.select(next);
        }
    }

    /// Jump to the next call passing the name/file filter, wrapping around.
    pub fn select_next_match(&mut self) {
        let matches: Vec<u64> = self.session.filtered_calls().iter().map(|c| c.id).collect();
        let next = match self.selected {
            Some(current) => matches
                .iter()
                .copied()
                .find(|&id| id > current)
                .or_else(|| matches.first().copied()),
            None => matches.first().copied(),
        };
        match next {
            Some(id) => self.select(id),
            None => self.message = Some("no calls match the filter".to_string()),
        }
    }

    pub fn zoom_to_selected(&mut self) {
        let Some(id) = self.selected else { return };
        if let Err(err) = self.session.zoom_to_call(id) {
            self.message = Some(format!("cannot zoom: {err}"));
        }
    }

    pub fn reset_zoom(&mut self) {
        self.session.reset_zoom();
        self.message = None;
    }

    /// Hover the call drawn at a content cell; empty space clears the
    /// selection.
    pub fn hover_cell(&mut self, column: u16, row: u16) {
        let x = f64::from(column) + 0.5;
        let y = (f64::from(row) + f64::from(self.scroll_rows) + 0.5) * ROW_HEIGHT;
        self.pointer_time = Some(self.session.layout().time_at(x));
        match self.session.call_at(x, y) {
            Some(id) => self.select(id),
            None => self.clear_selection(),
        }
    }

    pub fn scroll(&mut self, delta: i32) {
        self.scroll_rows = self.scroll_rows.saturating_add_signed(delta);
    }

    /// Status lines: selected call details and its ancestor chain.
    pub fn status(&self) -> (String, String) {
        let Some(id) = self.selected else {
            return (String::new(), String::new());
        };
        let index = self.session.index();
        let Ok(call) = index.get_call(id) else {
            return (String::new(), String::new());
        };

        let detail = format!(
            "{}  {}  {}",
            call_signature(call),
            format_duration(call.duration()),
            short_file_name(&call.file_name)
        );
        let chain = match index.get_ancestors(id) {
            Ok(ancestors) => ancestors
                .iter()
                .rev()
                .map(|c| c.name.as_str())
                .chain(std::iter::once(call.name.as_str()))
                .collect::<Vec<_>>()
                .join(" > "),
            Err(err) => err.to_string(),
        };
        (detail, chain)
    }

    fn sibling_ids(&self, id: u64) -> Vec<u64> {
        let index = self.session.index();
        let siblings = match index.get_parent(id) {
            Ok(Some(parent)) => index.get_children(parent.id),
            Ok(None) => index.get_roots(),
            Err(_) => Vec::new(),
        };
        siblings.iter().map(|c| c.id).collect()
    }
}
