use std::collections::HashSet;

use callflame_protocol::CallRecord;

use super::call_index::{CallIndex, IndexError};

/// Ids of the calls currently drawn highlighted (the hovered call and its
/// callers). Kept apart from the records so the trace stays immutable.
#[derive(Debug, Clone, Default)]
pub struct HighlightSet {
    ids: HashSet<u64>,
    /// The hovered call itself, last in the chain.
    focus: Option<u64>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlight `id` and every caller above it, replacing the previous set.
    ///
    /// Returns the call stack ordered root first, `id` last. On error the
    /// previous highlights are left in place.
    pub fn highlight_chain<'a>(
        &mut self,
        index: &'a CallIndex,
        id: u64,
    ) -> Result<Vec<&'a CallRecord>, IndexError> {
        let call = index.get_call(id)?;
        let mut stack = index.get_ancestors(id)?;
        stack.reverse();
        stack.push(call);

        self.ids = stack.iter().map(|c| c.id).collect();
        self.focus = Some(id);
        Ok(stack)
    }

    pub fn is_highlighted(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub fn focus(&self) -> Option<u64> {
        self.focus
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.focus = None;
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
