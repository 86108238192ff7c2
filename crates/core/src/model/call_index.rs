use std::collections::HashMap;

use callflame_protocol::CallRecord;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("no call with id {0}")]
    NotFound(u64),
    #[error("ancestor walk from call {id} exceeded {limit} steps; parent pointers form a cycle")]
    CycleDetected { id: u64, limit: usize },
}

/// Id and parent lookups over a flat, parent-pointer-linked call list.
///
/// Both maps hold positions into `calls`, built in one pass and never
/// mutated afterwards. Sibling order is the order of the input list; a
/// record repeating an earlier id is dropped.
#[derive(Debug, Clone, Default)]
pub struct CallIndex {
    calls: Vec<CallRecord>,
    by_id: HashMap<u64, usize>,
    by_parent: HashMap<Option<u64>, Vec<usize>>,
}

impl CallIndex {
    pub fn new(records: Vec<CallRecord>) -> Self {
        let mut calls = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_parent: HashMap<Option<u64>, Vec<usize>> = HashMap::new();

        for (position, call) in records.into_iter().enumerate() {
            if by_id.contains_key(&call.id) {
                tracing::warn!(id = call.id, position, "duplicate call id, keeping first");
                continue;
            }
            let pos = calls.len();
            by_id.insert(call.id, pos);
            by_parent.entry(call.parent_id).or_default().push(pos);
            calls.push(call);
        }

        tracing::debug!(
            calls = calls.len(),
            roots = by_parent.get(&None).map_or(0, Vec::len),
            "built call index"
        );

        Self {
            calls,
            by_id,
            by_parent,
        }
    }

    /// The indexed records in input order.
    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn get_call(&self, id: u64) -> Result<&CallRecord, IndexError> {
        self.by_id
            .get(&id)
            .map(|&pos| &self.calls[pos])
            .ok_or(IndexError::NotFound(id))
    }

    /// The caller of `id`, or `None` for a root.
    pub fn get_parent(&self, id: u64) -> Result<Option<&CallRecord>, IndexError> {
        match self.get_call(id)?.parent_id {
            Some(parent_id) => self.get_call(parent_id).map(Some),
            None => Ok(None),
        }
    }

    /// Direct callees of `id` in input order. Unknown ids have no children.
    pub fn get_children(&self, id: u64) -> Vec<&CallRecord> {
        self.children_of(Some(id))
    }

    /// Top-level calls in input order.
    pub fn get_roots(&self) -> Vec<&CallRecord> {
        self.children_of(None)
    }

    /// Callers of `id` from the immediate parent out to the root.
    ///
    /// The walk is bounded by the number of records, so cyclic parent
    /// pointers fail with [`IndexError::CycleDetected`] instead of looping.
    pub fn get_ancestors(&self, id: u64) -> Result<Vec<&CallRecord>, IndexError> {
        let limit = self.calls.len();
        let mut ancestors = Vec::new();
        let mut current = self.get_call(id)?;

        while let Some(parent_id) = current.parent_id {
            if ancestors.len() >= limit {
                return Err(IndexError::CycleDetected { id, limit });
            }
            current = self.get_call(parent_id)?;
            ancestors.push(current);
        }

        Ok(ancestors)
    }

    fn children_of(&self, parent: Option<u64>) -> Vec<&CallRecord> {
        self.by_parent
            .get(&parent)
            .map(|positions| positions.iter().map(|&pos| &self.calls[pos]).collect())
            .unwrap_or_default()
    }
}
