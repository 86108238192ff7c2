use callflame_protocol::CallRecord;

/// Substring filter over call name and file name.
///
/// Both needles must match (AND); an empty needle matches everything.
/// Matching is case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallFilter {
    name: String,
    file: String,
}

impl CallFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, needle: impl Into<String>) -> Self {
        self.name = needle.into();
        self
    }

    pub fn with_file(mut self, needle: impl Into<String>) -> Self {
        self.file = needle.into();
        self
    }

    pub fn set_name(&mut self, needle: impl Into<String>) {
        self.name = needle.into();
    }

    pub fn set_file(&mut self, needle: impl Into<String>) {
        self.file = needle.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.file.is_empty()
    }

    pub fn matches(&self, call: &CallRecord) -> bool {
        call.name.contains(self.name.as_str()) && call.file_name.contains(self.file.as_str())
    }

    /// Matching calls in input order.
    pub fn apply<'a>(&self, calls: &'a [CallRecord]) -> Vec<&'a CallRecord> {
        calls.iter().filter(|c| self.matches(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: u64, name: &str, file_name: &str) -> CallRecord {
        CallRecord {
            id,
            parent_id: None,
            name: name.into(),
            file_name: file_name.into(),
            args: String::new(),
            retval: String::new(),
            call_time: 0.0,
            ret_time: 1.0,
            depth: 0,
        }
    }

    fn calls() -> Vec<CallRecord> {
        vec![
            call(1, "main", "/app/run.py"),
            call(2, "load_config", "/app/config.py"),
            call(3, "parse", "/lib/json/decoder.py"),
            call(4, "load", "/lib/json/__init__.py"),
        ]
    }

    fn ids(calls: &[&CallRecord]) -> Vec<u64> {
        calls.iter().map(|c| c.id).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let calls = calls();
        let filter = CallFilter::new();
        assert!(filter.is_empty());
        assert_eq!(ids(&filter.apply(&calls)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn name_substring() {
        let calls = calls();
        let filter = CallFilter::new().with_name("load");
        assert_eq!(ids(&filter.apply(&calls)), vec![2, 4]);
    }

    #[test]
    fn both_needles_must_match() {
        let calls = calls();
        let filter = CallFilter::new().with_name("load").with_file("/lib/");
        assert_eq!(ids(&filter.apply(&calls)), vec![4]);
    }

    #[test]
    fn case_sensitive() {
        let calls = calls();
        let filter = CallFilter::new().with_name("Main");
        assert!(filter.apply(&calls).is_empty());
    }

    #[test]
    fn setters_replace_needles() {
        let calls = calls();
        let mut filter = CallFilter::new().with_file("app");
        filter.set_file("json");
        filter.set_name("parse");
        assert_eq!(filter.file(), "json");
        assert_eq!(ids(&filter.apply(&calls)), vec![3]);
    }
}
