//! Browser history integration.

use parking_lot::Mutex;

use crate::defaults::ROOT_PATH;

/// The host's session history.
pub trait History: Send + Sync {
    /// Push a new entry and make it current.
    fn push_state(&self, path: &str);

    /// Path of the current entry.
    fn current_path(&self) -> String;
}

/// Path to request on startup.
///
/// `/index.html` and an empty path both mean the site root.
pub fn startup_path(history: &dyn History) -> String {
    let path = history.current_path();
    if path.is_empty() || path == "/index.html" {
        ROOT_PATH.to_string()
    } else {
        path
    }
}

#[derive(Debug)]
struct Entries {
    stack: Vec<String>,
    index: usize,
}

/// In-memory session history with browser semantics.
///
/// Pushing truncates any forward entries. [`back`](Self::back) and
/// [`forward`](Self::forward) only move the cursor; the host is expected to
/// follow up with [`Bridge::on_pop_state`](crate::Bridge::on_pop_state), the
/// way a browser fires `popstate`.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Entries>,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                stack: vec![initial.into()],
                index: 0,
            }),
        }
    }

    /// Move one entry back. Returns the new current path.
    pub fn back(&self) -> Option<String> {
        let mut entries = self.entries.lock();
        if entries.index == 0 {
            return None;
        }
        entries.index -= 1;
        Some(entries.stack[entries.index].clone())
    }

    /// Move one entry forward. Returns the new current path.
    pub fn forward(&self) -> Option<String> {
        let mut entries = self.entries.lock();
        if entries.index + 1 >= entries.stack.len() {
            return None;
        }
        entries.index += 1;
        Some(entries.stack[entries.index].clone())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl History for MemoryHistory {
    fn push_state(&self, path: &str) {
        let mut entries = self.entries.lock();
        let keep = entries.index + 1;
        entries.stack.truncate(keep);
        entries.stack.push(path.to_string());
        entries.index = keep;
    }

    fn current_path(&self) -> String {
        let entries = self.entries.lock();
        entries.stack[entries.index].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_back_forward() {
        let history = MemoryHistory::new("/");
        history.push_state("/about");
        history.push_state("/docs");
        assert_eq!(history.current_path(), "/docs");
        assert_eq!(history.len(), 3);

        assert_eq!(history.back().as_deref(), Some("/about"));
        assert_eq!(history.back().as_deref(), Some("/"));
        assert_eq!(history.back(), None);

        assert_eq!(history.forward().as_deref(), Some("/about"));
        assert_eq!(history.current_path(), "/about");
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let history = MemoryHistory::new("/");
        history.push_state("/a");
        history.push_state("/b");
        history.back();

        history.push_state("/c");
        assert_eq!(history.len(), 3);
        assert_eq!(history.forward(), None);
        assert_eq!(history.back().as_deref(), Some("/a"));
    }

    #[test]
    fn test_startup_path() {
        assert_eq!(startup_path(&MemoryHistory::new("/index.html")), "/");
        assert_eq!(startup_path(&MemoryHistory::new("")), "/");
        assert_eq!(startup_path(&MemoryHistory::new("/docs")), "/docs");
    }
}
