use std::sync::Mutex;

use crate::filter::QueryString;

/// Host that owns the address bar and its history
pub trait Navigator: Send + Sync {
    /// Pushes a new history entry
    fn push_query(&self, path: &str, query: &QueryString);

    fn current_query(&self) -> QueryString;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub path: String,
    pub query: QueryString,
}

impl HistoryEntry {
    /// `path?query`, or just `path` when the query is empty
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
}

/// In-process history stack with back/forward
pub struct MemoryHistory {
    inner: Mutex<History>,
}

impl MemoryHistory {
    /// Starts at `/` with no query
    pub fn new() -> Self {
        Self::starting_at("/", QueryString::new())
    }

    pub fn starting_at(path: impl Into<String>, query: QueryString) -> Self {
        Self {
            inner: Mutex::new(History {
                entries: vec![HistoryEntry {
                    path: path.into(),
                    query,
                }],
                cursor: 0,
            }),
        }
    }

    pub fn current(&self) -> HistoryEntry {
        let history = self.lock();
        history.entries[history.cursor].clone()
    }

    /// Steps back one entry, if there is one
    pub fn back(&self) -> Option<HistoryEntry> {
        let mut history = self.lock();
        if history.cursor == 0 {
            return None;
        }
        history.cursor -= 1;
        Some(history.entries[history.cursor].clone())
    }

    pub fn forward(&self) -> Option<HistoryEntry> {
        let mut history = self.lock();
        if history.cursor + 1 >= history.entries.len() {
            return None;
        }
        history.cursor += 1;
        Some(history.entries[history.cursor].clone())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, History> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for MemoryHistory {
    fn push_query(&self, path: &str, query: &QueryString) {
        let mut history = self.lock();
        let keep = history.cursor + 1;
        history.entries.truncate(keep);
        history.entries.push(HistoryEntry {
            path: path.to_string(),
            query: query.clone(),
        });
        history.cursor = keep;
    }

    fn current_query(&self) -> QueryString {
        self.current().query
    }
}
