use crate::model::{Command, IdentityKey};

pub const DEFAULT_HISTORY_SIZE: usize = 5;

/// Most-recently-used commands, newest first, at most `max_size` long and
/// holding at most one entry per identity key.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Command>,
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_size,
        }
    }

    /// Rebuilds a history from stored entries, applying the same dedup and
    /// size rules as live recording. The first occurrence of a key wins.
    pub fn from_entries(entries: Vec<Command>, max_size: usize) -> Self {
        let mut history = Self::new(max_size);
        for entry in entries {
            if !history.contains(&entry.key()) {
                history.entries.push(entry.as_history());
            }
        }
        history.entries.truncate(max_size);
        history
    }

    pub fn entries(&self) -> &[Command] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.entries.truncate(max_size);
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.entries.iter().any(|e| e.has_key(key))
    }

    pub fn record(&mut self, command: &Command) {
        self.entries.retain(|e| !e.same_identity(command));
        self.entries.insert(0, command.as_history());
        self.entries.truncate(self.max_size);
    }

    /// Drops every entry with this identity key, returning how many went.
    pub fn remove(&mut self, key: &IdentityKey) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.has_key(key));
        before - self.entries.len()
    }
}
