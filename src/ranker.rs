use log::debug;

use crate::matcher::FuzzyMatcher;
use crate::model::Command;

pub const DEFAULT_THRESHOLD: u8 = 60;
pub const DEFAULT_RESULT_LIMIT: usize = 12;

/// Orders commands for display. Threshold and pool size can be changed
/// between calls.
pub struct Ranker {
    matcher: FuzzyMatcher,
    threshold: u8,
    limit: usize,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_RESULT_LIMIT)
    }
}

impl Ranker {
    pub fn new(threshold: u8, limit: usize) -> Self {
        Self {
            matcher: FuzzyMatcher::new(),
            threshold: threshold.min(100),
            limit,
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: u8) {
        self.threshold = threshold.min(100);
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// With an empty query: history first, then every command not already in
    /// history, each part in its own order. Otherwise: the `limit` best name
    /// matches (stable on ties) that reach the threshold, best first.
    pub fn rank(&mut self, query: &str, commands: &[Command], history: &[Command]) -> Vec<Command> {
        let query = query.trim();
        if query.is_empty() {
            let mut out: Vec<Command> = history.to_vec();
            out.extend(
                commands
                    .iter()
                    .filter(|c| !history.iter().any(|h| h.same_identity(c)))
                    .cloned(),
            );
            debug!("Ranker: empty query, {} history + {} commands", history.len(), out.len() - history.len());
            return out;
        }

        let mut scored: Vec<(usize, u8)> = commands
            .iter()
            .enumerate()
            .map(|(i, c)| (i, self.matcher.score(query, &c.name)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let out: Vec<Command> = scored
            .into_iter()
            .take(self.limit)
            .filter(|&(_, score)| score >= self.threshold)
            .map(|(i, _)| commands[i].clone())
            .collect();

        debug!("Ranker: query='{}', threshold={}, results={}", query, self.threshold, out.len());
        out
    }

    /// Like [`Ranker::rank`] but keeps the score next to each command.
    pub fn scores(&mut self, query: &str, commands: &[Command]) -> Vec<(u8, Command)> {
        let mut scored: Vec<(u8, Command)> = commands
            .iter()
            .map(|c| (self.matcher.score(query, &c.name), c.clone()))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
    }
}
