//! Log messages of one packaging run.
//!
//! Some notices must appear only once per run no matter how many apps or
//! hooks trigger them. The set of notices already emitted lives here, owned by
//! the run, instead of in logger state.

use std::collections::BTreeSet;

/// How loud a notice is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A message emitted during packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Notices of one run, with warn-once bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    emitted: Vec<Notice>,
    once: BTreeSet<&'static str>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.emitted.push(Notice {
            level: NoticeLevel::Info,
            message,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.emitted.push(Notice {
            level: NoticeLevel::Warning,
            message,
        });
    }

    /// Emit an info notice unless `key` was already used in this run.
    pub fn info_once(&mut self, key: &'static str, message: impl Into<String>) -> bool {
        if !self.once.insert(key) {
            return false;
        }
        self.info(message);
        true
    }

    /// Emit a warning unless `key` was already used in this run.
    pub fn warn_once(&mut self, key: &'static str, message: impl Into<String>) -> bool {
        if !self.once.insert(key) {
            return false;
        }
        self.warn(message);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.emitted.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Notice> {
        self.emitted
            .iter()
            .filter(|n| n.level == NoticeLevel::Warning)
    }

    /// Number of notices containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.emitted
            .iter()
            .filter(|n| n.message.contains(needle))
            .count()
    }

    pub fn len(&self) -> usize {
        self.emitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitted.is_empty()
    }
}
