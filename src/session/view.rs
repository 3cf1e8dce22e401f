//! Presentation-neutral snapshot of the session, handed to whichever front end is attached.

use super::history::HISTORY_CAPACITY;
use crate::model::{ArchivalRecord, Phase};
use std::path::PathBuf;

/// Shown in place of history slots that have not been filled yet.
pub const PLACEHOLDER_LINE: &str = "..............................";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Loading,
    Selecting,
    Archiving,
    Completed,
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub current: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: Phase,
    pub status: Status,
    pub root: PathBuf,
    pub destination: PathBuf,
    /// Selectable rows; empty outside the selecting phase.
    pub rows: Vec<RowView>,
    pub progress: Option<Progress>,
    pub history: Vec<ArchivalRecord>,
    /// Transient message from the controller (e.g. a slow move).
    pub notice: Option<String>,
}

impl SessionView {
    pub fn selected_count(&self) -> usize {
        self.rows.iter().filter(|r| r.selected).count()
    }

    pub fn status_line(&self) -> String {
        match &self.status {
            Status::Loading => format!("Loading projects from {}…", self.root.display()),
            Status::Selecting => format!(
                "Select projects to archive ({} selected)",
                self.selected_count()
            ),
            Status::Archiving => "Archiving projects...".to_string(),
            Status::Completed => "✓ Archiving completed!".to_string(),
            Status::Cancelled => "Archiving cancelled".to_string(),
            Status::Failed(msg) => format!("Archiving failed: {msg}"),
        }
    }

    pub fn progress_line(&self) -> Option<String> {
        let p = self.progress.as_ref()?;
        let mut line = format!("{}/{} archived", p.done, p.total);
        if let Some(current) = &p.current {
            line.push_str(&format!(" · moving {current}"));
        }
        Some(line)
    }

    /// Always five lines; unfilled slots sit above the records so new moves appear at the bottom.
    pub fn history_lines(&self) -> Vec<String> {
        let pad = HISTORY_CAPACITY.saturating_sub(self.history.len());
        std::iter::repeat(PLACEHOLDER_LINE.to_string())
            .take(pad)
            .chain(self.history.iter().map(ToString::to_string))
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            Status::Completed | Status::Cancelled | Status::Failed(_)
        )
    }
}
