use crate::error::{CatalogLoadError, MoveError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Settings for one archiving session, built from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    pub root: PathBuf,
    pub destination: PathBuf,
    pub include_hidden: bool,
    #[serde(with = "humantime_serde")]
    pub stall_notice: Duration,
}

/// One candidate directory. Shared by reference between catalog, selection and pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub source_path: PathBuf,
}

impl Entry {
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
        }
    }
}

/// Result of one completed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivalRecord {
    pub entry: Arc<Entry>,
    pub elapsed: Duration,
}

impl fmt::Display for ArchivalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "📦 Moved {} {}",
            self.entry.name,
            format_elapsed(self.elapsed)
        )
    }
}

/// Render a duration at millisecond resolution ("1s 250ms").
pub fn format_elapsed(d: Duration) -> String {
    let ms = Duration::from_millis(d.as_millis() as u64);
    if ms.is_zero() {
        return "<1ms".to_string();
    }
    humantime::format_duration(ms).to_string()
}

/// Top-level mode of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Loading,
    Selecting,
    Archiving,
}

/// Input to the session reducer: user events and worker completions share one queue.
#[derive(Debug)]
pub enum Message {
    CatalogLoaded(Vec<Arc<Entry>>),
    CatalogFailed(CatalogLoadError),
    Toggle { id: usize },
    Commit,
    Quit,
    MoveCompleted { index: usize, elapsed: Duration },
    MoveFailed { index: usize, error: MoveError },
    TaskFailed(String),
}

impl Message {
    /// Short label for logs; avoids dumping whole catalogs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::CatalogLoaded(_) => "catalog_loaded",
            Message::CatalogFailed(_) => "catalog_failed",
            Message::Toggle { .. } => "toggle",
            Message::Commit => "commit",
            Message::Quit => "quit",
            Message::MoveCompleted { .. } => "move_completed",
            Message::MoveFailed { .. } => "move_failed",
            Message::TaskFailed(_) => "task_failed",
        }
    }
}

/// Work requested by the reducer; executed by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoadCatalog {
        root: PathBuf,
        exclude: Option<PathBuf>,
        include_hidden: bool,
    },
    Move {
        index: usize,
        entry: Arc<Entry>,
        destination: PathBuf,
    },
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// What the session accomplished, handed back when the controller stops.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub outcome: Outcome,
    pub selected: usize,
    pub archived: Vec<String>,
    pub total_elapsed: Duration,
}

/// Machine-readable session report for `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveReport {
    pub finished_utc: String,
    pub root: PathBuf,
    pub destination: PathBuf,
    pub outcome: Outcome,
    pub selected: usize,
    pub archived: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub total_elapsed: Duration,
}

impl ArchiveReport {
    pub fn new(cfg: &ArchiveConfig, summary: &SessionSummary) -> Self {
        Self {
            finished_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            root: cfg.root.clone(),
            destination: cfg.destination.clone(),
            outcome: summary.outcome,
            selected: summary.selected,
            archived: summary.archived.clone(),
            total_elapsed: summary.total_elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_display_rounds_to_millis() {
        let rec = ArchivalRecord {
            entry: Arc::new(Entry::new("alpha", "/dev/alpha")),
            elapsed: Duration::from_micros(1_250_400),
        };
        assert_eq!(rec.to_string(), "📦 Moved alpha 1s 250ms");
    }

    #[test]
    fn sub_millisecond_moves_are_not_shown_as_zero() {
        assert_eq!(format_elapsed(Duration::from_micros(300)), "<1ms");
    }

    #[test]
    fn report_serializes_durations_as_text() {
        let cfg = ArchiveConfig {
            root: PathBuf::from("/dev"),
            destination: PathBuf::from("/dev/arpo"),
            include_hidden: false,
            stall_notice: Duration::from_secs(30),
        };
        let summary = SessionSummary {
            outcome: Outcome::Completed,
            selected: 2,
            archived: vec!["a".into(), "c".into()],
            total_elapsed: Duration::from_millis(1500),
        };
        let json = serde_json::to_value(ArchiveReport::new(&cfg, &summary)).unwrap();
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["total_elapsed"], "1s 500ms");
        assert_eq!(json["archived"][1], "c");
    }
}
