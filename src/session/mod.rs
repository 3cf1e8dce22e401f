//! The archiving session as a pure state machine.
//!
//! [`App::reduce`] takes one [`Message`] at a time and answers with the
//! [`Command`]s the caller must run. It never performs I/O itself; the
//! orchestrator feeds worker results back in as further messages.

mod history;
mod pipeline;
mod selection;
mod view;

pub use pipeline::{MoveRequest, Pipeline, PipelineState};
pub use selection::Selection;
pub use view::{Progress, RowView, SessionView, Status, PLACEHOLDER_LINE};

use crate::error::AppError;
use crate::model::{ArchiveConfig, Command, Entry, Message, Outcome, Phase, SessionSummary};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
enum Stage {
    Loading,
    Selecting(Selection),
    Archiving(Pipeline),
}

#[derive(Debug)]
pub struct App {
    root: PathBuf,
    destination: PathBuf,
    include_hidden: bool,
    stage: Stage,
    /// Quit arrived before archiving started.
    cancelled: bool,
    failure: Option<AppError>,
}

impl App {
    pub fn new(cfg: &ArchiveConfig) -> Self {
        Self {
            root: cfg.root.clone(),
            destination: cfg.destination.clone(),
            include_hidden: cfg.include_hidden,
            stage: Stage::Loading,
            cancelled: false,
            failure: None,
        }
    }

    /// Commands to run when the session starts.
    pub fn init(&self) -> Vec<Command> {
        vec![Command::LoadCatalog {
            root: self.root.clone(),
            exclude: Some(self.destination.clone()),
            include_hidden: self.include_hidden,
        }]
    }

    pub fn reduce(&mut self, msg: Message) -> Vec<Command> {
        if self.is_finished() {
            if let Message::Quit = msg {
                return vec![Command::Exit];
            }
            debug!(kind = msg.kind(), "session finished; message ignored");
            return Vec::new();
        }

        match msg {
            Message::Quit => {
                match &mut self.stage {
                    Stage::Archiving(pipeline) => {
                        pipeline.cancel();
                    }
                    _ => self.cancelled = true,
                }
                vec![Command::Exit]
            }
            Message::CatalogLoaded(entries) => {
                if let Stage::Loading = self.stage {
                    self.stage = Stage::Selecting(Selection::new(entries));
                }
                Vec::new()
            }
            Message::CatalogFailed(err) => {
                self.failure = Some(err.into());
                vec![Command::Exit]
            }
            Message::Toggle { id } => {
                if let Stage::Selecting(selection) = &mut self.stage {
                    selection.toggle_row(id);
                }
                Vec::new()
            }
            Message::Commit => self.commit(),
            Message::MoveCompleted { index, elapsed } => {
                let Stage::Archiving(pipeline) = &mut self.stage else {
                    return Vec::new();
                };
                match pipeline.complete(index, elapsed) {
                    Ok(next) => next.map(|req| self.move_command(req)).into_iter().collect(),
                    Err(violation) => {
                        debug!(%violation, "dropping stale completion");
                        Vec::new()
                    }
                }
            }
            Message::MoveFailed { index, error } => {
                let Stage::Archiving(pipeline) = &mut self.stage else {
                    return Vec::new();
                };
                match pipeline.fail(index) {
                    Ok(entry) => {
                        self.failure = Some(AppError::Move {
                            name: entry.name.clone(),
                            source: error,
                        });
                        vec![Command::Exit]
                    }
                    Err(violation) => {
                        debug!(%violation, %error, "dropping stale failure");
                        Vec::new()
                    }
                }
            }
            Message::TaskFailed(reason) => {
                self.failure = Some(AppError::Task(reason));
                vec![Command::Exit]
            }
        }
    }

    fn commit(&mut self) -> Vec<Command> {
        let selection = match std::mem::replace(&mut self.stage, Stage::Loading) {
            Stage::Selecting(selection) => selection,
            other => {
                self.stage = other;
                return Vec::new();
            }
        };
        let mut pipeline = Pipeline::new(selection.commit());
        let first = pipeline.start();
        self.stage = Stage::Archiving(pipeline);
        first.map(|req| self.move_command(req)).into_iter().collect()
    }

    fn move_command(&self, req: MoveRequest) -> Command {
        Command::Move {
            index: req.index,
            entry: req.entry,
            destination: self.destination.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        match self.stage {
            Stage::Loading => Phase::Loading,
            Stage::Selecting(_) => Phase::Selecting,
            Stage::Archiving(_) => Phase::Archiving,
        }
    }

    /// True once nothing further will happen: completed, cancelled, or failed.
    pub fn is_finished(&self) -> bool {
        if self.failure.is_some() || self.cancelled {
            return true;
        }
        matches!(&self.stage, Stage::Archiving(p) if p.is_finished())
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        match &self.stage {
            Stage::Archiving(p) => Some(p),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match &self.stage {
            Stage::Selecting(s) => Some(s),
            _ => None,
        }
    }

    /// The move currently awaiting its completion event.
    pub fn in_flight(&self) -> Option<(usize, &Arc<Entry>)> {
        let pipeline = self.pipeline()?;
        match pipeline.state() {
            PipelineState::InFlight(i) => pipeline.in_flight().map(|e| (i, e)),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn failure(&self) -> Option<&AppError> {
        self.failure.as_ref()
    }

    pub fn take_failure(&mut self) -> Option<AppError> {
        self.failure.take()
    }

    pub fn status(&self) -> Status {
        if let Some(err) = &self.failure {
            return Status::Failed(err.chain_message());
        }
        if self.cancelled {
            return Status::Cancelled;
        }
        match &self.stage {
            Stage::Loading => Status::Loading,
            Stage::Selecting(_) => Status::Selecting,
            Stage::Archiving(p) => match p.state() {
                PipelineState::Completed => Status::Completed,
                PipelineState::Cancelled => Status::Cancelled,
                _ => Status::Archiving,
            },
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let outcome = match self.status() {
            Status::Completed => Outcome::Completed,
            _ => Outcome::Cancelled,
        };
        match self.pipeline() {
            Some(p) => SessionSummary {
                outcome,
                selected: p.len(),
                archived: p.archived().iter().map(|e| e.name.clone()).collect(),
                total_elapsed: p.total_elapsed(),
            },
            None => SessionSummary {
                outcome,
                selected: self.selection().map_or(0, Selection::marked_count),
                archived: Vec::new(),
                total_elapsed: Default::default(),
            },
        }
    }

    pub fn view(&self) -> SessionView {
        let rows = self
            .selection()
            .map(|s| {
                s.entries()
                    .iter()
                    .map(|e| RowView {
                        name: e.name.clone(),
                        selected: s.is_marked(&e.name),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (progress, history) = match self.pipeline() {
            Some(p) => (
                Some(Progress {
                    done: p.done(),
                    total: p.len(),
                    current: p.in_flight().map(|e| e.name.clone()),
                }),
                p.history().iter().cloned().collect(),
            ),
            None => (None, Vec::new()),
        };

        SessionView {
            phase: self.phase(),
            status: self.status(),
            root: self.root.clone(),
            destination: self.destination.clone(),
            rows,
            progress,
            history,
            notice: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CatalogLoadError, MoveError};
    use crate::session::history::HISTORY_CAPACITY;
    use std::io;
    use std::time::Duration;

    fn config() -> ArchiveConfig {
        ArchiveConfig {
            root: PathBuf::from("/dev"),
            destination: PathBuf::from("/dev/arpo"),
            include_hidden: false,
            stall_notice: Duration::from_secs(30),
        }
    }

    fn catalog(names: &[&str]) -> Vec<Arc<Entry>> {
        names
            .iter()
            .map(|n| Arc::new(Entry::new(*n, format!("/dev/{n}"))))
            .collect()
    }

    fn selecting(names: &[&str]) -> App {
        let mut app = App::new(&config());
        assert!(app.reduce(Message::CatalogLoaded(catalog(names))).is_empty());
        assert_eq!(app.phase(), Phase::Selecting);
        app
    }

    fn moves(cmds: &[Command]) -> Vec<(usize, String)> {
        cmds.iter()
            .filter_map(|c| match c {
                Command::Move { index, entry, .. } => Some((*index, entry.name.clone())),
                _ => None,
            })
            .collect()
    }

    fn done(index: usize) -> Message {
        Message::MoveCompleted {
            index,
            elapsed: Duration::from_millis(10 + index as u64),
        }
    }

    #[test]
    fn init_requests_catalog_excluding_destination() {
        let app = App::new(&config());
        assert_eq!(
            app.init(),
            vec![Command::LoadCatalog {
                root: PathBuf::from("/dev"),
                exclude: Some(PathBuf::from("/dev/arpo")),
                include_hidden: false,
            }]
        );
        assert_eq!(app.status(), Status::Loading);
    }

    #[test]
    fn archives_selected_entries_one_at_a_time() {
        let mut app = selecting(&["A", "B", "C"]);
        app.reduce(Message::Toggle { id: 2 });
        app.reduce(Message::Toggle { id: 0 });

        let cmds = app.reduce(Message::Commit);
        assert_eq!(moves(&cmds), vec![(0, "A".to_string())]);
        assert_eq!(
            cmds[0],
            Command::Move {
                index: 0,
                entry: Arc::new(Entry::new("A", "/dev/A")),
                destination: PathBuf::from("/dev/arpo"),
            }
        );
        assert_eq!(app.phase(), Phase::Archiving);

        let cmds = app.reduce(done(0));
        assert_eq!(moves(&cmds), vec![(1, "C".to_string())]);

        let cmds = app.reduce(done(1));
        assert!(cmds.is_empty());
        assert_eq!(app.status(), Status::Completed);
        assert!(app.is_finished());

        let view = app.view();
        let names: Vec<_> = view.history.iter().map(|r| r.entry.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(app.summary().archived, vec!["A", "C"]);
        assert_eq!(app.summary().outcome, Outcome::Completed);
    }

    #[test]
    fn empty_commit_completes_without_moving() {
        let mut app = selecting(&["A", "B"]);
        let cmds = app.reduce(Message::Commit);
        assert!(cmds.is_empty());
        assert_eq!(app.phase(), Phase::Archiving);
        assert_eq!(app.status(), Status::Completed);
        assert_eq!(app.summary().selected, 0);
    }

    #[test]
    fn quit_while_selecting_cancels_without_moves() {
        let mut app = selecting(&["A"]);
        app.reduce(Message::Toggle { id: 0 });
        assert_eq!(app.reduce(Message::Quit), vec![Command::Exit]);
        assert_eq!(app.status(), Status::Cancelled);

        // the session is over; a late commit must not start archiving
        assert!(app.reduce(Message::Commit).is_empty());
        assert_eq!(app.phase(), Phase::Selecting);
        assert_eq!(app.summary().outcome, Outcome::Cancelled);
    }

    #[test]
    fn quit_while_loading_ignores_late_catalog() {
        let mut app = App::new(&config());
        assert_eq!(app.reduce(Message::Quit), vec![Command::Exit]);
        app.reduce(Message::CatalogLoaded(catalog(&["A"])));
        assert_eq!(app.phase(), Phase::Loading);
        assert_eq!(app.status(), Status::Cancelled);
    }

    #[test]
    fn stale_completion_leaves_state_unchanged() {
        let mut app = selecting(&["A", "B", "C"]);
        for id in 0..3 {
            app.reduce(Message::Toggle { id });
        }
        app.reduce(Message::Commit);
        app.reduce(done(0));
        let before = app.view();

        assert!(app.reduce(done(0)).is_empty());
        assert!(app.reduce(done(2)).is_empty());

        assert_eq!(app.view(), before);
        assert_eq!(app.in_flight().map(|(i, _)| i), Some(1));
    }

    #[test]
    fn quit_during_archiving_drops_the_in_flight_result() {
        let mut app = selecting(&["A", "B"]);
        app.reduce(Message::Toggle { id: 0 });
        app.reduce(Message::Toggle { id: 1 });
        app.reduce(Message::Commit);

        assert_eq!(app.reduce(Message::Quit), vec![Command::Exit]);
        assert!(app.reduce(done(0)).is_empty());

        assert_eq!(app.status(), Status::Cancelled);
        assert!(app.view().history.is_empty());
        assert!(app.summary().archived.is_empty());
    }

    #[test]
    fn move_failure_is_fatal_and_stops_the_run() {
        let mut app = selecting(&["A", "B", "C"]);
        for id in 0..3 {
            app.reduce(Message::Toggle { id });
        }
        app.reduce(Message::Commit);
        app.reduce(done(0));

        let cmds = app.reduce(Message::MoveFailed {
            index: 1,
            error: MoveError::SourceMissing(PathBuf::from("/dev/B")),
        });
        assert_eq!(cmds, vec![Command::Exit]);
        assert!(matches!(app.failure(), Some(AppError::Move { name, .. }) if name == "B"));

        // nothing for index 2 is ever requested, even if events keep arriving
        assert!(moves(&app.reduce(done(1))).is_empty());
        assert_eq!(
            app.status(),
            Status::Failed("failed to archive B: /dev/B no longer exists".into())
        );
        assert!(app.take_failure().is_some());
    }

    #[test]
    fn catalog_failure_is_fatal() {
        let mut app = App::new(&config());
        let cmds = app.reduce(Message::CatalogFailed(CatalogLoadError::Unreadable {
            path: PathBuf::from("/dev"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        }));
        assert_eq!(cmds, vec![Command::Exit]);
        assert!(matches!(app.failure(), Some(AppError::CatalogLoad(_))));
    }

    #[test]
    fn history_view_is_bounded_and_padded() {
        let names: Vec<String> = (0..7).map(|i| format!("p{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut app = selecting(&refs);
        for id in 0..7 {
            app.reduce(Message::Toggle { id });
        }
        app.reduce(Message::Commit);

        app.reduce(done(0));
        let lines = app.view().history_lines();
        assert_eq!(lines.len(), HISTORY_CAPACITY);
        assert_eq!(lines[0], PLACEHOLDER_LINE);
        assert!(lines[4].contains("p0"));

        for i in 1..7 {
            app.reduce(done(i));
            assert!(app.view().history.len() <= HISTORY_CAPACITY);
        }
        let view = app.view();
        let names: Vec<_> = view.history.iter().map(|r| r.entry.name.as_str()).collect();
        assert_eq!(names, vec!["p2", "p3", "p4", "p5", "p6"]);
        assert_eq!(
            view.progress,
            Some(Progress {
                done: 7,
                total: 7,
                current: None
            })
        );
    }

    #[test]
    fn selecting_view_reflects_marks() {
        let mut app = selecting(&["A", "B"]);
        app.reduce(Message::Toggle { id: 1 });
        let view = app.view();
        assert_eq!(
            view.rows,
            vec![
                RowView {
                    name: "A".into(),
                    selected: false
                },
                RowView {
                    name: "B".into(),
                    selected: true
                },
            ]
        );
        assert_eq!(view.status_line(), "Select projects to archive (1 selected)");
    }
}
