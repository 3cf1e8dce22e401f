use super::theme::Action;
use crate::model::Phase;
use crate::orchestrator::UiCommand;
use crate::session::SessionView;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// UI-thread-only state: the latest snapshot plus purely visual bits.
#[derive(Debug, Default)]
pub struct UiState {
    pub view: Option<SessionView>,
    pub cursor: usize,
    pub show_help: bool,
    spinner: usize,
}

impl UiState {
    pub fn apply_view(&mut self, view: SessionView) {
        self.cursor = self.cursor.min(view.rows.len().saturating_sub(1));
        self.view = Some(view);
    }

    pub fn phase(&self) -> Phase {
        self.view.as_ref().map(|v| v.phase).unwrap_or(Phase::Loading)
    }

    fn row_count(&self) -> usize {
        self.view.as_ref().map(|v| v.rows.len()).unwrap_or(0)
    }

    fn move_cursor(&mut self, delta: isize) {
        let last = self.row_count().saturating_sub(1);
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    pub fn tick(&mut self) {
        self.spinner = (self.spinner + 1) % SPINNER.len();
    }

    pub fn spinner_frame(&self) -> &'static str {
        SPINNER[self.spinner]
    }

    /// Apply a key action locally and return the command to forward, if any.
    pub fn handle(&mut self, action: Action, page_size: usize) -> Option<UiCommand> {
        if self.show_help {
            match action {
                Action::Quit => return Some(UiCommand::Quit),
                _ => {
                    self.show_help = false;
                    return None;
                }
            }
        }

        let page = page_size.max(1) as isize;
        let selecting = self.phase() == Phase::Selecting;
        match action {
            Action::Quit => Some(UiCommand::Quit),
            Action::Help => {
                self.show_help = true;
                None
            }
            Action::Up if selecting => {
                self.move_cursor(-1);
                None
            }
            Action::Down if selecting => {
                self.move_cursor(1);
                None
            }
            Action::PageUp if selecting => {
                self.move_cursor(-page);
                None
            }
            Action::PageDown if selecting => {
                self.move_cursor(page);
                None
            }
            Action::First if selecting => {
                self.cursor = 0;
                None
            }
            Action::Last if selecting => {
                self.cursor = self.row_count().saturating_sub(1);
                None
            }
            Action::Toggle if selecting && self.row_count() > 0 => {
                Some(UiCommand::Toggle(self.cursor))
            }
            Action::Commit if selecting => Some(UiCommand::Commit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{RowView, Status};
    use std::path::PathBuf;

    fn selecting(n: usize) -> SessionView {
        SessionView {
            phase: Phase::Selecting,
            status: Status::Selecting,
            root: PathBuf::from("/dev"),
            destination: PathBuf::from("/dev/arpo"),
            rows: (0..n)
                .map(|i| RowView {
                    name: format!("p{i}"),
                    selected: false,
                })
                .collect(),
            progress: None,
            history: Vec::new(),
            notice: None,
        }
    }

    #[test]
    fn cursor_stays_within_rows() {
        let mut st = UiState::default();
        st.apply_view(selecting(3));
        assert_eq!(st.handle(Action::Up, 10), None);
        assert_eq!(st.cursor, 0);
        st.handle(Action::PageDown, 10);
        assert_eq!(st.cursor, 2);
        st.handle(Action::Up, 10);
        assert_eq!(st.cursor, 1);
    }

    #[test]
    fn toggle_targets_the_row_under_the_cursor() {
        let mut st = UiState::default();
        st.apply_view(selecting(4));
        st.handle(Action::Down, 10);
        st.handle(Action::Down, 10);
        assert_eq!(st.handle(Action::Toggle, 10), Some(UiCommand::Toggle(2)));
        assert_eq!(st.handle(Action::Commit, 10), Some(UiCommand::Commit));
    }

    #[test]
    fn selection_keys_are_inert_outside_selecting() {
        let mut st = UiState::default();
        assert_eq!(st.handle(Action::Toggle, 10), None);
        let mut view = selecting(0);
        view.phase = Phase::Archiving;
        view.status = Status::Archiving;
        st.apply_view(view);
        assert_eq!(st.handle(Action::Commit, 10), None);
        assert_eq!(st.handle(Action::Quit, 10), Some(UiCommand::Quit));
    }

    #[test]
    fn help_swallows_the_next_key_except_quit() {
        let mut st = UiState::default();
        st.apply_view(selecting(2));
        st.handle(Action::Help, 10);
        assert!(st.show_help);
        assert_eq!(st.handle(Action::Toggle, 10), None);
        assert!(!st.show_help);
        st.handle(Action::Help, 10);
        assert_eq!(st.handle(Action::Quit, 10), Some(UiCommand::Quit));
    }

    #[test]
    fn shrinking_catalog_clamps_cursor() {
        let mut st = UiState::default();
        st.apply_view(selecting(5));
        st.handle(Action::Last, 10);
        assert_eq!(st.cursor, 4);
        st.apply_view(selecting(2));
        assert_eq!(st.cursor, 1);
    }
}
