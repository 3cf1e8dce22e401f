use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Color;

/// Colours used across the screens.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    pub key: Color,
    pub marked: Color,
    pub muted: Color,
    pub ok: Color,
    pub warn: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            key: Color::Magenta,
            marked: Color::Green,
            muted: Color::DarkGray,
            ok: Color::Green,
            warn: Color::Yellow,
            error: Color::Red,
        }
    }
}

/// What a key press means to the UI, before it becomes a controller command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    PageUp,
    PageDown,
    First,
    Last,
    Toggle,
    Commit,
    Help,
    Quit,
}

#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: Vec<(KeyCode, Action)>,
}

impl Default for Keymap {
    fn default() -> Self {
        use Action::*;
        Self {
            bindings: vec![
                (KeyCode::Up, Up),
                (KeyCode::Char('k'), Up),
                (KeyCode::Char('w'), Up),
                (KeyCode::Down, Down),
                (KeyCode::Char('j'), Down),
                (KeyCode::Char('s'), Down),
                (KeyCode::PageUp, PageUp),
                (KeyCode::PageDown, PageDown),
                (KeyCode::Home, First),
                (KeyCode::Char('g'), First),
                (KeyCode::End, Last),
                (KeyCode::Char('G'), Last),
                (KeyCode::Char(' '), Toggle),
                (KeyCode::Enter, Commit),
                (KeyCode::Char('?'), Help),
                (KeyCode::Char('q'), Quit),
                (KeyCode::Esc, Quit),
            ],
        }
    }
}

impl Keymap {
    pub fn action(&self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return (key.code == KeyCode::Char('c')).then_some(Action::Quit);
        }
        self.bindings
            .iter()
            .find(|(code, _)| *code == key.code)
            .map(|(_, action)| *action)
    }
}

/// Presentation settings handed to the TUI thread.
#[derive(Debug, Clone)]
pub struct UiConfig {
    pub theme: Theme,
    pub keymap: Keymap,
    /// Rows skipped by PageUp/PageDown.
    pub page_size: usize,
    pub tick_rate: std::time::Duration,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            keymap: Keymap::default(),
            page_size: 10,
            tick_rate: std::time::Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn vim_and_wasd_keys_move_the_cursor() {
        let keys = Keymap::default();
        assert_eq!(keys.action(press(KeyCode::Char('j'))), Some(Action::Down));
        assert_eq!(keys.action(press(KeyCode::Char('s'))), Some(Action::Down));
        assert_eq!(keys.action(press(KeyCode::Char('w'))), Some(Action::Up));
        assert_eq!(keys.action(press(KeyCode::Up)), Some(Action::Up));
    }

    #[test]
    fn space_toggles_and_enter_commits() {
        let keys = Keymap::default();
        assert_eq!(keys.action(press(KeyCode::Char(' '))), Some(Action::Toggle));
        assert_eq!(keys.action(press(KeyCode::Enter)), Some(Action::Commit));
        assert_eq!(keys.action(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn ctrl_c_quits_but_ctrl_s_does_nothing() {
        let keys = Keymap::default();
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(keys.action(ctrl('c')), Some(Action::Quit));
        assert_eq!(keys.action(ctrl('s')), None);
    }
}
