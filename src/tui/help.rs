use super::theme::Theme;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn keybind(keys: &'static str, what: &'static str, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{keys:<14}"), Style::default().fg(theme.key)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, theme: &Theme) {
    let p = Paragraph::new(vec![
        Line::from("Selecting:"),
        keybind("↑/↓ j/k w/s", "Move", theme),
        keybind("PgUp/PgDn", "Move a page", theme),
        keybind("g/G", "First / last", theme),
        keybind("space", "Mark or unmark", theme),
        keybind("enter", "Archive marked projects", theme),
        Line::from(""),
        Line::from("Anywhere:"),
        keybind("?", "Show this help", theme),
        keybind("q / Ctrl-C", "Quit (stops after the current move)", theme),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(theme.muted),
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
