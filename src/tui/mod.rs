mod help;
mod state;
mod theme;

use crate::engine::Filesystem;
use crate::model::{ArchiveConfig, Phase};
use crate::orchestrator::{self, ControllerOptions, UiCommand};
use crate::session::{SessionView, Status, PLACEHOLDER_LINE};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Terminal,
};
use state::UiState;
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use theme::{Theme, UiConfig};

pub async fn run(cfg: ArchiveConfig, fs: Arc<dyn Filesystem>) -> Result<()> {
    let (view_tx, view_rx) = mpsc::unbounded_channel::<SessionView>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_config = UiConfig::default();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_config, view_rx, cmd_tx));

    let opts = ControllerOptions {
        exit_on_done: false,
        handle_ctrl_c: false,
    };
    let res = orchestrator::run_controller(&cfg, fs, cmd_rx, view_tx, opts).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    let summary = res?;
    println!("{}", crate::cli::final_status_line(&cfg, &summary));
    Ok(())
}

/// Run the TUI loop on a dedicated thread. Returns once the user quits or the
/// controller stops publishing.
pub fn run_threaded(
    ui: UiConfig,
    mut view_rx: UnboundedReceiver<SessionView>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend).context("create terminal") {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e);
        }
    };
    terminal.clear().ok();

    let mut state = UiState::default();
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain snapshots without blocking; only the newest one matters for drawing.
        let mut disconnected = false;
        loop {
            match view_rx.try_recv() {
                Ok(view) => state.apply_view(view),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            break Ok(());
        }

        if last_tick.elapsed() >= ui.tick_rate {
            state.tick();
            terminal.draw(|f| draw(f.area(), f, &state, &ui)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                let Some(action) = ui.keymap.action(k) else {
                    continue;
                };
                match state.handle(action, ui.page_size) {
                    Some(UiCommand::Quit) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    Some(cmd) => {
                        let _ = cmd_tx.send(cmd);
                    }
                    None => {}
                }
            }
        }
    };

    restore_terminal();
    res
}

fn restore_terminal() {
    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, ui: &UiConfig) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let theme = &ui.theme;
    let status = state
        .view
        .as_ref()
        .map(|v| v.status_line())
        .unwrap_or_else(|| "Loading projects…".to_string());
    let status_style = match state.view.as_ref().map(|v| &v.status) {
        Some(Status::Completed) => Style::default().fg(theme.ok),
        Some(Status::Failed(_)) => Style::default().fg(theme.error),
        Some(Status::Cancelled) => Style::default().fg(theme.warn),
        _ => Style::default(),
    };
    let header = Paragraph::new(Line::from(Span::styled(status, status_style))).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled("arpo", Style::default().fg(theme.accent))),
    );
    f.render_widget(header, chunks[0]);

    match (&state.view, state.phase()) {
        (Some(view), Phase::Selecting) => draw_selecting(chunks[1], f, state, view, theme),
        (Some(view), Phase::Archiving) => draw_archiving(chunks[1], f, state, view, theme),
        _ => {
            let p = Paragraph::new(format!("{} Reading directory…", state.spinner_frame()))
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(p, chunks[1]);
        }
    }

    f.render_widget(
        Paragraph::new(footer_hint(state)).style(Style::default().fg(theme.muted)),
        chunks[2],
    );

    if state.show_help {
        help::draw_help(centered(area, 56, 16), f, theme);
    }
}

fn footer_hint(state: &UiState) -> &'static str {
    let finished = state.view.as_ref().is_some_and(|v| v.is_finished());
    match state.phase() {
        _ if finished => "Done! q: quit",
        Phase::Selecting => "space: mark  enter: archive  ?: help  q: quit",
        Phase::Archiving => "q: stop after the current move  ?: help",
        Phase::Loading => "q: quit",
    }
}

fn draw_selecting(
    area: Rect,
    f: &mut ratatui::Frame,
    state: &UiState,
    view: &SessionView,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", view.root.display()));

    if view.rows.is_empty() {
        let p = Paragraph::new(vec![
            Line::from("No projects found."),
            Line::from(Span::styled(
                "Press enter to finish or q to quit.",
                Style::default().fg(theme.muted),
            )),
        ])
        .block(block);
        f.render_widget(p, area);
        return;
    }

    let items: Vec<ListItem> = view
        .rows
        .iter()
        .map(|row| {
            let (mark, style) = if row.selected {
                ("[✓] ", Style::default().fg(theme.marked))
            } else {
                ("[ ] ", Style::default())
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, style),
                Span::styled(row.name.clone(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_symbol("> ")
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        );
    let mut list_state = ListState::default().with_selected(Some(state.cursor));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_archiving(
    area: Rect,
    f: &mut ratatui::Frame,
    state: &UiState,
    view: &SessionView,
    theme: &Theme,
) {
    let mut lines = Vec::new();
    if let Some(progress) = view.progress_line() {
        let lead = if view.is_finished() {
            "  ".to_string()
        } else {
            format!("{} ", state.spinner_frame())
        };
        lines.push(Line::from(vec![
            Span::styled(lead, Style::default().fg(theme.accent)),
            Span::raw(progress),
        ]));
    }
    lines.push(Line::from(""));
    for entry in view.history_lines() {
        let style = if entry == PLACEHOLDER_LINE {
            Style::default().fg(theme.muted)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(entry, style)));
    }
    if let Some(notice) = &view.notice {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(theme.warn),
        )));
    }

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" → {} ", view.destination.display())),
    );
    f.render_widget(p, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}
