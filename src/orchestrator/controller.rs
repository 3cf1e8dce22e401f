//! Session controller.
//!
//! Owns the [`App`], runs the commands it emits on blocking worker tasks and
//! feeds their results back through a single serial message loop. Presentation
//! layers only ever see [`SessionView`] snapshots.

use crate::engine::{CatalogFilter, Filesystem, Mover, ProjectCatalog};
use crate::error::AppError;
use crate::model::{format_elapsed, ArchiveConfig, Command, Message, SessionSummary};
use crate::session::{App, SessionView};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Commands emitted by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiCommand {
    Toggle(usize),
    Commit,
    Quit,
}

impl From<UiCommand> for Message {
    fn from(cmd: UiCommand) -> Self {
        match cmd {
            UiCommand::Toggle(id) => Message::Toggle { id },
            UiCommand::Commit => Message::Commit,
            UiCommand::Quit => Message::Quit,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ControllerOptions {
    /// Stop as soon as the run completes instead of waiting for Quit.
    pub exit_on_done: bool,
    /// Treat Ctrl-C on the process as Quit (headless modes; the TUI reads it as a key).
    pub handle_ctrl_c: bool,
}

/// The move currently running, for the stall notice.
struct InFlight {
    index: usize,
    name: String,
    since: Instant,
    warned: bool,
}

/// Drive one session to its end and report what it did.
pub(crate) async fn run_controller(
    cfg: &ArchiveConfig,
    fs: Arc<dyn Filesystem>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
    view_tx: UnboundedSender<SessionView>,
    opts: ControllerOptions,
) -> Result<SessionSummary, AppError> {
    let mut app = App::new(cfg);
    let (task_tx, mut task_rx) = mpsc::unbounded_channel::<Message>();

    let mut in_flight: Option<InFlight> = None;
    let mut notice: Option<String> = None;
    let mut ui_open = true;

    // A move that never returns stalls the session; the watchdog only tells the user.
    let mut watchdog = tokio::time::interval(Duration::from_secs(1));

    let ctrl_c = async {
        if opts.handle_ctrl_c && tokio::signal::ctrl_c().await.is_ok() {
            return;
        }
        futures::future::pending::<()>().await
    };
    tokio::pin!(ctrl_c);
    let mut ctrl_c_seen = false;

    info!(root = %cfg.root.display(), destination = %cfg.destination.display(), "session started");
    for cmd in app.init() {
        dispatch(cmd, &fs, &task_tx);
    }
    publish(&app, &notice, &view_tx);

    loop {
        let msg = tokio::select! {
            cmd = cmd_rx.recv(), if ui_open => match cmd {
                Some(cmd) => Message::from(cmd),
                None => {
                    // UI went away; nobody is left to answer, so wind down.
                    ui_open = false;
                    Message::Quit
                }
            },
            Some(msg) = task_rx.recv() => msg,
            _ = &mut ctrl_c, if !ctrl_c_seen => {
                ctrl_c_seen = true;
                Message::Quit
            }
            _ = watchdog.tick() => {
                if check_stall(cfg.stall_notice, &mut in_flight, &mut notice) {
                    publish(&app, &notice, &view_tx);
                }
                continue;
            }
        };

        log_message(&msg, in_flight.as_ref());

        let mut exit = false;
        for cmd in app.reduce(msg) {
            match &cmd {
                Command::Exit => {
                    exit = true;
                    continue;
                }
                Command::Move { index, entry, .. } => {
                    info!(index, name = %entry.name, "moving");
                    in_flight = Some(InFlight {
                        index: *index,
                        name: entry.name.clone(),
                        since: Instant::now(),
                        warned: false,
                    });
                    notice = None;
                }
                Command::LoadCatalog { .. } => {}
            }
            dispatch(cmd, &fs, &task_tx);
        }
        if app.in_flight().is_none() {
            in_flight = None;
            notice = None;
        }
        publish(&app, &notice, &view_tx);

        if exit || (opts.exit_on_done && app.is_finished()) {
            break;
        }
    }

    if let Some(err) = app.take_failure() {
        error!(error = %err, "session failed");
        return Err(err);
    }
    let summary = app.summary();
    info!(
        outcome = ?summary.outcome,
        archived = summary.archived.len(),
        selected = summary.selected,
        "session finished"
    );
    Ok(summary)
}

fn publish(app: &App, notice: &Option<String>, view_tx: &UnboundedSender<SessionView>) {
    let mut view = app.view();
    view.notice = notice.clone();
    // A closed view channel only means nobody is watching.
    let _ = view_tx.send(view);
}

/// Refresh the stall notice. Returns true when the view needs republishing.
fn check_stall(
    threshold: Duration,
    in_flight: &mut Option<InFlight>,
    notice: &mut Option<String>,
) -> bool {
    let Some(current) = in_flight.as_mut() else {
        return false;
    };
    if threshold.is_zero() {
        return false;
    }
    let elapsed = current.since.elapsed();
    if elapsed < threshold {
        return false;
    }
    if !current.warned {
        warn!(index = current.index, name = %current.name, elapsed = %format_elapsed(elapsed), "move is taking a long time");
        current.warned = true;
    }
    *notice = Some(format!(
        "Still moving {} ({})…",
        current.name,
        format_elapsed(Duration::from_secs(elapsed.as_secs()))
    ));
    true
}

fn log_message(msg: &Message, in_flight: Option<&InFlight>) {
    match msg {
        Message::CatalogLoaded(entries) => info!(count = entries.len(), "catalog loaded"),
        Message::CatalogFailed(err) => error!(error = %err, "catalog load failed"),
        Message::MoveCompleted { index, elapsed } => {
            let name = in_flight
                .filter(|f| f.index == *index)
                .map(|f| f.name.as_str())
                .unwrap_or("?");
            info!(index, name, elapsed = %format_elapsed(*elapsed), "move finished");
        }
        Message::MoveFailed { index, error } => error!(index, %error, "move failed"),
        Message::TaskFailed(reason) => error!(reason, "worker task failed"),
        Message::Quit => info!("quit requested"),
        other => debug!(kind = other.kind(), "ui event"),
    }
}

/// Run a command off the loop; its result comes back as a message.
fn dispatch(cmd: Command, fs: &Arc<dyn Filesystem>, task_tx: &UnboundedSender<Message>) {
    let fs = Arc::clone(fs);
    match cmd {
        Command::LoadCatalog {
            root,
            exclude,
            include_hidden,
        } => spawn_worker(task_tx.clone(), move || {
            let filter = CatalogFilter {
                exclude,
                include_hidden,
            };
            match ProjectCatalog::load(fs.as_ref(), &root, &filter) {
                Ok(entries) => Message::CatalogLoaded(entries),
                Err(err) => Message::CatalogFailed(err),
            }
        }),
        Command::Move {
            index,
            entry,
            destination,
        } => spawn_worker(task_tx.clone(), move || {
            match Mover::relocate(fs.as_ref(), &entry, &destination) {
                Ok(elapsed) => Message::MoveCompleted { index, elapsed },
                Err(error) => Message::MoveFailed { index, error },
            }
        }),
        Command::Exit => {}
    }
}

fn spawn_worker<F>(task_tx: UnboundedSender<Message>, work: F)
where
    F: FnOnce() -> Message + Send + 'static,
{
    tokio::spawn(async move {
        let msg = match tokio::task::spawn_blocking(work).await {
            Ok(msg) => msg,
            Err(e) => Message::TaskFailed(format!("{e}")),
        };
        let _ = task_tx.send(msg);
    });
}
