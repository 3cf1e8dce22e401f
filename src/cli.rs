use crate::engine::{CatalogFilter, Filesystem, LocalFs, ProjectCatalog};
use crate::model::{format_elapsed, ArchiveConfig, ArchiveReport, Outcome, Phase, SessionSummary};
use crate::orchestrator::{run_controller, ControllerOptions, UiCommand};
use crate::session::{RowView, SessionView};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "arpo",
    version,
    about = "Pick project directories and archive them one at a time"
)]
pub struct Cli {
    /// Directory whose immediate subdirectories are offered for archiving
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Where archived projects are moved [default: <ROOT>/arpo]
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Offer hidden (dot) directories too
    #[arg(long)]
    pub hidden: bool,

    /// Print the candidate directories and exit
    #[arg(long)]
    pub list: bool,

    /// Archive without the TUI, printing one line per moved project
    #[arg(long)]
    pub text: bool,

    /// Archive without the TUI and print a JSON report at the end
    #[arg(long)]
    pub json: bool,

    /// Projects to archive in --text/--json mode (comma separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Archive every candidate in --text/--json mode
    #[arg(long, conflicts_with = "select")]
    pub all: bool,

    /// Show a notice when a single move runs longer than this (0 disables)
    #[arg(long, default_value = "30s")]
    pub stall_notice: humantime::Duration,

    /// Log file [default: <state dir>/arpo/arpo.log]; filter with ARPO_LOG
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    fn is_headless(&self) -> bool {
        self.text || self.json
    }
}

pub async fn run(args: Cli) -> Result<()> {
    validate(&args)?;
    let cfg = build_config(&args)?;
    let fs: Arc<dyn Filesystem> = Arc::new(LocalFs);

    if args.list {
        return run_list(&args, &cfg, fs).await;
    }

    if !args.is_headless() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(cfg, fs).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_headless(&args, cfg, fs).await;
        }
    }

    run_headless(&args, cfg, fs).await
}

/// Reject flag combinations that cannot do anything useful.
fn validate(args: &Cli) -> Result<()> {
    if args.list {
        return Ok(());
    }
    let picks = !args.select.is_empty() || args.all;
    // Without the TUI the interactive mode is the text mode.
    let headless = args.is_headless() || !cfg!(feature = "tui");
    if picks && !headless {
        anyhow::bail!("--select and --all only apply to --text or --json mode");
    }
    if headless && !picks {
        anyhow::bail!("choose the projects to archive with --select <NAMES> or --all");
    }
    Ok(())
}

/// Absolute form of `path` with symlinks and `..` resolved as far as the
/// path exists; the missing tail is resolved lexically.
fn normalize_path(path: &Path) -> std::io::Result<PathBuf> {
    let abs = std::path::absolute(path)?;
    let parts: Vec<Component> = abs.components().collect();
    for split in (1..=parts.len()).rev() {
        let head: PathBuf = parts[..split].iter().collect();
        let Ok(mut resolved) = head.canonicalize() else {
            continue;
        };
        for part in &parts[split..] {
            match part {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::CurDir => {}
                other => resolved.push(other),
            }
        }
        return Ok(resolved);
    }
    Ok(abs)
}

/// Build an `ArchiveConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<ArchiveConfig> {
    let root = normalize_path(&args.root)
        .with_context(|| format!("cannot resolve project root {}", args.root.display()))?;
    let destination = match &args.dest {
        Some(dest) => normalize_path(dest)
            .with_context(|| format!("cannot resolve destination {}", dest.display()))?,
        None => root.join("arpo"),
    };
    if destination == root {
        return Err(anyhow::anyhow!(
            "destination {} is the project root itself",
            destination.display()
        ));
    }
    Ok(ArchiveConfig {
        root,
        destination,
        include_hidden: args.hidden,
        stall_notice: args.stall_notice.into(),
    })
}

/// One line describing how a finished session ended.
pub(crate) fn final_status_line(cfg: &ArchiveConfig, summary: &SessionSummary) -> String {
    match summary.outcome {
        Outcome::Completed => format!(
            "✓ Archiving completed: {} moved to {} in {}",
            summary.archived.len(),
            cfg.destination.display(),
            format_elapsed(summary.total_elapsed)
        ),
        Outcome::Cancelled if summary.archived.is_empty() => "Archiving cancelled".to_string(),
        Outcome::Cancelled => format!(
            "Archiving cancelled after {} of {} moved to {}",
            summary.archived.len(),
            summary.selected,
            cfg.destination.display()
        ),
    }
}

async fn run_list(args: &Cli, cfg: &ArchiveConfig, fs: Arc<dyn Filesystem>) -> Result<()> {
    let root = cfg.root.clone();
    let filter = CatalogFilter {
        exclude: Some(cfg.destination.clone()),
        include_hidden: cfg.include_hidden,
    };
    let entries = tokio::task::spawn_blocking(move || {
        ProjectCatalog::load(fs.as_ref(), &root, &filter)
    })
    .await
    .context("catalog task failed")?
    .context("failed to list projects")?;

    let (out_tx, out_handle) = spawn_output_writer();
    if args.json {
        let plain: Vec<_> = entries.iter().map(|e| e.as_ref()).collect();
        let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(&plain)?));
    } else {
        for e in &entries {
            let _ = out_tx.send(OutputLine::Stdout(e.name.clone()));
        }
    }
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

/// What to pick once the catalog is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Wanted {
    All,
    Names(Vec<String>),
}

impl Wanted {
    fn from_args(args: &Cli) -> Self {
        if args.all {
            Wanted::All
        } else {
            Wanted::Names(args.select.clone())
        }
    }
}

/// Map requested names onto row ids; unknown names fail before anything moves.
fn plan_selection(rows: &[RowView], wanted: &Wanted) -> Result<Vec<usize>> {
    match wanted {
        Wanted::All => Ok((0..rows.len()).collect()),
        Wanted::Names(names) => {
            let mut ids = Vec::new();
            for name in names {
                let id = rows
                    .iter()
                    .position(|r| &r.name == name)
                    .with_context(|| format!("no project named {name:?} under the root"))?;
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            Ok(ids)
        }
    }
}

/// Answers the selecting screen from the command line and turns session
/// snapshots into output lines.
struct HeadlessDriver {
    wanted: Wanted,
    json: bool,
    committed: bool,
    announced: bool,
    printed: usize,
    last_notice: Option<String>,
    selection_error: Option<anyhow::Error>,
}

impl HeadlessDriver {
    fn new(wanted: Wanted, json: bool) -> Self {
        Self {
            wanted,
            json,
            committed: false,
            announced: false,
            printed: 0,
            last_notice: None,
            selection_error: None,
        }
    }

    fn on_view(&mut self, view: &SessionView) -> (Vec<UiCommand>, Vec<OutputLine>) {
        let mut cmds = Vec::new();
        let mut out = Vec::new();
        match view.phase {
            Phase::Selecting if !self.committed => {
                self.committed = true;
                match plan_selection(&view.rows, &self.wanted) {
                    Ok(ids) => {
                        cmds.extend(ids.into_iter().map(UiCommand::Toggle));
                        cmds.push(UiCommand::Commit);
                    }
                    Err(e) => {
                        self.selection_error = Some(e);
                        cmds.push(UiCommand::Quit);
                    }
                }
            }
            Phase::Archiving if !self.json => {
                if let Some(progress) = &view.progress {
                    if !self.announced {
                        self.announced = true;
                        out.push(OutputLine::Stderr(format!(
                            "Archiving {} project(s) into {}",
                            progress.total,
                            view.destination.display()
                        )));
                    }
                    if progress.done > self.printed {
                        if let Some(record) = view.history.last() {
                            out.push(OutputLine::Stdout(record.to_string()));
                        }
                        self.printed = progress.done;
                    }
                }
                if view.notice != self.last_notice {
                    if let Some(notice) = &view.notice {
                        out.push(OutputLine::Stderr(notice.clone()));
                    }
                    self.last_notice = view.notice.clone();
                }
            }
            _ => {}
        }
        (cmds, out)
    }

    /// Closing output once the controller has stopped.
    fn finish(
        self,
        cfg: &ArchiveConfig,
        summary: Result<SessionSummary>,
    ) -> Result<Vec<OutputLine>> {
        if let Some(e) = self.selection_error {
            return Err(e);
        }
        let summary = summary?;
        let line = if self.json {
            serde_json::to_string_pretty(&ArchiveReport::new(cfg, &summary))?
        } else {
            final_status_line(cfg, &summary)
        };
        Ok(vec![OutputLine::Stdout(line)])
    }
}

/// Run one session without a terminal UI, sending everything it prints to `out`.
async fn drive_headless(
    cfg: &ArchiveConfig,
    fs: Arc<dyn Filesystem>,
    mut driver: HeadlessDriver,
    out: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let (view_tx, mut view_rx) = mpsc::unbounded_channel::<SessionView>();

    let opts = ControllerOptions {
        exit_on_done: true,
        handle_ctrl_c: true,
    };
    let ctrl_cfg = cfg.clone();
    let handle =
        tokio::spawn(async move { run_controller(&ctrl_cfg, fs, cmd_rx, view_tx, opts).await });

    while let Some(view) = view_rx.recv().await {
        let (cmds, lines) = driver.on_view(&view);
        for cmd in cmds {
            let _ = cmd_tx.send(cmd);
        }
        for line in lines {
            let _ = out.send(line);
        }
    }
    drop(cmd_tx);

    let summary = match handle.await.context("controller task failed") {
        Ok(res) => res.map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };
    for line in driver.finish(cfg, summary)? {
        let _ = out.send(line);
    }
    Ok(())
}

/// Headless front end: prints progress as plain lines (or a JSON report at the end).
async fn run_headless(args: &Cli, cfg: ArchiveConfig, fs: Arc<dyn Filesystem>) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let driver = HeadlessDriver::new(Wanted::from_args(args), args.json);
    let result = drive_headless(&cfg, fs, driver, &out_tx).await;
    drop(out_tx);
    let _ = out_handle.await;
    result
}
