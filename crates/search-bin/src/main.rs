//! oxsearch entrypoint: replay search and replace key scripts against a file.
mod script;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use core_config::{SearchConfig, load_from};
use core_search::{
    EngineOptions, HistoryRegistry, IncrementalSearchController, IsearchKind,
    QueryReplaceController, ReplaceMode, ReplaceOptions, SearchCommand, SessionResult, Signal,
    Step,
};
use core_state::{Document, Selection};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "oxsearch",
    version,
    about = "Replay incremental search and query replace key scripts"
)]
struct Args {
    /// File to search (UTF-8 text).
    pub path: PathBuf,
    /// One key script per session, e.g. `foo<C-s><RET>`. Sessions share history.
    #[arg(required = true)]
    pub scripts: Vec<String>,
    #[arg(long, value_enum, default_value_t = Mode::Isearch)]
    pub mode: Mode,
    /// Byte offset of the caret when the first session starts.
    #[arg(long)]
    pub at: Option<usize>,
    /// Select `START..END` before the first session (limits replacement).
    #[arg(long, value_parser = parse_region)]
    pub region: Option<(usize, usize)>,
    /// Optional configuration file path (overrides discovery of `search.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Write the edited text back to `path` instead of printing it.
    #[arg(long)]
    pub write: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Isearch,
    IsearchBackward,
    Regexp,
    RegexpBackward,
    QueryReplace,
    QueryReplaceRegexp,
    ReplaceString,
}

fn parse_region(raw: &str) -> Result<(usize, usize), String> {
    let (start, end) = raw
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got `{raw}`"))?;
    let start = start.trim().parse::<usize>().map_err(|e| e.to_string())?;
    let end = end.trim().parse::<usize>().map_err(|e| e.to_string())?;
    if end < start {
        return Err(format!("region end {end} is before start {start}"));
    }
    Ok((start, end))
}

/// The surface both session kinds present to the driver loop.
trait Session {
    fn handle(&mut self, command: SearchCommand) -> Step;
    fn prompt(&self) -> String;
    fn take_signals(&mut self) -> Vec<Signal>;
}

impl Session for IncrementalSearchController<'_, Document> {
    fn handle(&mut self, command: SearchCommand) -> Step {
        IncrementalSearchController::handle(self, command)
    }
    fn prompt(&self) -> String {
        IncrementalSearchController::prompt(self)
    }
    fn take_signals(&mut self) -> Vec<Signal> {
        IncrementalSearchController::take_signals(self)
    }
}

impl Session for QueryReplaceController<'_, Document> {
    fn handle(&mut self, command: SearchCommand) -> Step {
        QueryReplaceController::handle(self, command)
    }
    fn prompt(&self) -> String {
        QueryReplaceController::prompt(self)
    }
    fn take_signals(&mut self) -> Vec<Signal> {
        QueryReplaceController::take_signals(self)
    }
}

#[derive(Debug, Default)]
struct SessionReport {
    prompt: String,
    result: Option<SessionResult>,
    bells: usize,
    rejections: Vec<String>,
    /// Commands left over after the session finished.
    unused: usize,
}

fn drive(session: &mut dyn Session, commands: &[SearchCommand]) -> SessionReport {
    let mut report = SessionReport::default();
    for (i, command) in commands.iter().enumerate() {
        let step = session.handle(*command);
        report.bells += session
            .take_signals()
            .into_iter()
            .filter(|s| *s == Signal::Bell)
            .count();
        match step {
            Step::Continue => {}
            Step::Rejected(err) => report.rejections.push(err.to_string()),
            Step::Finished(result) => {
                report.result = Some(result);
                report.unused = commands.len() - i - 1;
                break;
            }
        }
    }
    report.prompt = session.prompt();
    report
}

fn run_session(
    doc: &mut Document,
    history: &mut HistoryRegistry,
    config: &SearchConfig,
    mode: Mode,
    commands: &[SearchCommand],
) -> SessionReport {
    let kind = match mode {
        Mode::Isearch => Some(IsearchKind::Forward),
        Mode::IsearchBackward => Some(IsearchKind::Backward),
        Mode::Regexp => Some(IsearchKind::RegexForward),
        Mode::RegexpBackward => Some(IsearchKind::RegexBackward),
        Mode::QueryReplace | Mode::QueryReplaceRegexp | Mode::ReplaceString => None,
    };
    if let Some(kind) = kind {
        let options = EngineOptions::from_config(config);
        let mut session = IncrementalSearchController::new(doc, history, options, kind);
        return drive(&mut session, commands);
    }
    let options = ReplaceOptions::from_config(config);
    let options = match mode {
        Mode::QueryReplaceRegexp => options.regex(true),
        Mode::ReplaceString => options.mode(ReplaceMode::All),
        _ => options,
    };
    let mut session = QueryReplaceController::new(doc, history, options);
    drive(&mut session, commands)
}

fn print_report(index: usize, report: &SessionReport) {
    println!("session {index}: {}", report.prompt);
    match &report.result {
        Some(result) => {
            println!(
                "  outcome: {:?} cursor: {} status: {:?}",
                result.outcome, result.cursor, result.status
            );
            if result.error {
                println!("  ended with an error");
            }
            if let Some(c) = result.reinject {
                println!("  reinject: {c:?}");
            }
        }
        None => println!("  unfinished"),
    }
    if report.bells > 0 {
        println!("  bells: {}", report.bells);
    }
    for rejection in &report.rejections {
        println!("  rejected: {rejection}");
    }
    if report.unused > 0 {
        println!("  ignored {} trailing key(s)", report.unused);
    }
}

struct App {
    _log_guard: Option<WorkerGuard>,
}

impl App {
    fn new() -> Self {
        Self { _log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("oxsearch.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "oxsearch.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self._log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }

    fn load_document(args: &Args) -> Result<Document> {
        let content = std::fs::read_to_string(&args.path)
            .with_context(|| format!("reading {}", args.path.display()))?;
        let name = args
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "[buffer]".to_string());
        let mut doc = Document::from_str(&name, &content)?;
        if let Some((start, end)) = args.region {
            if end > doc.len_bytes() {
                bail!("region {start}..{end} is past the end of the file");
            }
            doc.set_selection(Selection::new(start, end - start));
        } else if let Some(at) = args.at {
            doc.set_caret(at);
        }
        Ok(doc)
    }

    fn run(&mut self) -> Result<()> {
        self.configure_logging()?;
        Self::install_panic_hook();
        info!(target: "runtime", "startup");

        let args = Args::parse();
        let config = load_from(args.config.clone())?;
        let mut doc = Self::load_document(&args)?;
        let mut history = HistoryRegistry::from_config(&config);
        info!(
            target: "runtime.startup",
            path = %args.path.display(),
            mode = ?args.mode,
            sessions = args.scripts.len(),
            config_override = args.config.is_some(),
            "bootstrap_complete"
        );

        for (i, source) in args.scripts.iter().enumerate() {
            let commands =
                script::parse(source).with_context(|| format!("key script {}", i + 1))?;
            let report = run_session(&mut doc, &mut history, &config, args.mode, &commands);
            debug!(
                target: "runtime",
                session = i + 1,
                finished = report.result.is_some(),
                bells = report.bells,
                "session_replayed"
            );
            if report.result.as_ref().is_some_and(|r| r.error) {
                warn!(target: "runtime", session = i + 1, "session_error");
            }
            print_report(i + 1, &report);
        }

        if args.write {
            std::fs::write(&args.path, doc.text())
                .with_context(|| format!("writing {}", args.path.display()))?;
            info!(target: "runtime", path = %args.path.display(), "written");
        } else {
            print!("{}", doc.text());
        }
        info!(target: "runtime", "shutdown");
        Ok(())
    }
}

fn main() -> Result<()> {
    let mut app = App::new();
    app.run()
}
