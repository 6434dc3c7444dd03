use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    process,
};

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::backend::CrosstermBackend;
use tracing::{error, info, warn};

use symtype::{
    app_dirs::AppDirs,
    clock::MonotonicClock,
    config::{Config, ConfigStore, FileConfigStore},
    engine::{RunSummary, SessionEngine},
    generator::RngSource,
    history::SessionLog,
    logging::init_file_logging,
    report::{Report, DEFAULT_TOP_N},
    runtime::Terminal,
    Mode, StatisticsStore, TrainerError,
};

/// adaptive drill for typing special characters
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "An interactive drill for symbol and special characters. Practice strings lean toward the characters you are slowest or least accurate on, tracked separately for peeking and touch-typing modes."
)]
pub struct Cli {
    /// statistics file to read and update (default: ~/.local/state/symtype/typing_stats.json)
    #[clap(long)]
    stats_file: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// print the most practiced, slowest and most error-prone characters
    Report {
        /// statistics namespace to report on
        #[clap(short, long, value_enum, default_value_t = ModeArg::Peek)]
        mode: ModeArg,

        /// number of characters per ranking
        #[clap(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
        top: usize,

        /// emit CSV instead of text
        #[clap(long)]
        csv: bool,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum ModeArg {
    Peek,
    NoPeek,
}

impl From<ModeArg> for Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Peek => Mode::Peek,
            ModeArg::NoPeek => Mode::NoPeek,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let cfg = FileConfigStore::new().load();
    if let Some(log_path) = AppDirs::log_path() {
        init_file_logging(&log_path, cfg.level());
    }
    let stats_path = cli
        .stats_file
        .clone()
        .unwrap_or_else(|| cfg.resolved_stats_path());

    if let Some(Command::Report { mode, top, csv }) = cli.command {
        return run_report(&stats_path, mode.into(), top, csv);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let (mut store, load_error) = StatisticsStore::load_or_empty(&stats_path);
    info!(path = %stats_path.display(), "starting trainer");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = symtype::ui::TuiTerminal::new(CrosstermBackend::new(stdout))?;

    let outcome = run_trainer(&mut store, &mut terminal, &cfg, load_error);

    disable_raw_mode()?;
    execute!(terminal.inner_mut().backend_mut(), LeaveAlternateScreen)?;
    terminal.inner_mut().show_cursor()?;

    match outcome {
        Ok(summary) => {
            info!(?summary, "bye");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "trainer stopped");
            if let Err(pe) = store.persist() {
                warn!(error = %pe, "final flush failed");
            }
            eprintln!("symtype: {e}");
            process::exit(1);
        }
    }
}

fn run_trainer<T: Terminal>(
    store: &mut StatisticsStore,
    terminal: &mut T,
    cfg: &Config,
    load_error: Option<TrainerError>,
) -> symtype::Result<RunSummary> {
    let mut engine = SessionEngine::new(store, terminal, RngSource::from_entropy(), MonotonicClock);
    if let Some(e) = load_error {
        engine = engine.with_notice(format!("statistics reset: {e}"));
    }
    if cfg.session_log {
        if let Some(path) = AppDirs::session_log_path() {
            engine = engine.with_history(SessionLog::new(path));
        }
    }
    engine.run()
}

fn run_report(
    stats_path: &std::path::Path,
    mode: Mode,
    top: usize,
    csv: bool,
) -> Result<(), Box<dyn Error>> {
    let store = match StatisticsStore::load(stats_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("symtype: {e}");
            process::exit(1);
        }
    };
    let report = Report::from_store(&store, mode, top);
    let stdout = io::stdout();
    if csv {
        report.write_csv(stdout.lock())?;
    } else {
        report.write_text(&mut stdout.lock())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_interactive() {
        let cli = Cli::parse_from(["symtype"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.stats_file, None);
    }

    #[test]
    fn test_cli_stats_file() {
        let cli = Cli::parse_from(["symtype", "--stats-file", "/tmp/s.json"]);
        assert_eq!(cli.stats_file, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn test_cli_report_defaults() {
        let cli = Cli::parse_from(["symtype", "report"]);
        match cli.command {
            Some(Command::Report { mode, top, csv }) => {
                assert_eq!(mode, ModeArg::Peek);
                assert_eq!(top, DEFAULT_TOP_N);
                assert!(!csv);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_report_flags() {
        let cli = Cli::parse_from(["symtype", "report", "--mode", "no-peek", "-n", "3", "--csv"]);
        match cli.command {
            Some(Command::Report { mode, top, csv }) => {
                assert_eq!(Mode::from(mode), Mode::NoPeek);
                assert_eq!(top, 3);
                assert!(csv);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["symtype", "report", "--mode", "blind"]).is_err());
    }
}
