use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use tango_algo::{
    Clock, FixedClock, ForgotPolicy, OrderingPolicy, PositionRange, PromptMode, QueueOptions,
    ReviewSession, SystemClock,
};
use tango_drill::logging::init_tracing;
use tango_drill::{
    import_sheet, load_catalog, run_drill, AppError, AppResult, CommandSpeaker, Config,
    DrillOptions, JsonFileRepository, PresentationSink, SilentSpeaker, Speaker, TerminalSink,
};

#[derive(Parser, Debug)]
#[command(name = "tango", version, about = "Spaced-repetition vocabulary drill")]
struct Cli {
    /// Word list: JSON file path or http(s) URL
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Directory holding the progress file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Queue ordering: streak or random
    #[arg(long, global = true)]
    ordering: Option<OrderingPolicy>,

    /// When a forgotten word comes back: same-day or next-day
    #[arg(long, global = true)]
    forgot_policy: Option<ForgotPolicy>,

    /// Fixed RNG seed for reproducible ordering
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Review the words due today
    Drill(DrillArgs),
    /// Show learned / total counts
    Stats,
    /// Forget all progress for the current word list
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Convert an xlsx or CSV word sheet into a JSON word list
    Import {
        input: PathBuf,
        #[arg(long, short, default_value = "words.json")]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct DrillArgs {
    /// First position of the range (inclusive)
    #[arg(long)]
    from: Option<i64>,

    /// Last position of the range (inclusive)
    #[arg(long)]
    to: Option<i64>,

    /// Review at most this many words
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max: Option<u64>,

    /// Prompt side: word or meaning
    #[arg(long, default_value = "word")]
    mode: PromptMode,

    /// Speak each word when revealed
    #[arg(long)]
    speak: bool,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    apply_overrides(&mut config, &cli);

    let _log_guard = init_tracing(&config.log_level, config.file_logs, &config.log_dir);

    if let Err(err) = run(cli, config).await {
        tracing::error!(error = %err, "command failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(catalog) = &cli.catalog {
        config.catalog = catalog.clone();
    }
    if let Some(data_dir) = &cli.data_dir {
        // logs follow the data directory unless LOG_DIR pinned them
        if config.log_dir == config.data_dir.join("logs") {
            config.log_dir = data_dir.join("logs");
        }
        config.data_dir = data_dir.clone();
    }
    if let Some(ordering) = cli.ordering {
        config.ordering = ordering;
    }
    if let Some(policy) = cli.forgot_policy {
        config.forgot_policy = policy;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
}

async fn run(cli: Cli, config: Config) -> AppResult<()> {
    let command = cli
        .command
        .unwrap_or_else(|| Command::Drill(DrillArgs::default()));

    if let Command::Import { input, output } = &command {
        let report = import_sheet(input, output)?;
        println!(
            "Wrote {} ({} words, {} rows skipped)",
            output.display(),
            report.written,
            report.skipped
        );
        return Ok(());
    }

    let stdout = io::stdout();
    let mut sink = TerminalSink::new(stdout.lock());

    let (catalog, status) = load_catalog(&config.catalog).await;
    sink.catalog_status(&status)?;

    let clock: Box<dyn Clock> = match config.today {
        Some(day) => Box::new(FixedClock::new(day)),
        None => Box::new(SystemClock),
    };
    let repository = JsonFileRepository::new(config.progress_path());
    tracing::debug!(path = %repository.path().display(), "using progress file");
    let mut session = ReviewSession::open(
        catalog,
        Box::new(repository),
        clock,
        config.session_config(),
    );
    if !session.is_writable() {
        sink.notice(
            "Warning: progress file could not be read; nothing will be saved this run.",
        )?;
    }

    match command {
        Command::Drill(args) => {
            let options = drill_options(&args, &session)?;
            let speaker: Box<dyn Speaker> = match &config.tts_command {
                Some(command) => {
                    Box::new(CommandSpeaker::new(command.clone(), config.tts.clone()))
                }
                None => Box::new(SilentSpeaker),
            };

            let stdin = io::stdin();
            let mut input = stdin.lock();
            let summary = run_drill(
                &mut session,
                &options,
                &mut input,
                &mut sink,
                speaker.as_ref(),
            )?;
            tracing::info!(?summary, "drill finished");

            sink.stats(&session.stats(), session.due_count())?;
        }
        Command::Stats => {
            sink.stats(&session.stats(), session.due_count())?;
        }
        Command::Reset { yes } => {
            let words = session.catalog().len();
            if !session.is_writable() {
                sink.notice("Reset skipped: the progress file could not be read.")?;
                return Ok(());
            }
            if !yes && !confirm(&format!("Reset progress for {words} words? [y/N] "))? {
                sink.notice("Cancelled.")?;
                return Ok(());
            }
            session.reset();
            sink.notice(&format!("Progress reset for {words} words."))?;
        }
        Command::Import { .. } => {}
    }

    Ok(())
}

/// Queue restrictions from the command line
///
/// A range is only applied when `--from` or `--to` is given; the missing end
/// defaults to the first or last position in the word list.
fn drill_options(args: &DrillArgs, session: &ReviewSession) -> AppResult<DrillOptions> {
    let range = match (args.from, args.to) {
        (None, None) => None,
        (from, to) => {
            let from = from.unwrap_or(1);
            let to = to.unwrap_or_else(|| session.catalog().max_position());
            if from > to {
                return Err(AppError::InvalidArgument(format!(
                    "--from ({from}) must not exceed --to ({to})"
                )));
            }
            Some(PositionRange::new(from, to))
        }
    };

    Ok(DrillOptions {
        queue: QueueOptions {
            range,
            max_items: args.max.map(|max| max as usize),
        },
        mode: args.mode,
        speak: args.speak,
    })
}

fn confirm(question: &str) -> io::Result<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{question}")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
