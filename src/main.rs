use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use archive_store::{default_archive_path, encode_conversation, ArchiveStore};
use clap::Parser;
use shllm::config::EnvConfig;
use shllm::persist::{save_on_interrupt, Persistence, SaveOnDrop, SaveOutcome};
use shllm::repl::{self, LoopEnd};
use shllm::session::Session;
use shllm::title::session_title;
use shllm::{logging, providers};
use time::OffsetDateTime;
use tracing::info;

const EXIT_OK: u8 = 0;
const EXIT_RECOVERABLE: u8 = 1;
const EXIT_DATA_LOSS: u8 = 2;
const EXIT_INTERRUPTED: i32 = 130;

const DATA_LOSS_BANNER: &str = "\
################################################################
#  shllm could not save this conversation anywhere on disk.    #
#  The archive and the recovery file both failed.              #
#  The conversation is printed below; copy it before closing.  #
################################################################";

#[derive(Parser)]
#[command(name = "shllm", version, about = "Talk to a language model from the command line")]
struct Cli {
    /// Archive file to append this session to
    #[arg(short = 'f', long = "filepath", value_name = "PATH")]
    filepath: Option<PathBuf>,

    /// Session name; words are joined with underscores
    #[arg(value_name = "SESSION NAME")]
    session_name: Vec<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            eprintln!("shllm: {error:#}");
            ExitCode::from(EXIT_RECOVERABLE)
        }
    }
}

fn run() -> anyhow::Result<u8> {
    // The local offset can only be read while the process is single-threaded.
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let cli = Cli::parse();
    let config = EnvConfig::from_env()?;
    logging::init(config.log_filter.as_deref());

    let cwd = std::env::current_dir().context("failed to resolve the current directory")?;
    let archive_path = match cli.filepath {
        Some(path) => path,
        None => {
            let notes_root = config.notes_root(&cwd, dirs::home_dir().as_deref());
            default_archive_path(&notes_root, now.date())?
        }
    };
    let provider = providers::provider_from_config(&config)?;
    let title = session_title(&cli.session_name, now);

    let profile = provider.profile();
    info!(
        archive = %archive_path.display(),
        provider = %profile.provider_id,
        model = %profile.model_id,
        %title,
        "session started"
    );

    let persistence = Persistence::new(Session::new(title), ArchiveStore::new(archive_path, cwd));

    let reporter = Arc::clone(&persistence);
    let _interrupt = save_on_interrupt(Arc::clone(&persistence), move |outcome| {
        let code = match report_save(outcome, &reporter) {
            EXIT_DATA_LOSS => i32::from(EXIT_DATA_LOSS),
            _ => EXIT_INTERRUPTED,
        };
        std::process::exit(code);
    })
    .context("failed to install signal handlers")?;
    let save_guard = SaveOnDrop::new(Arc::clone(&persistence));

    let end = repl::run(
        io::stdin().lock(),
        &mut io::stdout(),
        &persistence,
        provider.as_ref(),
    );
    let loop_code = report_loop_end(end);

    let save_code = report_save(persistence.save(), &persistence);
    drop(save_guard);

    Ok(loop_code.max(save_code))
}

fn report_loop_end(end: io::Result<LoopEnd>) -> u8 {
    match end {
        Ok(LoopEnd::EndOfInput) => EXIT_OK,
        Ok(LoopEnd::ReadFailed(error)) => {
            eprintln!("shllm: stopped reading input: {error}");
            EXIT_OK
        }
        Ok(LoopEnd::ExchangeFailed(error)) => {
            eprintln!("shllm: model exchange failed: {error}");
            EXIT_RECOVERABLE
        }
        Err(error) => {
            eprintln!("shllm: failed to write to the terminal: {error}");
            EXIT_RECOVERABLE
        }
    }
}

fn report_save(outcome: &SaveOutcome, persistence: &Persistence) -> u8 {
    match outcome {
        Ok(_) => EXIT_OK,
        Err(error) if error.is_fatal() => {
            let mut stderr = io::stderr().lock();
            let _ = writeln!(stderr, "{DATA_LOSS_BANNER}");
            let _ = writeln!(stderr, "shllm: {error}");
            let conversation = persistence.session().conversation().clone();
            if let Ok(bytes) = encode_conversation(&conversation) {
                let _ = stderr.write_all(&bytes);
            }
            EXIT_DATA_LOSS
        }
        Err(error) => {
            eprintln!("shllm: {error}");
            EXIT_RECOVERABLE
        }
    }
}
