//! Character Forge - command-line shell
//!
//! Thin presentation layer over `Session`: parses arguments, runs the
//! requested generation and prints whatever the core returns.

use character_forge::core::error::Result;
use character_forge::generator::{ThreadSleep, MAX_BATCH_SIZE};
use character_forge::{Gender, Generated, Mode, Session};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "character-forge")]
#[command(about = "Generate fictional characters from data tables or a remote model")]
struct Args {
    /// Configuration document (JSON, or TOML with a .toml extension)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one or more characters
    Generate {
        /// offline or remote (defaults to the configured mode)
        #[arg(short, long)]
        mode: Option<Mode>,

        /// male, female, neutral or random
        #[arg(short, long, default_value = "random")]
        gender: Gender,

        /// Style tag from the data tables
        #[arg(short, long, default_value = "fantasia")]
        style: String,

        /// Produce full records instead of bare names
        #[arg(short, long)]
        detailed: bool,

        /// Append a title to bare names (offline only)
        #[arg(long)]
        with_title: bool,

        /// How many characters to generate (1 to 50)
        #[arg(
            short = 'n',
            long,
            default_value = "1",
            value_parser = clap::value_parser!(u16).range(1..=MAX_BATCH_SIZE as i64)
        )]
        count: u16,
    },
    /// Inspect or manage the history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// Print every record, newest first
    Show,
    /// Remove every record
    Clear,
    /// Write the history as JSON to a file
    Export { path: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("character_forge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut session = Session::open(&args.config)?;
    tracing::info!("{} ready", session.config().app_name);

    match args.command {
        Command::Generate {
            mode,
            gender,
            style,
            detailed,
            with_title,
            count,
        } => {
            let mode = mode.unwrap_or(session.config().settings.default_mode);
            let count = usize::from(count);

            if with_title && !detailed && mode == Mode::Offline {
                for _ in 0..count {
                    println!("{}", session.generate_name_with_title(gender, &style));
                }
                return Ok(());
            }

            if count == 1 {
                match session.generate(mode, gender, &style, detailed) {
                    Ok(generated) => print_generated(&generated, None),
                    Err(e) => print_error(&e, None),
                }
            } else {
                println!("Generating {} characters...\n", count);
                let outcomes = session.generate_batch(
                    mode,
                    gender,
                    &style,
                    detailed,
                    count,
                    &mut ThreadSleep,
                    |index, outcome| match outcome {
                        Ok(generated) => println!("{}. {}", index + 1, generated.headline()),
                        Err(e) => println!("{}. Error: {}", index + 1, e),
                    },
                );
                if detailed {
                    println!();
                    for (index, outcome) in outcomes.iter().enumerate() {
                        match outcome {
                            Ok(generated) => print_generated(generated, Some(index + 1)),
                            Err(e) => print_error(e, Some(index + 1)),
                        }
                    }
                }
            }

            if session.persist_history()? {
                tracing::info!("History saved ({} records)", session.history().len());
            }
        }
        Command::History { action } => match action {
            HistoryAction::Show => {
                if session.history().is_empty() {
                    println!("No characters in the history.");
                }
                for (index, record) in session.history().newest_first().enumerate() {
                    println!("{}", "=".repeat(40));
                    println!("CHARACTER {} - {}", index + 1, record.generated_at);
                    println!("{}", "=".repeat(40));
                    println!("{}\n", record);
                }
            }
            HistoryAction::Clear => {
                if !session.history_saving_enabled() {
                    println!("History saving is disabled; there is no saved history to clear");
                    return Ok(());
                }
                session.clear_history();
                session.persist_history()?;
                println!("History cleared");
            }
            HistoryAction::Export { path } => {
                session.export_history(&path)?;
                println!("History exported to {}", path.display());
            }
        },
    }

    Ok(())
}

fn print_generated(generated: &Generated, index: Option<usize>) {
    match generated {
        Generated::Name(name) => match index {
            Some(i) => println!("{}. {}", i, name),
            None => println!("{}", name),
        },
        Generated::Character(record) => {
            println!("{}", "=".repeat(40));
            match index {
                Some(i) => println!("CHARACTER {}", i),
                None => println!("CHARACTER"),
            }
            println!("{}\n", "=".repeat(40));
            println!("{}\n", record);
        }
    }
}

fn print_error(error: &character_forge::ForgeError, index: Option<usize>) {
    match index {
        Some(i) => println!("{}. Error: {}", i, error),
        None => println!("Error: {}", error),
    }
    if let Some(raw) = error.raw_response() {
        println!("Response received:\n{}\n", raw);
    }
}
