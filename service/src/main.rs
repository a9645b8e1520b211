use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use dialoguer::Input;
use tracing::{trace, warn};

use tigrinya::{corpus, Config, Pipeline};

/// Tigrinya stemmer.
///
/// Without a subcommand, reads lines from the terminal and prints their stems.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// TOML manifest with the grapheme table and stemming rules [default: built-in rules].
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every *.txt file under SOURCE to a JSON document in TARGET.
    Corpus {
        source: PathBuf,
        target: PathBuf,

        /// Locate every document at the PDF mirroring its text file under DIR.
        #[arg(long, value_name = "DIR")]
        originals: Option<PathBuf>,
    },
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::try_init().map_err(|e| eyre::eyre!(e))?;

    let args = Args::parse();

    let config = Arc::new(match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::embedded()?,
    });
    let pipeline = Pipeline::new(config)?;

    if let Some(Command::Corpus {
        source,
        target,
        originals,
    }) = args.command
    {
        let summary = match originals {
            Some(originals) => {
                corpus::convert_dir_with_originals(&pipeline, &source, &target, &originals)?
            }
            None => corpus::convert_dir(&pipeline, &source, &target)?,
        };
        println!(
            " :: {} documents converted, {} failed",
            summary.converted, summary.failed
        );

        return Ok(());
    }

    loop {
        let input: String = Input::new().interact()?;

        if let Some(command) = input.strip_prefix("/") {
            let items = command.split_whitespace().collect::<Vec<_>>();

            match items.as_slice() {
                [] => (),
                ["quit", ..] => return Ok(()),
                ["stem", words @ ..] => words
                    .iter()
                    .for_each(|word| print_steps(&pipeline, word)),
                ["corpus", source, target] => {
                    match corpus::convert_dir(&pipeline, Path::new(source), Path::new(target)) {
                        Ok(summary) => println!(
                            " :: {} documents converted, {} failed",
                            summary.converted, summary.failed
                        ),
                        Err(e) => warn!(error = %e, "failed to convert a corpus"),
                    }
                }
                _ => println!("unrecognised command: {}", items.join(" ")),
            }

            continue;
        }

        let start = Instant::now();
        let stems = pipeline.process(&input);
        println!(" :: {} stems: {}", stems.len(), stems.join(" "));

        trace!(text = ?input, duration = ?start.elapsed(), "text processed");
    }
}

/// Print the output of every stemming step for a single word.
fn print_steps(pipeline: &Pipeline, word: &str) {
    match pipeline.word_steps(word) {
        Some(steps) => {
            println!(" :: {}", word);
            println!(" - pairs:                {}", steps.pairs);
            println!(" - double reduplication: {}", steps.double_reduplication);
            println!(" - prefixes:             {}", steps.prefixes);
            println!(" - suffixes:             {}", steps.suffixes);
            println!(" - single reduplication: {}", steps.single_reduplication);
        }
        None => println!(" :: {}: dropped before stemming", word),
    }
}
