use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::ArgAction::Set;
use clap::Parser;
use tracing::{event, span, Level};
use tracing_subscriber::prelude::*;

use cpu::{ProcessorConfiguration, System, SystemConfiguration};

mod imagefile;
mod report;

use imagefile::parse_image;
use report::StopReporter;

/// Run a program image on the emulated instruction processors.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// Text file holding the banks of the program and where it starts.
    #[clap(action = Set, long)]
    image: PathBuf,

    /// How many instruction processors to run the program on.
    #[clap(action = Set, long, default_value_t = 1)]
    processors: usize,

    /// Stop each processor after this many cycles.
    #[clap(action = Set, long)]
    cycle_limit: Option<u64>,

    /// Words of main storage.
    #[clap(action = Set, long, default_value_t = SystemConfiguration::default().storage_words)]
    storage_words: usize,
}

fn run_emulator() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // See
    // https://docs.rs/tracing-subscriber/0.2.19/tracing_subscriber/fmt/index.html#filtering-events-with-environment-variables
    // for instructions on how to select which trace messages get
    // printed.
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let filter_layer = match tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
    {
        Err(e) => {
            return Err(Box::new(e));
        }
        Ok(layer) => layer,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let span = span!(Level::ERROR, "emulate", image=?cli.image);
    let _enter = span.enter();

    let text = fs::read_to_string(&cli.image)?;
    let image = parse_image(&text)?.with_interrupt_environment();
    let config = SystemConfiguration {
        storage_words: cli.storage_words,
        processor_count: cli.processors,
        processor: ProcessorConfiguration {
            cycle_limit: cli.cycle_limit,
            ..ProcessorConfiguration::default()
        },
    };
    let mut system = System::load(&config, &image)?;
    event!(
        Level::DEBUG,
        "starting {} processors at {}",
        system.processors().len(),
        image.start().level_bdi
    );
    system.start_all();
    system.run();

    let mut reporter = StopReporter::new();
    for status in system.status() {
        reporter.report(&status)?;
    }
    Ok(())
}

fn main() {
    match run_emulator() {
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}
