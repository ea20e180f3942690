use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use transit::persist::Snapshot;
use transit::requests::{self, BaseInput, StatInput};
use transit::TransitRouter;

#[derive(Parser, Debug)]
#[command(version, about = "Transit catalogue and routing engine", long_about = None)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Consume load requests and persist the catalogue.
    #[command(name = "make_base")]
    MakeBase {
        /// Read the request document from a file instead of stdin.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Load a persisted catalogue and answer stat requests.
    #[command(name = "process_requests")]
    ProcessRequests {
        /// Read the request document from a file instead of stdin.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn read_input(path: Option<PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn make_base(input: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(input)?;
    let input: BaseInput =
        serde_json::from_str(&text).map_err(requests::RequestError::Malformed)?;
    let catalogue = requests::build_catalogue(&input)?;
    info!(
        "catalogue loaded: {} stops, {} routes",
        catalogue.num_stops(),
        catalogue.num_routes()
    );

    let router = TransitRouter::new(catalogue);
    Snapshot::capture(&router).save(&input.serialization_settings.file)?;
    info!(
        "snapshot written to {}",
        input.serialization_settings.file.display()
    );
    Ok(())
}

fn process_requests(input: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(input)?;
    let input: StatInput =
        serde_json::from_str(&text).map_err(requests::RequestError::Malformed)?;
    let router = Snapshot::load(&input.serialization_settings.file)?.restore();
    info!(
        "snapshot loaded: {} stops, {} routes",
        router.catalogue().num_stops(),
        router.catalogue().num_routes()
    );

    let responses = requests::process_stat_requests(&router, &input.stat_requests);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &responses)?;
    writeln!(out)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let result = match args.cmd {
        Command::MakeBase { input } => make_base(input),
        Command::ProcessRequests { input } => process_requests(input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
