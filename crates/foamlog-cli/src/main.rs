mod commands;
mod logging;
mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "foamlog",
    version,
    about = "Turn foam-stability lab sheets into normalized and wide tables"
)]
struct Cli {
    /// Increase log detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
pub struct InputArgs {
    /// Path to a CSV or XLSX export of the lab sheet
    pub input_file: PathBuf,

    /// Built-in parser profile: latest (default) or legacy
    #[arg(short, long, value_name = "NAME", conflicts_with = "profile_file")]
    pub profile: Option<String>,

    /// Custom JSON parser profile
    #[arg(long, value_name = "FILE")]
    pub profile_file: Option<PathBuf>,

    /// Worksheet to read from an XLSX workbook (default: the first one)
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the normalized table (one row per sample, dilution and day)
    Parse {
        #[command(flatten)]
        input: InputArgs,

        /// Output format: table (default), csv or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the table as CSV to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Build the wide table (one row per sample and dilution, days as columns)
    Pivot {
        #[command(flatten)]
        input: InputArgs,

        /// Output format: table (default), csv or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the table as CSV to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Look up rows by SampleID (case-insensitive)
    Search {
        #[command(flatten)]
        input: InputArgs,

        /// SampleID to look for
        sample_id: String,

        /// Match SampleIDs containing the query instead of equal to it
        #[arg(long)]
        contains: bool,

        /// Search the wide table instead of the normalized one
        #[arg(long)]
        wide: bool,

        /// Output format: table (default), csv or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect and validate parser profiles
    Profiles {
        #[command(subcommand)]
        action: ProfilesAction,
    },
}

#[derive(Subcommand)]
enum ProfilesAction {
    /// List built-in profiles
    List,
    /// Print a built-in profile as JSON
    Show {
        /// Profile name (e.g., "legacy")
        name: String,
    },
    /// Validate a custom profile file
    Validate {
        /// Path to JSON profile file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Parse { input, output, out } => commands::parse::run(&input, &output, out),
        Commands::Pivot { input, output, out } => commands::pivot::run(&input, &output, out),
        Commands::Search {
            input,
            sample_id,
            contains,
            wide,
            output,
        } => commands::search::run(&input, &sample_id, contains, wide, &output),
        Commands::Profiles { action } => match action {
            ProfilesAction::List => commands::profiles::list(),
            ProfilesAction::Show { name } => commands::profiles::show(&name),
            ProfilesAction::Validate { file } => commands::profiles::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
