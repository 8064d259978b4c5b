use crate::check::{run_check, CheckArgs};
use crate::lookup::{run_lookup, LookupArgs};
use clap::{Parser, Subcommand};
use flood_keys::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "flood-keys",
    about = "Resolve OED locations to flood area-peril and vulnerability keys",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Generate keys, key errors and the model data file list for a location file
    Lookup(LookupArgs),
    /// Load the reference data and validate the user data directory without writing keys
    Check(CheckArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Lookup(args) => run_lookup(args),
        Command::Check(args) => run_check(args),
    }
}
