mod check;
mod cli;
mod lookup;
mod settings;

use flood_keys::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
