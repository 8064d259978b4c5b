use clap::Args;
use flood_keys::config::{AppConfig, KeysConfig};
use flood_keys::error::AppError;
use flood_keys::reference::UserDataFiles;
use flood_keys::telemetry;
use std::path::PathBuf;

/// Data directory flags shared by every command.
#[derive(Args, Debug, Default)]
pub(crate) struct DataArgs {
    /// Reference data directory (overrides KEYS_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Directory holding user supplied vulnerability overrides (overrides KEYS_USER_DATA_DIR)
    #[arg(long)]
    pub(crate) user_data_dir: Option<PathBuf>,
}

/// Loads configuration, applies command-line overrides and starts tracing.
pub(crate) fn load_config(data: &mut DataArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;

    if let Some(data_dir) = data.data_dir.take() {
        config.keys.data_dir = data_dir;
    }
    if let Some(user_data_dir) = data.user_data_dir.take() {
        config.keys.user_data_dir = Some(user_data_dir);
    }

    telemetry::init(&config.telemetry)?;
    Ok(config)
}

/// Override files are validated before any location is processed.
pub(crate) fn discover_user_data(keys: &KeysConfig) -> Result<UserDataFiles, AppError> {
    match &keys.user_data_dir {
        Some(dir) => Ok(UserDataFiles::discover(dir)?),
        None => Ok(UserDataFiles::default()),
    }
}
