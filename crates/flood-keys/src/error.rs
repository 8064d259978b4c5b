use crate::config::ConfigError;
use crate::keys_file::KeysFileError;
use crate::lookup::{LocationReadError, LookupError};
use crate::reference::{ReferenceDataError, UserDataError};
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    ReferenceData(ReferenceDataError),
    UserData(UserDataError),
    Locations(LocationReadError),
    Lookup(LookupError),
    KeysFile(KeysFileError),
}

impl AppError {
    /// Process exit code; configuration problems are distinguished from run failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::UserData(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::ReferenceData(err) => write!(f, "reference data error: {}", err),
            AppError::UserData(err) => write!(f, "configuration error: {}", err),
            AppError::Locations(err) => write!(f, "location input error: {}", err),
            AppError::Lookup(err) => write!(f, "lookup error: {}", err),
            AppError::KeysFile(err) => write!(f, "output error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::ReferenceData(err) => Some(err),
            AppError::UserData(err) => Some(err),
            AppError::Locations(err) => Some(err),
            AppError::Lookup(err) => Some(err),
            AppError::KeysFile(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ReferenceDataError> for AppError {
    fn from(value: ReferenceDataError) -> Self {
        Self::ReferenceData(value)
    }
}

impl From<UserDataError> for AppError {
    fn from(value: UserDataError) -> Self {
        Self::UserData(value)
    }
}

impl From<LocationReadError> for AppError {
    fn from(value: LocationReadError) -> Self {
        Self::Locations(value)
    }
}

impl From<LookupError> for AppError {
    fn from(value: LookupError) -> Self {
        Self::Lookup(value)
    }
}

impl From<KeysFileError> for AppError {
    fn from(value: KeysFileError) -> Self {
        Self::KeysFile(value)
    }
}
