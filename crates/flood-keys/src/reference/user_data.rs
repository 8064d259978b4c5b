use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const USER_SUPPLIED_VULNERABILITY_PREFIX: &str = "user_supplied_vulnerability";
pub const VULNERABILITY_SCALE_FACTOR_PREFIX: &str = "vulnerability_scale_factor";

/// Override files found in the user data directory, at most one of each kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDataFiles {
    pub user_supplied_vulnerability: Option<PathBuf>,
    pub vulnerability_scale_factor: Option<PathBuf>,
}

impl UserDataFiles {
    /// Scans `dir` and fails when more than one file of a kind is present.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self, UserDataError> {
        let dir = dir.as_ref();
        let mut names = Vec::new();
        for entry in fs::read_dir(dir).map_err(|source| UserDataError::Io {
            path: dir.to_path_buf(),
            source,
        })? {
            let entry = entry.map_err(|source| UserDataError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();

        let files = Self {
            user_supplied_vulnerability: single_with_prefix(
                dir,
                &names,
                USER_SUPPLIED_VULNERABILITY_PREFIX,
            )?,
            vulnerability_scale_factor: single_with_prefix(
                dir,
                &names,
                VULNERABILITY_SCALE_FACTOR_PREFIX,
            )?,
        };

        info!(
            user_supplied_vulnerability = ?files.user_supplied_vulnerability,
            vulnerability_scale_factor = ?files.vulnerability_scale_factor,
            "validated user data directory"
        );
        Ok(files)
    }

    pub fn file_names(&self) -> Vec<String> {
        [
            &self.user_supplied_vulnerability,
            &self.vulnerability_scale_factor,
        ]
        .into_iter()
        .flatten()
        .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
        .map(str::to_string)
        .collect()
    }
}

fn single_with_prefix(
    dir: &Path,
    names: &[String],
    prefix: &'static str,
) -> Result<Option<PathBuf>, UserDataError> {
    let matches = names
        .iter()
        .filter(|name| name.starts_with(prefix))
        .collect::<Vec<_>>();
    match matches.as_slice() {
        [] => Ok(None),
        [name] => Ok(Some(dir.join(name))),
        _ => Err(UserDataError::DuplicateOverride {
            prefix,
            files: matches.into_iter().cloned().collect(),
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UserDataError {
    #[error("failed to read user data directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("more than one file beginning with {prefix} has been supplied ({}); only one can be supplied at a time", files.join(", "))]
    DuplicateOverride {
        prefix: &'static str,
        files: Vec<String>,
    },
}
