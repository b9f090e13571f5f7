// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the devtools configuration file to simplify the
//! process of serialization and deserialization. Reading the file is done
//! through [`Config::load`], everything else is left to the caller.

use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Devtools configuration layout.
///
/// # General Layout
///
/// The configuration is composed of two basic parts: settings and projects.
/// The settings section defines how devtools itself behaves. The projects
/// section lists repositories that `devtools sync` keeps fetched inside of
/// the projects directory.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub settings: Settings,

    /// Listing of projects to keep fetched.
    #[serde(rename = "project", default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<ProjectEntry>,
}

impl Config {
    /// Load configuration file at `path`.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file exists, but cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file content is malformed.
    /// - Return [`ConfigError::DuplicateProject`] if two projects share a
    ///   name.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match read_to_string(path) {
            Ok(data) => data.parse(),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no configuration at {:?}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Read {
                source: err,
                path: path.to_path_buf(),
            }),
        }
    }

    /// Lookup project entry by name.
    pub fn project(&self, name: impl AsRef<str>) -> Option<&ProjectEntry> {
        self.projects
            .iter()
            .find(|entry| entry.name == name.as_ref())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on projects directory field.
        if let Some(dir) = &config.settings.projects_dir {
            config.settings.projects_dir = Some(PathBuf::from(
                shellexpand::full(dir.to_string_lossy().as_ref())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned(),
            ));
        }

        // INVARIANT: Each project owns its working copy.
        let mut names = HashSet::new();
        if let Some(entry) = config.projects.iter().find(|entry| !names.insert(entry.name.as_str())) {
            return Err(ConfigError::DuplicateProject {
                name: entry.name.clone(),
            });
        }

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// General devtools settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Directory that projects are fetched into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects_dir: Option<PathBuf>,

    /// Print diagnostics of expected failures too.
    #[serde(default)]
    pub verbose: bool,

    /// Allow scheme detection to pick schemes that send data in the clear.
    #[serde(default)]
    pub allow_insecure: bool,
}

/// Project to keep fetched.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProjectEntry {
    /// Local name of project, i.e., its directory name.
    pub name: String,

    /// Repository to fetch from.
    pub repo: String,

    /// Tag or branch to sync to. Default state if missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Version control backend to use. Git if missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs: Option<String>,
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Two projects share the same name.
    #[error("project {name:?} is listed more than once")]
    DuplicateProject { name: String },

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
