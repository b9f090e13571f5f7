// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project fetching.
//!
//! A __project__ is a repository that devtools keeps a working copy of inside
//! the projects directory, e.g., `$HOME/Projects/hub`. Fetching a project
//! either creates that working copy, or downloads new changes into it, and
//! finally syncs it to the requested tag.
//!
//! # Scheme Detection
//!
//! Repositories can be named without a scheme, e.g., `github.com/org/repo`.
//! In that case every scheme the backend accepts is probed in order until one
//! answers. Schemes that send data in the clear are skipped unless the caller
//! explicitly allows them.
//!
//! # Project Names
//!
//! A project name is a single path component. Names that are empty, `.`,
//! `..`, or contain a path separator are rejected, so a working copy never
//! lands outside of the projects directory.

use crate::{
    config::ProjectEntry,
    vcs::{remote::SCP_SYNTAX, Runner, Vcs, VcsCmd, VcsError, VcsRegistry},
};

use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

static SCP_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SCP_SYNTAX).expect("SCP syntax pattern compiles"));

/// Project to fetch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Project {
    /// Local name, i.e., directory name inside projects directory.
    pub name: String,

    /// Repository to fetch from.
    pub repo: String,

    /// Tag to sync to. Empty means default state.
    pub tag: String,

    /// Backend to use.
    pub vcs: String,
}

impl Project {
    /// Construct new project, naming it after its repository.
    ///
    /// # Errors
    ///
    /// - Return [`FetchError::NoName`] if no name can be derived from `repo`.
    /// - Return [`FetchError::BadName`] if the derived name is not a single
    ///   path component.
    pub fn new(repo: impl Into<String>) -> Result<Self> {
        let repo = repo.into();
        let name = project_name(&repo).ok_or_else(|| FetchError::NoName { repo: repo.clone() })?;
        check_name(&name)?;

        Ok(Self {
            name,
            repo,
            tag: String::new(),
            vcs: "git".into(),
        })
    }

    /// Use `name` as local name instead.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sync to `tag` after fetching.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Use backend `vcs`.
    pub fn with_vcs(mut self, vcs: impl Into<String>) -> Self {
        self.vcs = vcs.into();
        self
    }
}

impl From<&ProjectEntry> for Project {
    fn from(entry: &ProjectEntry) -> Self {
        Self {
            name: entry.name.clone(),
            repo: entry.repo.clone(),
            tag: entry.tag.clone().unwrap_or_default(),
            vcs: entry.vcs.clone().unwrap_or_else(|| "git".into()),
        }
    }
}

/// Derive project name from the last path segment of `repo`.
///
/// Any trailing ".git" is dropped, e.g., `git@host:org/repo.git` is named
/// "repo".
pub fn project_name(repo: &str) -> Option<String> {
    let trimmed = repo.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);

    (!name.is_empty()).then(|| name.to_string())
}

/// Check that `name` can serve as directory name inside projects directory.
///
/// # Errors
///
/// - Return [`FetchError::BadName`] if `name` is empty, `.`, `..`, or
///   contains a path separator.
pub fn check_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if bad {
        return Err(FetchError::BadName { name: name.to_string() });
    }

    Ok(())
}

/// Locate working copy of project `name` inside `projects_dir`.
///
/// # Errors
///
/// - Return [`FetchError::BadName`] if `name` is not a valid project name.
/// - Return [`FetchError::NotFetched`] if no working copy exists yet.
pub fn project_dir(projects_dir: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
    check_name(name)?;
    let dir = projects_dir.as_ref().join(name);
    if !dir.is_dir() {
        return Err(FetchError::NotFetched { name: name.to_string() });
    }

    Ok(dir)
}

/// List tags of fetched project `name`.
///
/// # Errors
///
/// - Return [`FetchError::BadName`] or [`FetchError::NotFetched`] if the
///   working copy cannot be located.
/// - Return [`FetchError::Vcs`] if listing fails.
pub fn list_tags<R: Runner>(vcs: &Vcs<R>, projects_dir: impl AsRef<Path>, name: &str) -> Result<Vec<String>> {
    let dir = project_dir(projects_dir, name)?;
    Ok(vcs.tags(dir)?)
}

/// Determine remote repository of fetched project `name`.
///
/// # Errors
///
/// - Return [`FetchError::BadName`] or [`FetchError::NotFetched`] if the
///   working copy cannot be located.
/// - Return [`FetchError::Vcs`] if the query fails, including when no remote
///   origin is configured.
pub fn remote_of<R: Runner>(vcs: &Vcs<R>, projects_dir: impl AsRef<Path>, name: &str) -> Result<Url> {
    let dir = project_dir(projects_dir, name)?;
    Ok(vcs.remote_repo(dir)?)
}

/// Lookup backend by name in `registry`.
///
/// # Errors
///
/// - Return [`FetchError::UnknownVcs`] if no backend goes by `name`.
pub fn select_backend(registry: &VcsRegistry, name: &str) -> Result<VcsCmd> {
    registry
        .get(name)
        .cloned()
        .ok_or_else(|| FetchError::UnknownVcs {
            name: name.to_string(),
            known: registry.names().join(", "),
        })
}

/// Refuse to run with elevated privileges.
///
/// Working copies created through sudo end up owned by root.
///
/// # Errors
///
/// - Return [`FetchError::Sudo`] if `SUDO_USER` is set.
pub fn refuse_sudo() -> Result<()> {
    match std::env::var_os("SUDO_USER") {
        Some(_) => Err(FetchError::Sudo),
        None => Ok(()),
    }
}

/// Check if `repo` can be handed to the backend as is.
///
/// That is, it has a scheme, uses SCP-like syntax, or is a local path.
pub fn has_scheme(repo: &str) -> bool {
    repo.contains("://")
        || repo.starts_with('/')
        || repo.starts_with('.')
        || SCP_ADDRESS.is_match(repo)
}

/// Find first scheme that `repo` answers to.
///
/// # Errors
///
/// - Return [`FetchError::NoScheme`] if no accepted scheme answers.
/// - Return [`FetchError::Vcs`] if backend tool is not installed.
#[instrument(skip(vcs), level = "debug")]
pub fn detect_scheme<R: Runner>(vcs: &Vcs<R>, repo: &str, allow_insecure: bool) -> Result<String> {
    for scheme in &vcs.cmd().scheme {
        if !allow_insecure && vcs.cmd().is_insecure_scheme(scheme) {
            debug!("skip insecure scheme {scheme}");
            continue;
        }

        match vcs.ping(scheme, repo) {
            Ok(()) => return Ok(scheme.clone()),
            Err(err @ VcsError::ToolMissing { .. }) => return Err(err.into()),
            Err(err) => debug!("{scheme}://{repo} did not answer: {err}"),
        }
    }

    Err(FetchError::NoScheme {
        repo: repo.to_string(),
    })
}

/// Determine URL to create working copy from.
///
/// # Errors
///
/// - Return [`FetchError::NoScheme`] if scheme detection fails.
pub fn resolve_repo_url<R: Runner>(vcs: &Vcs<R>, repo: &str, allow_insecure: bool) -> Result<String> {
    if has_scheme(repo) {
        return Ok(repo.to_string());
    }

    let scheme = detect_scheme(vcs, repo, allow_insecure)?;
    Ok(format!("{scheme}://{repo}"))
}

/// Fetch `project` into `projects_dir`, returning its working copy path.
///
/// # Errors
///
/// - Return [`FetchError::Sudo`] if running through sudo.
/// - Return [`FetchError::BadName`] if project name is not a single path
///   component.
/// - Return [`FetchError::CreateDir`] if projects directory cannot be made.
/// - Return [`FetchError::Vcs`] if any backend operation fails.
#[instrument(skip(vcs, projects_dir, project), fields(project = %project.name), level = "debug")]
pub fn fetch_project<R: Runner>(
    vcs: &Vcs<R>,
    projects_dir: impl AsRef<Path>,
    project: &Project,
    allow_insecure: bool,
) -> Result<PathBuf> {
    refuse_sudo()?;
    check_name(&project.name)?;

    let projects_dir = projects_dir.as_ref();
    let dir = projects_dir.join(&project.name);
    if dir.exists() {
        match vcs.remote_repo(&dir) {
            Ok(remote) if !same_repo(remote.as_str(), &project.repo) => warn!(
                "{} points at {remote}, not {}",
                project.name, project.repo
            ),
            Ok(_) => {}
            Err(err) if err.is_not_configured() => {
                warn!("{} has no remote origin", project.name)
            }
            Err(err) => warn!("cannot check remote of {}: {err}", project.name),
        }

        info!("update {} in {:?}", project.name, dir.display());
        vcs.download(&dir)?;
    } else {
        let url = resolve_repo_url(vcs, &project.repo, allow_insecure)?;
        fs::create_dir_all(projects_dir).map_err(|err| FetchError::CreateDir {
            source: err,
            path: projects_dir.to_path_buf(),
        })?;

        info!("clone {url} into {:?}", dir.display());
        vcs.create(&dir, &url)?;
    }

    if project.tag.is_empty() {
        debug!("sync {} to default state", project.name);
    } else {
        info!("sync {} to {}", project.name, project.tag);
    }
    vcs.tag_sync(&dir, &project.tag)?;

    Ok(dir)
}

// INVARIANT: Compare host and path only, scheme and user do not matter.
fn same_repo(remote: &str, repo: &str) -> bool {
    fn key(repo: &str) -> String {
        let repo = repo.trim();
        let rest = match repo.split_once("://") {
            Some((_, rest)) => rest.to_string(),
            None => repo.replacen(':', "/", 1),
        };
        let rest = rest.rsplit_once('@').map_or(rest.as_str(), |(_, host)| host);
        let rest = rest.trim_end_matches('/');
        rest.strip_suffix(".git").unwrap_or(rest).to_string()
    }

    key(remote) == key(repo)
}

/// Project fetching error types.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Running with elevated privileges.
    #[error("don't run fetch as sudo")]
    Sudo,

    /// No project name can be derived from repository.
    #[error("cannot derive project name from {repo:?}")]
    NoName { repo: String },

    /// Project name would leave projects directory.
    #[error("invalid project name {name:?}, expected a single path component")]
    BadName { name: String },

    /// Project has no working copy yet.
    #[error("project {name:?} not fetched yet")]
    NotFetched { name: String },

    /// No scheme answered during detection.
    #[error("no supported scheme answered for {repo:?}")]
    NoScheme { repo: String },

    /// Backend name is not registered.
    #[error("unknown version control system {name:?}, expected one of: {known}")]
    UnknownVcs { name: String, known: String },

    /// Projects directory cannot be created.
    #[error("failed to create projects directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Backend operation fails.
    #[error(transparent)]
    Vcs(#[from] VcsError),
}

/// Friendly result alias :3
type Result<T, E = FetchError> = std::result::Result<T, E>;
