// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Backend command tables.
//!
//! A [`VcsCmd`] describes how to drive one version control tool purely as
//! data: command templates, extraction rules, and accepted URL schemes. The
//! facade in [`crate::vcs`] never branches on which backend it drives, so a
//! new backend is a new table entry in [`VcsRegistry`].

use crate::vcs::{extract::ExtractionRule, remote::RemoteRule, remote::SCP_SYNTAX};

/// Description of how to use one version control tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsCmd {
    /// Display name, e.g., "Git".
    pub name: String,

    /// Executable to invoke.
    pub cmd: String,

    /// Commands to download a fresh copy of a repository.
    pub create_cmd: Vec<String>,

    /// Commands to download updates into an existing repository.
    pub download_cmd: Vec<String>,

    /// Commands to list tags.
    pub tag_cmd: Vec<ExtractionRule>,

    /// Commands to lookup tags before running `tag_sync_cmd`.
    pub tag_lookup_cmd: Vec<ExtractionRule>,

    /// Commands to sync to a specific tag.
    pub tag_sync_cmd: Vec<String>,

    /// Commands to sync when no tag is requested.
    pub tag_sync_default: Option<Vec<String>>,

    /// Accepted URL schemes, secure and insecure alike.
    pub scheme: Vec<String>,

    /// Subset of `scheme` that sends data in the clear.
    pub insecure_scheme: Vec<String>,

    /// Lightweight connectivity probe.
    pub ping_cmd: String,

    /// How to query the configured remote origin.
    pub remote: Option<RemoteRule>,
}

impl VcsCmd {
    /// Describe how to use Git.
    pub fn git() -> Self {
        Self {
            name: "Git".into(),
            cmd: "git".into(),
            create_cmd: vec!["clone -- {repo} {dir}".into()],
            download_cmd: vec!["pull --ff-only".into()],
            tag_cmd: vec![
                // tags/xxx matches a tag, origin/xxx matches a branch on the default remote.
                ExtractionRule::new("show-ref", r"(?:tags|origin)/(\S+)$"),
            ],
            tag_lookup_cmd: vec![ExtractionRule::new(
                "show-ref tags/{tag} origin/{tag}",
                r"((?:tags|origin)/\S+)$",
            )],
            tag_sync_cmd: vec!["checkout {tag}".into()],
            // Clone and pull already leave the default branch checked out. Do
            // not checkout a named branch here, it may not exist.
            tag_sync_default: Some(vec!["submodule update --init --recursive".into()]),
            scheme: ["git", "https", "http", "git+ssh", "ssh"]
                .into_iter()
                .map(String::from)
                .collect(),
            insecure_scheme: vec!["git".into(), "http".into()],
            // No "--" separator, older git rejects it for ls-remote. The scheme
            // always comes from the list above.
            ping_cmd: "ls-remote {scheme}://{repo}".into(),
            remote: Some(RemoteRule::new("config remote.origin.url", Some(SCP_SYNTAX))),
        }
    }

    /// Check if `scheme` is accepted but sends data in the clear.
    pub fn is_insecure_scheme(&self, scheme: &str) -> bool {
        self.insecure_scheme.iter().any(|insecure| insecure == scheme)
    }
}

/// Known backends keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsRegistry {
    backends: Vec<VcsCmd>,
}

impl VcsRegistry {
    /// Construct registry from a set of backends.
    pub fn new(backends: impl IntoIterator<Item = VcsCmd>) -> Self {
        Self {
            backends: backends.into_iter().collect(),
        }
    }

    /// Registry of every backend shipped with devtools.
    pub fn builtin() -> Self {
        Self::new([VcsCmd::git()])
    }

    /// Lookup backend by display name or executable, ignoring case.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&VcsCmd> {
        let name = name.as_ref();
        self.backends
            .iter()
            .find(|vcs| vcs.name.eq_ignore_ascii_case(name) || vcs.cmd.eq_ignore_ascii_case(name))
    }

    /// List names of registered backends.
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|vcs| vcs.cmd.as_str()).collect()
    }
}

impl Default for VcsRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn registry_lookup_ignores_case() {
        let registry = VcsRegistry::builtin();
        assert_eq!(registry.get("git").map(|vcs| vcs.name.as_str()), Some("Git"));
        assert_eq!(registry.get("GIT").map(|vcs| vcs.cmd.as_str()), Some("git"));
        assert!(registry.get("hg").is_none());
        assert_eq!(registry.names(), vec!["git"]);
    }

    #[test]
    fn second_backend_is_table_entry() {
        let hg = VcsCmd {
            name: "Mercurial".into(),
            cmd: "hg".into(),
            create_cmd: vec!["clone -U -- {repo} {dir}".into()],
            download_cmd: vec!["pull".into()],
            tag_cmd: vec![
                ExtractionRule::new("tags", r"^(\S+)"),
                ExtractionRule::new("branches -c", r"^(\S+)"),
            ],
            tag_lookup_cmd: Vec::new(),
            tag_sync_cmd: vec!["update -r {tag}".into()],
            tag_sync_default: Some(vec!["update default".into()]),
            scheme: vec!["https".into(), "http".into(), "ssh".into()],
            insecure_scheme: vec!["http".into()],
            ping_cmd: "identify -- {scheme}://{repo}".into(),
            remote: Some(RemoteRule::new("paths default", None)),
        };

        let registry = VcsRegistry::new([VcsCmd::git(), hg]);
        assert_eq!(registry.get("mercurial").map(|vcs| vcs.cmd.as_str()), Some("hg"));
        assert_eq!(registry.names(), vec!["git", "hg"]);
    }

    #[test]
    fn git_insecure_schemes() {
        let git = VcsCmd::git();
        assert!(git.is_insecure_scheme("http"));
        assert!(git.is_insecure_scheme("git"));
        assert!(!git.is_insecure_scheme("https"));
        assert!(!git.is_insecure_scheme("ssh"));
    }
}
