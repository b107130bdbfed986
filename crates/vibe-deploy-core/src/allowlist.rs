//! Optional repository allowlist loaded once at startup.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AllowlistError {
    #[error("failed to read allowed repos config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse allowed repos config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Deserialize)]
struct AllowedReposFile {
    #[serde(default)]
    allowed_repos: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Set of repositories permitted to deploy. `None` permits everything.
pub struct RepoAllowlist {
    repos: Option<HashSet<String>>,
}

impl RepoAllowlist {
    pub fn allow_all() -> Self {
        Self { repos: None }
    }

    pub fn from_repos<I, S>(repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repos: Some(repos.into_iter().map(Into::into).collect()),
        }
    }

    /// Loads the allowlist from a YAML file shaped `{allowed_repos: [...]}`.
    ///
    /// No path, or a path that does not exist, permits every repository. A
    /// file that exists but cannot be read or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, AllowlistError> {
        let Some(path) = path else {
            tracing::info!("no allowed repos config specified, allowing all repositories");
            return Ok(Self::allow_all());
        };
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %path.display(),
                    "allowed repos config not found, allowing all repositories"
                );
                return Ok(Self::allow_all());
            }
            Err(source) => {
                return Err(AllowlistError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, AllowlistError> {
        // An empty document configures an empty list.
        if content.trim().is_empty() {
            tracing::info!(path = %path.display(), "loaded 0 allowed repositories");
            return Ok(Self::from_repos(Vec::<String>::new()));
        }
        let parsed: AllowedReposFile =
            serde_yaml::from_str(content).map_err(|source| AllowlistError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let allowlist = Self::from_repos(parsed.allowed_repos);
        tracing::info!(
            path = %path.display(),
            count = allowlist.repo_count().unwrap_or_default(),
            "loaded allowed repositories"
        );
        Ok(allowlist)
    }

    /// Exact membership; no normalization or pattern matching.
    pub fn is_allowed(&self, repository: &str) -> bool {
        match &self.repos {
            None => true,
            Some(repos) => repos.contains(repository),
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.repos.is_some()
    }

    pub fn repo_count(&self) -> Option<usize> {
        self.repos.as_ref().map(HashSet::len)
    }
}
