use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::github::RepositoryId;

/// Short names shown in chat for the repositories the bot usually reports about.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("Pokemon-Showdown", "server"),
    ("Pokemon-Showdown-Client", "client"),
    ("Pokemon-Showdown-Dex", "dex"),
];

#[derive(thiserror::Error, Debug)]
pub enum AliasFileError {
    #[error("cannot read alias file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse alias file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of the optional TOML file with additional repository aliases.
///
/// ```toml
/// [aliases]
/// Pokemon-Showdown-Client = "client"
/// sprites = "media"
/// ```
#[derive(serde::Deserialize, Debug, Default)]
pub struct AliasFile {
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

/// Resolves raw repository identifiers to the display names used in chat reports.
#[derive(Debug, Clone)]
pub struct RepositoryNames {
    aliases: HashMap<String, String>,
}

impl RepositoryNames {
    /// Loads the built-in aliases, extended and overridden by the aliases in `path`.
    pub fn load(path: &Path) -> Result<Self, AliasFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| AliasFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: AliasFile = toml::from_str(&content).map_err(|source| AliasFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::default().with_aliases(file.aliases))
    }

    pub fn with_aliases(mut self, aliases: HashMap<String, String>) -> Self {
        self.aliases.extend(aliases);
        self
    }

    /// Returns the display name of `repo`; unknown repositories are shown as they are.
    pub fn display_name<'a>(&'a self, repo: &'a RepositoryId) -> &'a str {
        self.aliases
            .get(repo.as_str())
            .map(String::as_str)
            .unwrap_or(repo.as_str())
    }
}

impl Default for RepositoryNames {
    fn default() -> Self {
        Self {
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(repo, name)| (repo.to_string(), name.to_string()))
                .collect(),
        }
    }
}
