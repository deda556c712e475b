//! File-backed snapshot store.
//!
//! ```text
//! <data_dir>/
//!     template.smil                 descriptor template
//!     players/<player_id>.toml      player record
//!     playlists/<playlist_id>.smil  playlist item fragment
//!     locales/<lang>.toml           flat key = "label" catalogue
//! ```
//!
//! The template is read once and shared; everything else is read per
//! request so edits show up on the next poll.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use signage_descriptor::{PlayerConfiguration, Translations};
use thiserror::Error;

const TEMPLATE_FILE: &str = "template.smil";
const PLAYERS_DIR: &str = "players";
const PLAYLISTS_DIR: &str = "playlists";
const LOCALES_DIR: &str = "locales";

/// Store access errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// File could not be read.
    #[error("Failed to read {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// File content is not valid TOML for the expected record.
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Identifier contains characters not allowed in file names.
    #[error("Invalid identifier: {0:?}")]
    InvalidId(String),

    /// No record exists for the player.
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),
}

/// A stored player: display data plus its configuration snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub name: Option<String>,
    /// Playlist assigned to the player.
    #[serde(default)]
    pub playlist: Option<String>,
    #[serde(default)]
    pub configuration: PlayerConfiguration,
}

/// Accept only `[A-Za-z0-9_-]+` so identifiers map to plain file names.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn checked_id(id: &str) -> Result<&str, StoreError> {
    if is_valid_id(id) {
        Ok(id)
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_toml<T: for<'de> Deserialize<'de>>(path: &Path, content: &str) -> Result<T, StoreError> {
    toml::from_str(content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read-only view over the data directory.
#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    template: Arc<str>,
}

impl Store {
    /// Open the store, loading the shared descriptor template.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        let path = data_dir.join(TEMPLATE_FILE);
        let template = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        debug!("Loaded descriptor template from {:?} ({} bytes)", path, template.len());

        Ok(Self {
            data_dir,
            template: Arc::from(template),
        })
    }

    /// The shared descriptor template.
    pub fn template(&self) -> Arc<str> {
        Arc::clone(&self.template)
    }

    /// Identifiers of every stored player, sorted.
    pub async fn player_ids(&self) -> Result<Vec<String>, StoreError> {
        let dir = self.data_dir.join(PLAYERS_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut ids = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let Some(entry) = entry else { break };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_id(stem) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Load a player record.
    pub async fn load_player(&self, player_id: &str) -> Result<PlayerRecord, StoreError> {
        let id = checked_id(player_id)?;
        let path = self.data_dir.join(PLAYERS_DIR).join(format!("{}.toml", id));
        let content = read_optional(&path)
            .await?
            .ok_or_else(|| StoreError::UnknownPlayer(id.to_string()))?;
        parse_toml(&path, &content)
    }

    /// Load a playlist's item fragment; `None` if it does not exist.
    pub async fn load_playlist(&self, playlist_id: &str) -> Result<Option<String>, StoreError> {
        let id = checked_id(playlist_id)?;
        let path = self.data_dir.join(PLAYLISTS_DIR).join(format!("{}.smil", id));
        read_optional(&path).await
    }

    /// Load one locale catalogue; a missing catalogue is empty.
    pub async fn load_translations(&self, lang: &str) -> Result<Translations, StoreError> {
        let id = checked_id(lang)?;
        let path = self.data_dir.join(LOCALES_DIR).join(format!("{}.toml", id));
        match read_optional(&path).await? {
            Some(content) => {
                let entries: HashMap<String, String> = parse_toml(&path, &content)?;
                let strings = Translations::new(entries);
                debug!("Loaded {} label(s) for locale {:?}", strings.len(), lang);
                Ok(strings)
            }
            None => {
                warn!("No translations for locale {:?}", lang);
                Ok(Translations::default())
            }
        }
    }

    /// Load `lang` backed by `default_lang` for missing keys.
    pub async fn load_localizer(
        &self,
        lang: &str,
        default_lang: &str,
    ) -> Result<Translations, StoreError> {
        let primary = self.load_translations(lang).await?;
        if lang == default_lang {
            return Ok(primary);
        }
        let fallback = self.load_translations(default_lang).await?;
        Ok(primary.with_fallback(fallback))
    }
}
