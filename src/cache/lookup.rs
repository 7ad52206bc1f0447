//! Metadata lookups: localized item names, rate-up windows, manifest.
//!
//! The metadata package is a directory tree:
//!
//! ```text
//! <dir>/manifest.json                 package_version + entries[].path
//! <dir>/i18n/<lang>/character.json    { "<item_id>": "<name>", ... }
//! <dir>/i18n/<lang>/weapon.json
//! <dir>/gacha/<lang>/pools.json       [PoolMetadataEntry, ...]
//! <dir>/icons/<category>/<item_id>.png
//! ```
//!
//! Every file is read at most once per (directory, language) until the
//! language or directory changes. Missing or malformed files degrade to
//! empty lookups.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::memo::MemoCache;
use crate::config::LedgerConfig;
use crate::domain::{FeaturedChecker, ItemCatalog, ItemCategory, PoolMetadataEntry};

const MANIFEST_FILE: &str = "manifest.json";

type NameMap = HashMap<String, String>;

/// Parsed `manifest.json`.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Whether a manifest file was found.
    pub present: bool,
    /// Package version string, if declared.
    pub package_version: Option<String>,
    /// Relative paths listed by the manifest.
    pub paths: HashSet<String>,
}

impl Manifest {
    /// Returns `true` unless a manifest exists and does not list `path`.
    #[must_use]
    pub fn may_contain(&self, path: &str) -> bool {
        !self.present || self.paths.contains(path)
    }
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    package_version: Option<String>,
    #[serde(default)]
    entries: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    path: String,
}

/// Summary of the metadata directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetadataStatus {
    /// Metadata directory.
    pub path: String,
    /// Active language.
    pub language: String,
    /// `true` when the directory holds no files.
    pub is_empty: bool,
    /// Number of files under the directory.
    pub file_count: usize,
    /// Whether `manifest.json` exists.
    pub has_manifest: bool,
    /// Package version declared by the manifest.
    pub current_version: Option<String>,
}

#[derive(Debug, Clone)]
struct Settings {
    dir: PathBuf,
    language: String,
}

/// Memoized metadata lookups for the active directory and language.
#[derive(Debug)]
pub struct MetadataLookup {
    settings: RwLock<Settings>,
    fallback_language: String,
    names: MemoCache<(PathBuf, String, ItemCategory), NameMap>,
    pools: MemoCache<(PathBuf, String), Vec<PoolMetadataEntry>>,
    manifests: MemoCache<PathBuf, Manifest>,
}

impl MetadataLookup {
    /// Creates a lookup over `dir` in `language`, consulting
    /// `fallback_language` for missing names.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, language: &str, fallback_language: &str) -> Self {
        Self {
            settings: RwLock::new(Settings {
                dir: dir.into(),
                language: language.to_string(),
            }),
            fallback_language: fallback_language.to_string(),
            names: MemoCache::new(),
            pools: MemoCache::new(),
            manifests: MemoCache::new(),
        }
    }

    /// Creates a lookup from the metadata settings of `config`.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(
            config.metadata_dir.clone(),
            &config.language,
            &config.fallback_language,
        )
    }

    fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Active language.
    #[must_use]
    pub fn language(&self) -> String {
        self.settings().language
    }

    /// Active metadata directory.
    #[must_use]
    pub fn metadata_dir(&self) -> PathBuf {
        self.settings().dir
    }

    /// Switches language. Every cache is cleared when it changes.
    pub fn set_language(&self, language: &str) {
        let changed = {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            let changed = settings.language != language;
            settings.language = language.to_string();
            changed
        };
        if changed {
            tracing::info!(language, "metadata language changed");
            self.clear();
        }
    }

    /// Switches metadata directory. Every cache is cleared when it changes.
    pub fn set_metadata_dir(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        let changed = {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            let changed = settings.dir != dir;
            settings.dir = dir;
            changed
        };
        if changed {
            tracing::info!("metadata directory changed");
            self.clear();
        }
    }

    /// Drops every cached lookup.
    pub fn clear(&self) {
        self.names.clear();
        self.pools.clear();
        self.manifests.clear();
    }

    /// Parsed manifest of the active directory.
    pub async fn manifest(&self) -> Arc<Manifest> {
        let dir = self.settings().dir;
        self.manifest_of(dir).await
    }

    async fn manifest_of(&self, dir: PathBuf) -> Arc<Manifest> {
        self.manifests
            .get_or_fetch(dir.clone(), move || load_manifest(dir))
            .await
    }

    async fn names_of(&self, dir: &Path, language: &str, category: ItemCategory) -> Arc<NameMap> {
        let key = (dir.to_path_buf(), language.to_string(), category);
        let path = dir
            .join("i18n")
            .join(language)
            .join(format!("{}.json", category.as_str()));
        self.names
            .get_or_fetch(key, move || async move {
                read_json::<NameMap>(&path).await.unwrap_or_default()
            })
            .await
    }

    /// Localized name table of `category` in the active language.
    pub async fn names(&self, category: ItemCategory) -> Arc<NameMap> {
        let Settings { dir, language } = self.settings();
        self.names_of(&dir, &language, category).await
    }

    /// Snapshot of every name table needed to label banners.
    pub async fn item_names(&self) -> ItemNames {
        let Settings { dir, language } = self.settings();
        let fallback = self.fallback_language.as_str();
        let (characters, weapons, fallback_characters, fallback_weapons) = tokio::join!(
            self.names_of(&dir, &language, ItemCategory::Character),
            self.names_of(&dir, &language, ItemCategory::Weapon),
            self.names_of(&dir, fallback, ItemCategory::Character),
            self.names_of(&dir, fallback, ItemCategory::Weapon),
        );
        ItemNames {
            icon_dir: dir.join("icons"),
            characters,
            weapons,
            fallback_characters,
            fallback_weapons,
        }
    }

    /// Rate-up windows for the active directory and language.
    ///
    /// The manifest is consulted first; when it exists and does not list
    /// the pool file, the file is not read.
    pub async fn pool_metadata(&self) -> Arc<Vec<PoolMetadataEntry>> {
        let Settings { dir, language } = self.settings();
        let relative = format!("gacha/{language}/pools.json");
        let manifest = self.manifest_of(dir.clone()).await;
        if !manifest.may_contain(&relative) {
            tracing::debug!(path = %relative, "pool metadata not in manifest");
            return Arc::new(Vec::new());
        }

        let path = dir.join(&relative);
        self.pools
            .get_or_fetch((dir, language), move || async move {
                read_json::<Vec<PoolMetadataEntry>>(&path)
                    .await
                    .unwrap_or_default()
            })
            .await
    }

    /// Featured resolver built from [`Self::pool_metadata`].
    pub async fn featured_checker(&self) -> FeaturedChecker {
        FeaturedChecker::new(&self.pool_metadata().await)
    }

    /// Counts files and reads the manifest of the active directory.
    ///
    /// Bypasses the caches so the result reflects the disk.
    pub async fn status(&self) -> MetadataStatus {
        let Settings { dir, language } = self.settings();
        let file_count = count_files(&dir).await;
        let manifest = load_manifest(dir.clone()).await;
        MetadataStatus {
            path: dir.to_string_lossy().to_string(),
            language,
            is_empty: file_count == 0,
            file_count,
            has_manifest: manifest.present,
            current_version: manifest.package_version,
        }
    }
}

/// Name and icon lookups captured for one banner build.
#[derive(Debug, Clone)]
pub struct ItemNames {
    icon_dir: PathBuf,
    characters: Arc<NameMap>,
    weapons: Arc<NameMap>,
    fallback_characters: Arc<NameMap>,
    fallback_weapons: Arc<NameMap>,
}

impl ItemNames {
    fn tables(&self, category: ItemCategory) -> (&NameMap, &NameMap) {
        match category {
            ItemCategory::Character => (
                self.characters.as_ref(),
                self.fallback_characters.as_ref(),
            ),
            ItemCategory::Weapon => (self.weapons.as_ref(), self.fallback_weapons.as_ref()),
        }
    }
}

impl ItemCatalog for ItemNames {
    fn display_name(&self, category: ItemCategory, item_id: &str, fallback: &str) -> String {
        let (primary, secondary) = self.tables(category);
        primary
            .get(item_id)
            .or_else(|| secondary.get(item_id))
            .filter(|name| !name.is_empty())
            .map(String::as_str)
            .or_else(|| Some(fallback).filter(|name| !name.is_empty()))
            .unwrap_or(item_id)
            .to_string()
    }

    fn icon_path(&self, category: ItemCategory, item_id: &str) -> Option<String> {
        if item_id.is_empty() {
            return None;
        }
        let path = self
            .icon_dir
            .join(category.as_str())
            .join(format!("{item_id}.png"));
        Some(path.to_string_lossy().to_string())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "metadata file missing");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "metadata file unreadable");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "metadata file malformed");
            None
        }
    }
}

async fn load_manifest(dir: PathBuf) -> Manifest {
    let path = dir.join(MANIFEST_FILE);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Manifest::default();
    }
    let file = read_json::<ManifestFile>(&path).await;
    Manifest {
        present: true,
        package_version: file.as_ref().and_then(|f| f.package_version.clone()),
        paths: file
            .map(|f| f.entries.into_iter().map(|e| e.path).collect())
            .unwrap_or_default(),
    }
}

async fn count_files(dir: &Path) -> usize {
    let mut count = 0;
    let mut pending = vec![dir.to_path_buf()];
    while let Some(next) = pending.pop() {
        let Ok(mut entries) = tokio::fs::read_dir(&next).await else {
            continue;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            match entry.file_type().await {
                Ok(ty) if ty.is_dir() => pending.push(entry.path()),
                Ok(ty) if ty.is_file() => count += 1,
                _ => {}
            }
        }
    }
    count
}
