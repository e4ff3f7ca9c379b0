//! Zone document persistence
//!
//! One JSON file holds the whole zone document. Saves replace it
//! wholesale (no merge/append), loads return the last-saved document or
//! the empty default when the file is missing or unreadable. A corrupt
//! file is logged and treated as "no data", never a hard error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A polygon: an ordered sequence of `[x, y]` points. No further
/// validation; the browser draws whatever was stored.
pub type Zone = Vec<[f64; 2]>;

/// The persisted document: zones plus the reference image they were drawn
/// over (base64, as captured from the camera).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSet {
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Flat-file store for the zone document.
pub struct ZoneStore {
    path: PathBuf,
}

impl ZoneStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the persisted document.
    pub async fn save(&self, set: &ZoneSet) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating zone directory {:?}", parent))?;
            }
        }
        let json = serde_json::to_vec(set).context("encoding zone document")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing zone file {:?}", self.path))?;
        Ok(())
    }

    /// Load the last-saved document, or the empty default if none exists
    /// or the stored file cannot be read or parsed.
    pub async fn load(&self) -> ZoneSet {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ZoneSet::default(),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "zone file unreadable, using defaults");
                return ZoneSet::default();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(set) => set,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "zone file corrupt, using defaults");
                ZoneSet::default()
            }
        }
    }
}
