use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    scenes: HashMap<String, String>,
    snapshots: HashMap<String, String>,
    drawings: HashMap<String, String>,
    trim: HashMap<String, TrimEntry>,
}

#[derive(Debug, Deserialize)]
struct TrimEntry {
    rename: String,
    #[serde(default)]
    exclude: Option<String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Recorded scenes for the exporter.
pub mod scenes {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.scenes.keys().cloned().collect()
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.scenes, "scene", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.scenes, "scene", name)?;
        Ok(resolve_path(rel))
    }
}

/// Pose snapshots as the exporter writes them.
pub mod snapshots {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.snapshots.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.snapshots, "snapshot", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.snapshots, "snapshot", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.snapshots, "snapshot", name)?;
        Ok(resolve_path(rel))
    }
}

/// Drawing instruction documents.
pub mod drawings {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.drawings.keys().cloned().collect()
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.drawings, "drawing", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.drawings, "drawing", name)?;
        Ok(resolve_path(rel))
    }
}

/// Rename tables and exclude lists for the trimmer.
pub mod trim {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.trim.keys().cloned().collect()
    }

    pub fn rename_path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.trim, "trim", name)?;
        Ok(resolve_path(&entry.rename))
    }

    pub fn exclude_path(name: &str) -> Result<Option<PathBuf>> {
        let entry = lookup(&MANIFEST.trim, "trim", name)?;
        Ok(entry.exclude.as_deref().map(resolve_path))
    }
}
