use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::graph::layout::LayoutAlgorithm;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub backend_url: String,

    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    pub sim_threshold: f32,

    pub layout: LayoutAlgorithm,
    pub layout_anim_ms: u64,
    pub node_spacing: f32,
    pub link_distance: f32,
    pub repulsion: f32,
    pub damping: f32,
    pub max_step: f32,

    pub camera_zoom_cap: f32,
    pub camera_anim_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8001".to_string(),
            poll_interval_ms: 1000,
            debounce_ms: 300,
            sim_threshold: 0.7,
            layout: LayoutAlgorithm::ForceDirected,
            layout_anim_ms: 600,
            node_spacing: 3.0,
            link_distance: 6.0,
            repulsion: 22.0,
            damping: 0.92,
            max_step: 0.35,
            camera_zoom_cap: 2.0,
            camera_anim_ms: 500,
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "mediagraph")?;
    Some(proj.config_dir().join("viewer.toml"))
}

pub fn load_or_default() -> ViewerConfig {
    let Some(path) = config_file_path() else {
        return ViewerConfig::default();
    };
    load_or_default_from_path(&path)
}

fn load_or_default_from_path(path: &Path) -> ViewerConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return ViewerConfig::default();
    };
    toml::from_str(&contents).unwrap_or_else(|_| ViewerConfig::default())
}

#[allow(dead_code)]
pub fn save(cfg: &ViewerConfig) -> anyhow::Result<()> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)
}

fn save_to_path(cfg: &ViewerConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize viewer config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write viewer config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn viewer_config_roundtrip_save_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("viewer.toml");
        let cfg = ViewerConfig {
            backend_url: "http://10.0.0.2:9000".to_string(),
            layout: LayoutAlgorithm::Concentric,
            ..ViewerConfig::default()
        };

        save_to_path(&cfg, &path).expect("save config");
        let loaded = load_or_default_from_path(&path);

        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");

        assert_eq!(load_or_default_from_path(&path), ViewerConfig::default());
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("viewer.toml");
        fs::write(&path, "not = [valid").expect("write");

        assert_eq!(load_or_default_from_path(&path), ViewerConfig::default());
    }
}
