//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Character class scoping the skill dictionary; `None` matches against
    /// every class.
    pub class: Option<String>,

    /// Expected number of skills per panel; the parser stops extracting and
    /// the recovery pass fills up to this count.
    pub max_skills: usize,

    /// Preprocessing profile used when no region template is supplied
    /// (whole-panel recognition).
    pub panel_preprocess: ie::Preprocess,

    /// Preprocessing profile for user-drawn region templates.
    pub region_preprocess: ie::Preprocess,

    /// Directory holding the OCR model files.
    pub models_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            class: None,
            max_skills: crate::panel::MAX_PANEL_SKILLS,
            panel_preprocess: ie::Preprocess::full_panel(),
            region_preprocess: ie::Preprocess::per_region(),
            models_dir: PathBuf::from("models"),
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("skillscan.json"))
    }

    /// Load configuration from disk, falling back to defaults on missing file.
    pub fn load_or_default() -> Self {
        match Self::try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    /// Try to load configuration from disk.
    pub fn try_load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
        let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        Ok(cfg)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(&path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    pub fn detection_model(&self) -> PathBuf {
        self.models_dir.join("ch_PP-OCRv4_det_infer.onnx")
    }

    pub fn recognition_model(&self) -> PathBuf {
        self.models_dir.join("korean_PP-OCRv4_rec_infer.onnx")
    }

    pub fn charset(&self) -> PathBuf {
        self.models_dir.join("korean_dict.txt")
    }
}
