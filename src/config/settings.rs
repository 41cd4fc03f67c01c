//! Configuration settings for ytmoments.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcript: TranscriptSettings,
    pub youtube: YoutubeSettings,
    pub analysis: AnalysisSettings,
    pub model: ModelSettings,
    pub cache: CacheSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level without `-v` flags (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.ytmoments".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Transcript acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Span of each transcript window in seconds.
    pub window_size_seconds: f64,
    /// Preferred caption languages, most preferred first.
    pub languages: Vec<String>,
    /// Interface language sent with the track listing request.
    pub ui_language: String,
    /// Number of full discovery/retrieval attempts.
    pub fetch_retries: u32,
    /// Delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// How long to wait for media text-track cues to load.
    pub cue_wait_ms: u64,
    /// Second, shorter wait after switching a track to showing.
    pub cue_retry_wait_ms: u64,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            window_size_seconds: 7.0,
            languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
            ui_language: "en".to_string(),
            fetch_retries: 3,
            retry_delay_ms: 800,
            cue_wait_ms: 4000,
            cue_retry_wait_ms: 2000,
        }
    }
}

/// YouTube-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct YoutubeSettings {
    /// YouTube Data API key used for comment listing.
    pub api_key: Option<String>,
}

impl YoutubeSettings {
    /// The configured API key, falling back to `YOUTUBE_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("YOUTUBE_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// How comments are turned into moments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Match each comment against transcript windows.
    #[default]
    Transcript,
    /// Group similar comments around high-like anchors.
    Cluster,
}

impl std::str::FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transcript" | "windows" => Ok(AnalysisMode::Transcript),
            "cluster" | "clusters" => Ok(AnalysisMode::Cluster),
            _ => Err(format!("Unknown analysis mode: {}", s)),
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Transcript => write!(f, "transcript"),
            AnalysisMode::Cluster => write!(f, "cluster"),
        }
    }
}

/// Moment extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Matching strategy.
    pub mode: AnalysisMode,
    /// Number of transcript windows retrieved per comment.
    pub search_k: usize,
    /// Moments starting closer than this are collapsed.
    pub dedupe_window_seconds: f64,
    /// Maximum number of moments returned.
    pub max_moments: usize,
    /// Number of comments retrieved per cluster anchor.
    pub cluster_k: usize,
    /// Minimum normalized score for a comment to join a cluster.
    pub cluster_min_score: f64,
    /// Clusters smaller than this are not turned into moments.
    pub min_cluster_size: usize,
    /// Maximum number of anchors considered in cluster mode.
    pub max_anchors: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Transcript,
            search_k: 6,
            dedupe_window_seconds: 10.0,
            max_moments: 30,
            cluster_k: 20,
            cluster_min_score: 0.35,
            min_cluster_size: 2,
            max_anchors: 15,
        }
    }
}

/// Generative model provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// No model; heuristics only.
    #[default]
    None,
    /// OpenAI chat completions with structured outputs.
    OpenAI,
}

impl std::str::FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Ok(ModelProvider::None),
            "openai" => Ok(ModelProvider::OpenAI),
            _ => Err(format!("Unknown model provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelProvider::None => write!(f, "none"),
            ModelProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Optional generative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub provider: ModelProvider,
    /// Chat model used for classification, window picking and titles.
    pub model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::None,
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Moment cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Entries older than this are ignored.
    pub ttl_hours: u64,
    /// Path to the SQLite cache database.
    pub sqlite_path: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: 6,
            sqlite_path: "~/.ytmoments/cache.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::MomentsError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ytmoments")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite cache path.
    pub fn cache_path(&self) -> PathBuf {
        Self::expand_path(&self.cache.sqlite_path)
    }
}
