//! Configuration module for ytmoments.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ClassifyPrompts, Prompts, TitlePrompts, WindowPrompts};
pub use settings::{
    AnalysisMode, AnalysisSettings, CacheSettings, GeneralSettings, ModelProvider,
    ModelSettings, PromptSettings, Settings, TranscriptSettings, YoutubeSettings,
};
