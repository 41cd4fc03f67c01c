//! Prompt templates for ytmoments.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub classify: ClassifyPrompts,
    pub window: WindowPrompts,
    pub title: TitlePrompts,
}

/// Prompt for comment emotion classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyPrompts {
    pub user: String,
}

impl Default for ClassifyPrompts {
    fn default() -> Self {
        Self {
            user: r#"Classify the emotion of this YouTube comment and return JSON only.
Comment: "{{comment}}"
Labels: {{labels}}"#
                .to_string(),
        }
    }
}

/// Prompt for choosing the transcript window a comment refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowPrompts {
    pub user: String,
}

impl Default for WindowPrompts {
    fn default() -> Self {
        Self {
            user: r#"You get a viewer comment and K transcript windows with timestamps.
Pick the single best-matching window. Return {"start":s,"end":e,"reason":...}.
Comment: {{comment}}
Windows:
{{windows}}"#
                .to_string(),
        }
    }
}

/// Prompts for moment titles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitlePrompts {
    pub user: String,
    /// Instruction given to the summarizer.
    pub summarize: String,
}

impl Default for TitlePrompts {
    fn default() -> Self {
        Self {
            user: r#"Write a concise 4-8 word title for this video moment. Return JSON only.
Transcript window: {{text}}
Comment hint: {{hint}}"#
                .to_string(),
            summarize: "Summarize the key point of this passage in one short line.".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding defaults with files from `custom_dir` when present.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let classify_path = custom_path.join("classify.toml");
            if classify_path.exists() {
                let content = std::fs::read_to_string(&classify_path)?;
                prompts.classify = toml::from_str(&content)?;
            }

            let window_path = custom_path.join("window.toml");
            if window_path.exists() {
                let content = std::fs::read_to_string(&window_path)?;
                prompts.window = toml::from_str(&content)?;
            }

            let title_path = custom_path.join("title.toml");
            if title_path.exists() {
                let content = std::fs::read_to_string(&title_path)?;
                prompts.title = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.classify.user.contains("{{comment}}"));
        assert!(prompts.window.user.contains("{{windows}}"));
        assert!(!prompts.title.summarize.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Comment: {{comment}} ({{labels}})";
        let mut vars = HashMap::new();
        vars.insert("comment".to_string(), "lol".to_string());
        vars.insert("labels".to_string(), "funny, sad".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Comment: lol (funny, sad)");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("title.toml"), "user = \"Name it: {{text}}\"\n").unwrap();

        let prompts = Prompts::load(dir.path().to_str()).unwrap();
        assert_eq!(prompts.title.user, "Name it: {{text}}");
        // Missing keys in a custom file fall back to defaults.
        assert!(!prompts.title.summarize.is_empty());
        assert!(prompts.classify.user.contains("{{comment}}"));
    }
}
