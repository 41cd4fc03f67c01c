//! Doctor command - verify configuration and credentials.

use crate::cli::Output;
use crate::config::{ModelProvider, Prompts, Settings};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("ytmoments Doctor");
    println!();

    let sections = [
        (
            "Credentials",
            vec![
                check_youtube_key(settings.youtube.resolved_api_key().as_deref()),
                check_model(settings.model.provider, std::env::var("OPENAI_API_KEY").ok().as_deref()),
            ],
        ),
        ("Storage", check_storage(settings)),
        (
            "Configuration",
            vec![check_config_file(config_path), check_prompts(settings.prompts.custom_dir.as_deref())],
        ),
    ];

    let mut errors = 0;
    let mut warnings = 0;
    for (title, checks) in &sections {
        println!("{}", style(title).bold());
        for check in checks {
            check.print();
            match check.status {
                CheckStatus::Error => errors += 1,
                CheckStatus::Warning => warnings += 1,
                CheckStatus::Ok => {}
            }
        }
        println!();
    }

    if errors > 0 {
        Output::error(&format!("{} error(s) found.", errors));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! ytmoments is ready to use.");
    }

    Ok(())
}

/// Comments cannot be listed without a Data API key.
fn check_youtube_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if key.len() > 8 && key.is_ascii() => {
            let masked = format!("{}...{}", &key[..4], &key[key.len() - 4..]);
            CheckResult::ok("YouTube API key", &format!("configured ({})", masked))
        }
        Some(_) => CheckResult::warning(
            "YouTube API key",
            "set but looks too short",
            "Check youtube.api_key or YOUTUBE_API_KEY",
        ),
        None => CheckResult::error(
            "YouTube API key",
            "not set",
            "Set youtube.api_key in the config or export YOUTUBE_API_KEY",
        ),
    }
}

/// The model is optional; a missing key only disables it.
fn check_model(provider: ModelProvider, openai_key: Option<&str>) -> CheckResult {
    match (provider, openai_key) {
        (ModelProvider::None, _) => CheckResult::ok("Model", "disabled (heuristic labels and titles)"),
        (ModelProvider::OpenAI, Some(key)) if !key.is_empty() => CheckResult::ok("Model", "OpenAI configured"),
        (ModelProvider::OpenAI, _) => CheckResult::warning(
            "Model",
            "OpenAI selected but OPENAI_API_KEY is not set",
            "Set with: export OPENAI_API_KEY='sk-...' (heuristics are used until then)",
        ),
    }
}

fn check_storage(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &data_dir.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    if !settings.cache.enabled {
        results.push(CheckResult::ok("Cache", "disabled"));
        return results;
    }

    let db_path = settings.cache_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Cache",
            &format!("{} ({}, ttl {}h)", db_path.display(), size, settings.cache.ttl_hours),
        ));
    } else {
        results.push(CheckResult::warning(
            "Cache",
            &format!("{} (not created yet)", db_path.display()),
            "The cache is created on the first analysis",
        ));
    }

    results
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning("Config file", "using defaults", "Create with: ytmoments config edit")
    }
}

fn check_prompts(custom_dir: Option<&str>) -> CheckResult {
    match Prompts::load(custom_dir) {
        Ok(_) if custom_dir.is_some() => CheckResult::ok("Prompts", "custom prompts loaded"),
        Ok(_) => CheckResult::ok("Prompts", "built-in"),
        Err(e) => CheckResult::error("Prompts", &e.to_string(), "Fix or remove prompts.custom_dir"),
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
