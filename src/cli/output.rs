//! CLI output formatting utilities.

use crate::moments::Moment;
use crate::transcript::TrackSummary;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print one ranked moment.
    pub fn moment(rank: usize, moment: &Moment, url: &str) {
        println!(
            "\n{} {} @ {} ({}, score: {:.2})",
            style(format!("{:>2}.", rank)).green(),
            style(&moment.title).bold(),
            style(moment.format_timestamp()).cyan(),
            moment.emotion,
            moment.score
        );
        println!(
            "   {} {}",
            style(format!("[{} likes]", moment.likes)).dim(),
            content_preview(&moment.comment, 160)
        );
        if let Some(size) = moment.cluster_size {
            println!("   {}", style(format!("{} similar comments", size)).dim());
        }
        println!("   {}", style(url).dim());
    }

    /// Print search result.
    pub fn search_result(timestamp: &str, score: f64, content: &str, url: &str) {
        println!(
            "\n{} {} (score: {:.2})",
            style(">>").green(),
            style(timestamp).cyan(),
            score
        );
        println!("   {}", content_preview(content, 200));
        println!("   {}", style(url).dim());
    }

    /// Print one discovered caption track.
    pub fn track(track: &TrackSummary) {
        let mut flags = Vec::new();
        if !track.kind.is_empty() {
            flags.push(track.kind.clone());
        }
        if track.def {
            flags.push("default".to_string());
        }
        if track.base {
            flags.push("url".to_string());
        }
        println!(
            "  {} {} {} {}",
            style("*").cyan(),
            style(&track.lang).bold(),
            track.name,
            style(format!("[{}] {}", track.vss, flags.join(", "))).dim()
        );
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 20), "short text");
        assert_eq!(content_preview("abcdef", 3), "abc...");
        assert_eq!(content_preview("ééééé", 2), "éé...");
    }
}
