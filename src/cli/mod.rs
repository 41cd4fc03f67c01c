//! CLI module for ytmoments.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// ytmoments - find the moments viewers talk about
///
/// Matches a video's top comments against its transcript and ranks the
/// moments they refer to.
#[derive(Parser, Debug)]
#[command(name = "ytmoments")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find and rank the moments of a video
    Analyze {
        /// YouTube URL or video ID
        video: String,

        /// Matching strategy (transcript, cluster)
        #[arg(short, long)]
        mode: Option<String>,

        /// Ignore and do not update the moment cache
        #[arg(long)]
        no_cache: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Transcript window size in seconds
        #[arg(long)]
        window_size: Option<f64>,

        /// Preferred caption language (repeatable)
        #[arg(short, long = "lang")]
        lang: Vec<String>,

        /// Caption track id to try after all other candidates (repeatable)
        #[arg(long = "vss")]
        vss: Vec<String>,
    },

    /// Fetch and print a video's transcript
    Transcript {
        /// YouTube URL or video ID
        video: String,

        /// Output format (json, srt, vtt, text)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Print transcript windows instead of raw fragments
        #[arg(long)]
        windows: bool,

        /// Preferred caption language (repeatable)
        #[arg(short, long = "lang")]
        lang: Vec<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Local WebVTT file read when no caption track is reachable (repeatable)
        #[arg(long = "subtitles")]
        subtitles: Vec<String>,
    },

    /// Show the caption tracks discovered for a video
    Tracks {
        /// YouTube URL or video ID
        video: String,

        /// Print the diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search a video's transcript windows
    Search {
        /// YouTube URL or video ID
        video: String,

        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Start a local HTTP API
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Check configuration and credentials
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
