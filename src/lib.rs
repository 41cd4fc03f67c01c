//! ytmoments - find the moments viewers talk about
//!
//! Matches a YouTube video's top comments against its transcript and ranks
//! the moments those comments refer to.
//!
//! # Overview
//!
//! ytmoments allows you to:
//! - Fetch a video's transcript from whatever caption track is reachable
//! - Match comments to transcript windows with a lexical TF-IDF index
//! - Group similar comments into clusters around well-liked anchors
//! - Label, title and rank moments, optionally with a language model
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `transcript` - Caption track discovery, retrieval and parsing
//! - `windows` - Fixed-duration transcript windows
//! - `retrieval` - Tokenizer and TF-IDF index
//! - `comments` - Comment sources and timestamp mentions
//! - `cluster` - Comment clustering around an anchor
//! - `assist` - Optional model-backed labels, window picks and titles
//! - `moments` - Moment scoring, deduplication and ranking
//! - `cache` - Time-limited moment cache
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use ytmoments::config::Settings;
//! use ytmoments::orchestrator::{AnalyzeOptions, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     if let Some(analysis) = orchestrator.analyze("dQw4w9WgXcQ", AnalyzeOptions::default()).await? {
//!         for moment in &analysis.moments {
//!             println!("{} {}", moment.format_timestamp(), moment.title);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod assist;
pub mod cache;
pub mod cli;
pub mod cluster;
pub mod comments;
pub mod config;
pub mod error;
pub mod moments;
pub mod orchestrator;
pub mod retrieval;
pub mod transcript;
pub mod video;
pub mod windows;

pub use error::{MomentsError, Result};
