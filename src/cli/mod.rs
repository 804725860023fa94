//! CLI module for tubelens.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tubelens - Video Transcripts, Summaries and Q&A
///
/// Turn long-form video into a queryable knowledge base: fetch transcripts
/// (with speech-to-text fallback), summarize, classify sentiment, and ask
/// questions answered from the video's own words.
#[derive(Parser, Debug)]
#[command(name = "tubelens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
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
    /// Check system requirements and configuration
    Doctor,

    /// Acquire, analyze and index a video
    Process {
        /// YouTube URL or bare 11-character video ID
        locator: String,
    },

    /// Ask a question about a processed video
    Ask {
        /// Video ID returned by 'process'
        video_id: String,

        /// The question to ask
        question: String,

        /// Number of transcript segments to retrieve as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// List processed videos
    List,

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

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
