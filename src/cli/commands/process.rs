//! Process command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the process command.
pub async fn run_process(locator: &str, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Process) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubelens doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    Output::info(&format!("Processing: {}", locator));

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Acquiring transcript and building index...");

    match pipeline.process_video(locator).await {
        Ok(outcome) => {
            spinner.finish_and_clear();

            let title = outcome.title.as_deref().unwrap_or("(untitled)");
            Output::success(&format!(
                "Processed '{}' ({} segments indexed)",
                title, outcome.chunks_indexed
            ));
            println!();
            Output::kv("Video ID", &outcome.video_id);
            Output::kv("YouTube ID", &outcome.youtube_id);
            Output::kv(
                "Sentiment",
                &format!(
                    "{} ({:.2})",
                    outcome.sentiment.label, outcome.sentiment.score
                ),
            );
            if !outcome.summary.is_empty() {
                Output::header("Summary");
                println!("{}", outcome.summary);
            }
            println!();
            Output::info(&format!(
                "Ask questions with: tubelens ask {} \"<question>\"",
                outcome.video_id
            ));
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to process: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
