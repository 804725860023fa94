//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let pipeline = Pipeline::new(settings)?;

    match pipeline.list_videos().await {
        Ok(videos) => {
            if videos.is_empty() {
                Output::info(
                    "No videos processed yet. Use 'tubelens process <url>' to add content.",
                );
            } else {
                Output::header(&format!("Processed Videos ({})", videos.len()));
                println!();

                for video in &videos {
                    Output::video_info(
                        video.title.as_deref().unwrap_or("(untitled)"),
                        &video.video_id,
                        video.uploader.as_deref(),
                        video.duration_seconds,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
