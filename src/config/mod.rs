//! Configuration module for tubelens.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{render, Prompts, RagPrompts, SummaryPrompts};
pub use settings::{
    AcquisitionSettings, EmbeddingSettings, GeneralSettings, GenerationSettings, PromptSettings,
    RecordStoreSettings, SegmentationSettings, SentimentSettings, ServerSettings, Settings,
    SummarizationSettings,
};
