//! Doctor command: diagnose the local environment before processing videos.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::Command;

/// Prints diagnostic lines as checks run and tallies the outcomes.
struct Diagnosis {
    warnings: usize,
    errors: usize,
}

impl Diagnosis {
    fn new() -> Self {
        Self {
            warnings: 0,
            errors: 0,
        }
    }

    fn section(&self, title: &str) {
        println!("\n{}", style(title).bold());
    }

    fn pass(&self, name: &str, detail: &str) {
        println!(
            "  {} {} {}",
            style("✓").green(),
            style(name).bold(),
            style(detail).dim()
        );
    }

    fn warn(&mut self, name: &str, detail: &str, hint: &str) {
        self.warnings += 1;
        println!("  {} {} {}", style("!").yellow(), style(name).bold(), detail);
        println!("      {}", style(hint).dim());
    }

    fn fail(&mut self, name: &str, detail: &str, hint: &str) {
        self.errors += 1;
        println!("  {} {} {}", style("✗").red(), style(name).bold(), detail);
        println!("      {}", style(hint).dim());
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Tubelens Doctor");

    let mut diag = Diagnosis::new();

    diag.section("Tools");
    check_tool(
        &mut diag,
        "yt-dlp",
        &["--version"],
        "Fetches metadata, captions, and audio. Install with: pip install yt-dlp",
    );
    check_tool(
        &mut diag,
        "ffmpeg",
        &["-version"],
        "Extracts audio for the transcription fallback. Install via your package manager",
    );

    diag.section("OpenAI");
    check_api_key(&mut diag);
    diag.pass(
        "Embedding model",
        &format!(
            "{} ({} dims)",
            settings.embedding.model, settings.embedding.dimensions
        ),
    );
    diag.pass("Generation model", &settings.generation.model);
    diag.pass("Transcription model", &settings.acquisition.whisper_model);

    diag.section("Storage");
    check_storage(&mut diag, settings);

    diag.section("Configuration");
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        diag.pass("Config file", &config_path.display().to_string());
    } else {
        diag.warn(
            "Config file",
            "not found, using defaults",
            "Create one with: tubelens config edit",
        );
    }

    println!();
    if diag.errors > 0 {
        Output::error(&format!(
            "{} problem(s) need fixing before processing videos.",
            diag.errors
        ));
        std::process::exit(1);
    } else if diag.warnings > 0 {
        Output::warning(&format!("Ready, with {} warning(s).", diag.warnings));
    } else {
        Output::success("Everything looks good.");
    }

    Ok(())
}

fn check_tool(diag: &mut Diagnosis, name: &str, args: &[&str], hint: &str) {
    match Command::new(name).args(args).output() {
        Ok(output) if output.status.success() => {
            let version = short_version(&String::from_utf8_lossy(&output.stdout));
            diag.pass(name, &version);
        }
        Ok(_) => diag.fail(name, "installed but returned an error", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => diag.fail(name, "not found", hint),
        Err(e) => diag.fail(name, &format!("could not run: {}", e), hint),
    }
}

fn check_api_key(diag: &mut Diagnosis) {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            diag.pass("OPENAI_API_KEY", &format!("set ({})", mask_key(&key)));
        }
        Ok(key) if key.trim().is_empty() => diag.fail(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => diag.warn(
            "OPENAI_API_KEY",
            "set, but does not look like an OpenAI key",
            "OpenAI keys start with sk-",
        ),
        Err(_) => diag.fail(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

fn check_storage(diag: &mut Diagnosis, settings: &Settings) {
    let data_dir = settings.data_dir();
    if data_dir.exists() {
        diag.pass("Data directory", &data_dir.display().to_string());
    } else {
        diag.warn(
            "Data directory",
            &format!("{} does not exist yet", data_dir.display()),
            "Created automatically on first run",
        );
    }

    match count_index_artifacts(&settings.index_dir()) {
        Some(count) => diag.pass("Index artifacts", &format!("{} video(s) indexed", count)),
        None => diag.warn(
            "Index artifacts",
            "no index directory yet",
            "Created when the first video is processed",
        ),
    }

    let db_path = settings.sqlite_path();
    match std::fs::metadata(&db_path) {
        Ok(meta) => diag.pass(
            "Database",
            &format!("{} ({})", db_path.display(), format_size(meta.len())),
        ),
        Err(_) => diag.warn(
            "Database",
            &format!("{} does not exist yet", db_path.display()),
            "Created when the first video is processed",
        ),
    }
}

/// Number of per-video `.index` files, or `None` if the directory is absent.
fn count_index_artifacts(dir: &Path) -> Option<usize> {
    let entries = std::fs::read_dir(dir).ok()?;
    Some(
        entries
            .flatten()
            .filter(|e| e.path().extension().map(|ext| ext == "index").unwrap_or(false))
            .count(),
    )
}

/// First line of a tool's version output, clipped to a readable width.
fn short_version(output: &str) -> String {
    let line = output.lines().next().unwrap_or("installed").trim();
    if line.chars().count() > 60 {
        let clipped: String = line.chars().take(60).collect();
        format!("{}...", clipped)
    } else {
        line.to_string()
    }
}

fn mask_key(key: &str) -> String {
    format!("{}...{}", &key[..7], &key[key.len() - 4..])
}

fn format_size(bytes: u64) -> String {
    let units = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < units.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, units[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_index_artifacts_only_counts_index_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.index"), b"x").unwrap();
        std::fs::write(dir.path().join("a.segments.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("b.index"), b"x").unwrap();

        assert_eq!(count_index_artifacts(dir.path()), Some(2));
    }

    #[test]
    fn test_count_index_artifacts_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(count_index_artifacts(&dir.path().join("nope")), None);
    }

    #[test]
    fn test_short_version_clips_long_lines() {
        let long = "x".repeat(80);
        let clipped = short_version(&long);
        assert_eq!(clipped.chars().count(), 63);
        assert!(clipped.ends_with("..."));

        assert_eq!(short_version("6.1.1 Copyright\nextra"), "6.1.1 Copyright");
        assert_eq!(short_version(""), "installed");
    }

    #[test]
    fn test_format_size_picks_unit() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_mask_key_keeps_prefix_and_suffix() {
        let masked = mask_key("sk-proj-abcdefghijklmnop1234");
        assert_eq!(masked, "sk-proj...1234");
    }
}
