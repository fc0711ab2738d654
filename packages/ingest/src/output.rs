//! Rendering and saving ingestion outcomes.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::types::IngestOutcome;

/// Serialization format of a saved outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Render an outcome as pretty JSON or as a YAML document.
pub fn render(outcome: &IngestOutcome, format: OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(outcome)?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(outcome)?;
            let lines: Vec<&str> = yaml.lines().map(str::trim_end).collect();
            format!("---\n{}\n", lines.join("\n"))
        }
    };
    Ok(content)
}

/// Save an outcome to `path`.
///
/// Writes to a temp file next to the destination, syncs, then renames, so an
/// interrupted write never leaves a truncated file behind.
pub fn save(outcome: &IngestOutcome, format: OutputFormat, path: &Path) -> Result<()> {
    let content = render(outcome, format)?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            IngestError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Output path has no file name: {}", path.display()),
            ))
        })?;
    let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&temp_file, path)?;
    tracing::info!(path = %path.display(), count = outcome.count, "Saved outcome");
    Ok(())
}
