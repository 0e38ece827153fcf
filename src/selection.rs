use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::VoxloopError;

/// Extensions the backend pipeline accepts
pub const ALLOWED_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a"];

/// MIME aliases matching the allowed extensions
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "audio/wav",
    "audio/mpeg",
    "audio/mp3",
    "audio/m4a",
    "audio/x-m4a",
    "audio/mp4",
];

/// A staged recording waiting to be uploaded. At most one exists at a time,
/// owned by the session controller.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime: String,
}

impl FileCandidate {
    pub async fn from_path(path: &Path) -> Result<Self, VoxloopError> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            VoxloopError::Validation(format!("Cannot read {}: {}", path.display(), e))
        })?;

        if !metadata.is_file() {
            return Err(VoxloopError::Validation(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                VoxloopError::Validation(format!("{} has no file name", path.display()))
            })?;

        let mime = mime_for_name(&name).to_string();

        debug!("Staged candidate: {} ({} bytes, {})", name, metadata.len(), mime);

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
            mime,
        })
    }

    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

/// Last dot-separated segment of the lower-cased name. A name without a dot
/// yields the whole name.
fn extension_of(name: &str) -> String {
    let lower = name.to_lowercase();
    lower.rsplit('.').next().unwrap_or(&lower).to_string()
}

fn mime_for_name(name: &str) -> &'static str {
    match extension_of(name).as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/m4a",
        _ => "application/octet-stream",
    }
}

/// Accept when the declared MIME is listed or the extension is listed;
/// rejection requires both checks to fail.
pub fn validate_candidate(name: &str, mime: &str) -> Result<(), VoxloopError> {
    let extension = extension_of(name);

    if !ALLOWED_MIME_TYPES.contains(&mime) && !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(VoxloopError::Validation(
            "Invalid file type. Please upload a WAV, MP3 or M4A file.".to_string(),
        ));
    }

    Ok(())
}

/// Human-readable file size: at most two decimal places, trailing zeros
/// trimmed. Units stop at GB.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let k = 1024f64;
    let i = ((bytes as f64).ln() / k.ln()).floor() as usize;
    let i = i.min(UNITS.len() - 1);
    let value = bytes as f64 / k.powi(i as i32);

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_allowed_extensions() {
        for name in ["clip.wav", "clip.mp3", "clip.m4a", "CLIP.WAV", "a.b.MP3"] {
            assert!(
                validate_candidate(name, "application/octet-stream").is_ok(),
                "{} should be accepted by extension",
                name
            );
        }
    }

    #[test]
    fn test_validate_allowed_mime_with_odd_extension() {
        // Declared MIME alone is enough
        assert!(validate_candidate("clip.bin", "audio/wav").is_ok());
        assert!(validate_candidate("clip", "audio/mp4").is_ok());
    }

    #[test]
    fn test_validate_mismatched_but_allowed() {
        // Extension wav with an mp3 MIME still passes: either check suffices
        assert!(validate_candidate("clip.wav", "audio/mpeg").is_ok());
    }

    #[test]
    fn test_validate_rejects_both_failing() {
        let err = validate_candidate("clip.ogg", "audio/ogg").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid file type. Please upload a WAV, MP3 or M4A file."
        );
    }

    #[test]
    fn test_validate_rejects_extensionless_unknown() {
        assert!(validate_candidate("clip", "text/plain").is_err());
    }

    #[test]
    fn test_format_size_zero() {
        assert_eq!(format_size(0), "0 Bytes");
    }

    #[test]
    fn test_format_size_exact_kilobyte() {
        assert_eq!(format_size(1024), "1 KB");
    }

    #[test]
    fn test_format_size_fractional() {
        assert_eq!(format_size(1536), "1.5 KB");
    }

    #[test]
    fn test_format_size_small() {
        assert_eq!(format_size(512), "512 Bytes");
    }

    #[test]
    fn test_format_size_megabytes() {
        assert_eq!(format_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_size(1024 * 1024 + 512 * 1024), "1.5 MB");
    }

    #[test]
    fn test_extension_of_without_dot() {
        assert_eq!(extension_of("recording"), "recording");
        assert_eq!(extension_of("Recording.M4A"), "m4a");
    }

    #[tokio::test]
    async fn test_candidate_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hello.wav");
        tokio::fs::write(&path, b"RIFFxxxx").await.unwrap();

        let candidate = FileCandidate::from_path(&path).await.unwrap();
        assert_eq!(candidate.name, "hello.wav");
        assert_eq!(candidate.size, 8);
        assert_eq!(candidate.mime, "audio/wav");
        assert_eq!(candidate.extension(), "wav");
    }

    #[tokio::test]
    async fn test_candidate_from_missing_path() {
        let result = FileCandidate::from_path(Path::new("/nonexistent/clip.wav")).await;
        assert!(result.is_err());
    }
}
