use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PlaybackConfig;
use crate::error::VoxloopError;

/// Plays downloaded replies through whatever player the machine has.
/// Playback is best-effort; the saved file outlives any failure so the
/// user can always play it manually.
pub struct AudioPlayer {
    config: PlaybackConfig,
    has_mpv: bool,
    has_ffplay: bool,
}

impl AudioPlayer {
    pub fn new(config: &PlaybackConfig) -> Self {
        let has_mpv = which::which("mpv").is_ok();
        let has_ffplay = which::which("ffplay").is_ok();

        debug!("Playback capabilities: mpv={}, ffplay={}", has_mpv, has_ffplay);

        Self {
            config: config.clone(),
            has_mpv,
            has_ffplay,
        }
    }

    /// Destination for a reply. Extension from the reply URL when it has
    /// one, else mp3 (what the pipeline emits).
    pub fn reply_path(&self, relative_url: &str) -> PathBuf {
        let extension = match relative_url.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => ext,
            _ => "mp3",
        };
        PathBuf::from(&self.config.temp_dir)
            .join(format!("reply_{}.{}", Uuid::new_v4(), extension))
    }

    pub async fn save_reply(
        &self,
        relative_url: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, VoxloopError> {
        let path = self.reply_path(relative_url);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        info!("Reply audio saved: {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    fn resolve_player(&self) -> Option<(String, Vec<&'static str>)> {
        match self.config.player.as_str() {
            "auto" => {
                if self.has_mpv {
                    Some(("mpv".to_string(), vec!["--no-video", "--really-quiet"]))
                } else if self.has_ffplay {
                    Some((
                        "ffplay".to_string(),
                        vec!["-nodisp", "-autoexit", "-loglevel", "quiet"],
                    ))
                } else {
                    None
                }
            }
            custom => Some((custom.to_string(), Vec::new())),
        }
    }

    pub async fn play(&self, path: &Path) -> Result<(), VoxloopError> {
        let (binary, args) = self.resolve_player().ok_or_else(|| {
            VoxloopError::Playback("no audio player found (install mpv or ffplay)".to_string())
        })?;

        info!("Playing {} with {}", path.display(), binary);

        let status = Command::new(&binary)
            .args(&args)
            .arg(path)
            .status()
            .await
            .map_err(|e| VoxloopError::Playback(format!("failed to run {}: {}", binary, e)))?;

        if !status.success() {
            return Err(VoxloopError::Playback(format!(
                "{} exited with {}",
                binary, status
            )));
        }

        Ok(())
    }
}
