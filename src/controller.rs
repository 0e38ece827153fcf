use tracing::{error, info, warn};

use crate::backend::BackendClient;
use crate::config::Config;
use crate::playback::AudioPlayer;
use crate::progress::{self, ProcessingStep};
use crate::selection::{self, FileCandidate};
use crate::surface::{DisplaySurface, View};

/// Owns all session state: the staged file, the current view, and the
/// in-flight guard. Every mutation goes through its public operations, and
/// every rendering side effect goes through the injected surface.
pub struct SessionController {
    config: Config,
    surface: Box<dyn DisplaySurface>,
    player: AudioPlayer,
    selected: Option<FileCandidate>,
    view: View,
    in_flight: bool,
}

impl SessionController {
    pub fn new(config: Config, surface: Box<dyn DisplaySurface>) -> Self {
        let player = AudioPlayer::new(&config.playback);
        let mut controller = Self {
            config,
            surface,
            player,
            selected: None,
            view: View::Upload,
            in_flight: false,
        };
        controller.surface.show_view(&View::Upload);
        controller
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn selected(&self) -> Option<&FileCandidate> {
        self.selected.as_ref()
    }

    pub fn can_process(&self) -> bool {
        self.selected.is_some() && !self.in_flight
    }

    fn set_view(&mut self, view: View) {
        self.surface.show_view(&view);
        self.view = view;
    }

    /// Stage a candidate after validating it against the allow-list. A
    /// rejected candidate reports through the surface and leaves any
    /// previous selection untouched; nothing propagates to the caller.
    pub fn select_file(&mut self, candidate: FileCandidate) {
        if let Err(e) = selection::validate_candidate(&candidate.name, &candidate.mime) {
            warn!("Rejected {}: {}", candidate.name, e);
            self.set_view(View::Error {
                message: e.to_string(),
            });
            return;
        }

        info!("Selected {} ({} bytes)", candidate.name, candidate.size);
        self.surface.show_selection(&candidate.name, candidate.size);
        self.selected = Some(candidate);
        self.set_view(View::Upload);
    }

    /// Unconditionally drop the selection and return to the upload view.
    /// Calling it twice is the same as calling it once.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.set_view(View::Upload);
    }

    /// Reset from the error view so another file can be selected.
    pub fn retry(&mut self) {
        info!("Retrying after error");
        self.clear_selection();
    }

    /// Reset from the success view so another file can be submitted.
    pub fn new_recording(&mut self) {
        info!("Starting over");
        self.clear_selection();
    }

    /// Upload the staged file and settle into the success or error view.
    /// Performs no network call unless a file is staged, a backend URL is
    /// configured, and no upload is already in flight.
    pub async fn process_selection(&mut self) {
        if self.in_flight {
            warn!("Upload already in flight, ignoring");
            return;
        }

        let Some(candidate) = self.selected.clone() else {
            self.set_view(View::Error {
                message: "No audio file selected.".to_string(),
            });
            return;
        };

        let client = match BackendClient::new(&self.config.backend) {
            Ok(client) => client,
            Err(e) => {
                self.set_view(View::Error {
                    message: e.to_string(),
                });
                return;
            }
        };

        self.in_flight = true;
        self.set_view(View::Loading);
        self.surface.set_step(ProcessingStep::Transcribing);

        let result =
            progress::drive(self.surface.as_mut(), client.process_audio(&candidate)).await;

        match result {
            Ok(reply) => {
                self.surface.set_step(ProcessingStep::Complete);
                tokio::time::sleep(progress::COMPLETE_PAUSE).await;
                self.finish_success(&client, &reply.response_audio_url).await;
            }
            Err(e) => {
                error!("Processing failed: {}", e);
                self.set_view(View::Error {
                    message: e.to_string(),
                });
                // Upload view re-shown underneath; the selection is kept so
                // the user can process again without re-selecting.
                self.surface.show_view(&View::Upload);
            }
        }

        self.in_flight = false;
    }

    async fn finish_success(&mut self, client: &BackendClient, relative_url: &str) {
        let audio_url = client.audio_url(relative_url);

        // The primary call already succeeded; a failed download or player
        // spawn is reported on the success view, never a state transition.
        let saved_to = match client.fetch_audio(relative_url).await {
            Ok(bytes) => match self.player.save_reply(relative_url, &bytes).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Could not save reply audio: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Could not download reply audio: {}", e);
                None
            }
        };

        self.set_view(View::Success {
            audio_url,
            saved_to: saved_to.clone(),
        });

        if self.config.playback.autoplay {
            if let Some(path) = saved_to {
                if let Err(e) = self.player.play(&path).await {
                    warn!("Autoplay failed: {}", e);
                }
            }
        }
    }
}
