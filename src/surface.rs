use tracing::debug;

use crate::config::UiConfig;
use crate::progress::ProcessingStep;
use crate::selection::format_size;

/// Mutually exclusive display states. Exactly one is current at any time;
/// switching views is the only rendering side effect the controller performs.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Upload,
    Loading,
    Success {
        audio_url: String,
        saved_to: Option<std::path::PathBuf>,
    },
    Error {
        message: String,
    },
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Upload => write!(f, "upload"),
            View::Loading => write!(f, "loading"),
            View::Success { .. } => write!(f, "success"),
            View::Error { .. } => write!(f, "error"),
        }
    }
}

/// Capability interface between the session controller and whatever renders
/// it. The controller never touches a concrete output technology.
pub trait DisplaySurface: Send {
    fn show_view(&mut self, view: &View);
    fn set_step(&mut self, step: ProcessingStep);
    fn show_selection(&mut self, name: &str, size: u64);
}

/// Console rendering of the session views.
pub struct ConsoleSurface {
    show_steps: bool,
}

impl ConsoleSurface {
    pub fn new(config: &UiConfig) -> Self {
        Self {
            show_steps: config.show_steps,
        }
    }
}

impl DisplaySurface for ConsoleSurface {
    fn show_view(&mut self, view: &View) {
        debug!("View -> {}", view);
        match view {
            View::Upload => {
                println!("Ready. Select an audio file (wav, mp3 or m4a) to begin.");
            }
            View::Loading => {
                println!("Uploading and processing...");
            }
            View::Success { audio_url, saved_to } => {
                println!("Reply ready: {}", audio_url);
                if let Some(path) = saved_to {
                    println!("Saved to: {}", path.display());
                }
            }
            View::Error { message } => {
                println!("Error: {}", message);
            }
        }
    }

    fn set_step(&mut self, step: ProcessingStep) {
        if !self.show_steps {
            return;
        }
        match step {
            ProcessingStep::Complete => println!("{}", step.status_line()),
            _ => println!("[{}/3] {}", step.position(), step.status_line()),
        }
    }

    fn show_selection(&mut self, name: &str, size: u64) {
        println!("Selected: {} ({})", name, format_size(size));
    }
}
