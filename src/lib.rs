pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod playback;
pub mod progress;
pub mod selection;
pub mod surface;

pub use backend::BackendClient;
pub use config::Config;
pub use controller::SessionController;
pub use error::VoxloopError;
pub use playback::AudioPlayer;
pub use surface::ConsoleSurface;
