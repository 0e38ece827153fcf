use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxloopError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    /// Non-2xx response from the backend. Carries the server's `detail`
    /// message when the error body had one, else "Server error: {status}".
    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Transport(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
