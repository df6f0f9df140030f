use thiserror::Error;

/// Result type returned from functions that can have our `Error`s.
pub type Result<T, E = CubiclightError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CubiclightError {
    #[error("cannot connect to display: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("display connection lost: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("display server rejected a request: {0}")]
    Request(#[from] x11rb::errors::ReplyError),

    #[error("unsupported randr version {0}.{1}")]
    UnsupportedRandr(u32, u32),

    #[error("no backlight support on this display")]
    BacklightUnsupported,

    #[error("no output exposes a usable backlight range")]
    NoDevice,

    #[error("notch count must be at least 1")]
    InvalidNotchCount,

    #[error("notch solver hit a flat point on the brightness curve")]
    SolverStalled,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
