use display_interface::DisplayError;

/// Result type used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong between the CAN controllers and the panel
///
/// ESP-IDF failures carry the raw `esp_err_t` code so the type stays the same
/// on the host and on the device.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to install CAN controller {controller} (esp_err_t {code})")]
    BusConfig { controller: u8, code: i32 },

    #[error("Failed to start CAN controller {controller} (esp_err_t {code})")]
    BusStart { controller: u8, code: i32 },

    #[error("Failed to receive any CAN data on controller {controller} (esp_err_t {code})")]
    Receive { controller: u8, code: i32 },

    #[error("Timed out waiting for a CAN frame")]
    Timeout,

    #[error("CAN input closed")]
    Closed,

    #[error("Could not parse CAN frame {line:?}: {reason}")]
    FrameParse { line: String, reason: &'static str },

    #[error("Display failure: {0:?}")]
    Display(DisplayError),

    #[error("ESP-IDF call {op} failed (esp_err_t {code})")]
    Esp { op: &'static str, code: i32 },

    #[error("Timed out waiting for the display lock")]
    LockTimeout,

    #[error("Display lock poisoned by a panicking thread")]
    LockPoisoned,

    #[error("Brightness must be 0-100 percent, got {0}")]
    InvalidBrightness(u8),

    #[error("Could not install the logger: {0}")]
    Logging(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Error::Display(e)
    }
}
