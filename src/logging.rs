//! Console logging for the host build
//!
//! The firmware binds `log` to the ESP-IDF console with `EspLogger`. On the
//! host the same records go through a `tracing` subscriber on stderr, so stdout
//! stays free for the replay output. `RUST_LOG` overrides the default `info`.

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

const DEFAULT_FILTER: &str = "info";

/// Install the global logger, fails when one is already installed
pub fn setup() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_is_installed_once() {
        setup().unwrap();
        assert!(matches!(setup(), Err(Error::Logging(_))));
        log::info!("records from the log facade reach the subscriber");
    }
}
