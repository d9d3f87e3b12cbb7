// Magazine Conveyor - contiguous slot allocation for linear and rotary magazines

#![warn(rust_2018_idioms)]

pub mod config;
pub mod magazine;
pub mod metrics;

// Re-exports for convenience
pub use config::MagazineConfig;
pub use magazine::{find_run, AllocationResult, Conveyor, Magazine, MagazineEvent};

/// Magazine error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid run length: {0} (must be at least 1)")]
        InvalidRunLength(usize),

        #[error("Active capacity {requested} exceeds {total} slots")]
        CapacityOutOfRange { requested: usize, total: usize },

        #[error("Slot index {index} out of range for {total} slots")]
        SlotOutOfRange { index: usize, total: usize },

        #[error("Configuration error: {0}")]
        Config(String),
    }

    impl From<::config::ConfigError> for Error {
        fn from(e: ::config::ConfigError) -> Self {
            Error::Config(e.to_string())
        }
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
