use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} is not a supported desktop choice")]
    UnknownDesktop(String),

    #[error("installer storage is unavailable")]
    StorageUnavailable,

    #[error("D-Bus system bus is not connected")]
    BusUnavailable,

    #[error("D-Bus call failed: {0}")]
    Bus(#[from] zbus::Error),

    #[error("invalid D-Bus value: {0}")]
    Variant(#[from] zvariant::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
