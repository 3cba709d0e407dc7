pub mod app;
pub mod branding;
pub mod config;
pub mod dbus;
pub mod de_packages;
pub mod desktops;
pub mod error;
pub mod flags;
pub mod models;
pub mod network_setup;
pub mod scheduler;
pub mod store;
pub mod viewstep;

pub use error::{Error, Result};
