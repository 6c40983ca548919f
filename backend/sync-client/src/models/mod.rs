//! Authoritative data the helper reports: sync settings and sync status.

pub mod settings;
pub mod status;

pub use settings::Settings;
pub use status::Status;
