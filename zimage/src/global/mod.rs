//! Global singletons.

pub mod settings;

pub use settings::UserSettings;
