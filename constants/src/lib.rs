//! Shared tuning values for the AR placement engine.

pub mod ar_placement;
pub mod render_settings;
