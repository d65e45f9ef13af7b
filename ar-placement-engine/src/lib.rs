//! AR model placement: surface detection, gated tap placement and a
//! registry of placed instances, with exploration mode around it.

/// Placement core, platforms and visuals.
pub mod ar;

/// Application shell: camera, model, settings, app construction.
pub mod engine;

/// JSON-RPC bridge to the host page.
pub mod rpc;
