//! JSON-RPC 2.0 layer between the engine and the host page.
//!
//! The engine runs in an iframe and talks to its parent over `postMessage`.
//! Two kinds of callers share the channel: the page UI (AR controls and
//! state queries) and the page's WebXR session glue (hit-test sources, viewer
//! pose and select gestures).
//!
//! ## Message Flow
//!
//! ```text
//! Page (Parent Window)   <──postMessage──>  Bevy (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Process request
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        ├─ Bridge call (no ID) ────────────────> │
//!        │ <────────── Notification (no ID) ─────┤
//! ```
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//!
//! ## Methods
//!
//! ### AR Controls
//! - `enter_ar` / `exit_ar`: Start or end the AR session
//! - `toggle_placement`: Flip placement mode
//! - `clear_scene`: Remove every placed instance
//! - `hud_activate`: Run a HUD control (`clear_scene`, `toggle_placement`)
//!
//! ### Queries
//! - `get_placed_instances`: Ids and poses of placed instances
//! - `get_surface_state`: Session, placement and surface detection state
//!
//! ### WebXR Bridge
//! - `hit_test_source_ready` / `hit_test_source_failed`: Answer a source request
//! - `hit_test_result`: First hit of a source this frame, or `null`
//! - `viewer_pose`: Viewer pose in the local space
//! - `select`: Select gesture, with the target ray when available
//!
//! ### Notifications To The Page
//! - `ar_log`: Every user-facing log line
//! - `request_hit_test_source` / `cancel_hit_test_source`
//! - `bind_select` / `unbind_select`

/// Message listener, request dispatch and outgoing queue.
pub mod web_rpc;

/// WebXR-backed AR platform fed by bridge calls.
pub mod webxr_bridge;
