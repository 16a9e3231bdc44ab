use serde::{Deserialize, Serialize};

use crate::models::User;

/// Events pushed to the UI over the event WebSocket.
///
/// This is the typed replacement for an ambient signal bus: anything that
/// wants to react to an account switch subscribes to the user store and
/// receives these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AppEvent {
    /// The active account changed (switch, rename or avatar update).
    /// User-scoped views must refresh.
    UserChanged { user: User },
}
