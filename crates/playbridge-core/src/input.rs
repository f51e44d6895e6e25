//! Key and touch input rules for the presentation surface

use crate::types::TouchAction;

/// Keys the host OS must keep handling itself
const SYSTEM_KEYS: &[&str] = &[
    "KEYCODE_VOLUME_UP",
    "KEYCODE_VOLUME_DOWN",
    "KEYCODE_VOLUME_MUTE",
    "KEYCODE_BACK",
];

/// True for keys that pass through to the OS instead of reaching the client.
/// Surfaces call this synchronously to decide whether to consume the key.
pub fn is_system_key(code: &str) -> bool {
    SYSTEM_KEYS.contains(&code)
}

/// Forwards a touch action only when it differs from the previous one
#[derive(Debug, Default)]
pub struct TouchDeduper {
    previous: Option<TouchAction>,
}

impl TouchDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `action` should be forwarded
    pub fn accept(&mut self, action: TouchAction) -> bool {
        if self.previous == Some(action) {
            return false;
        }
        self.previous = Some(action);
        true
    }
}
