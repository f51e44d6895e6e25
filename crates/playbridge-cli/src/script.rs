//! Scripted steps for `playbridge simulate`
//!
//! Each step is `name` or `name:argument`, e.g. `ready`, `seek:-500`,
//! `key:KEYCODE_DPAD_CENTER`, `wait:250`.

use anyhow::{anyhow, bail, Result};
use playbridge_core::{TouchAction, TrackOrigin};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    // Host commands
    Play,
    Pause,
    Seek(i64),
    SetStream(String),
    State,
    Close,
    // Engine callbacks
    Ready,
    End,
    Advance(u64),
    Fail { origin: TrackOrigin, message: String },
    // Surface signals
    Dismiss,
    Key(String),
    Touch(TouchAction),
    // Pacing
    Wait(Duration),
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };

        let need = |what: &str| arg.ok_or_else(|| anyhow!("step '{}' needs {}", name, what));

        let step = match name.to_lowercase().as_str() {
            "play" => Step::Play,
            "pause" => Step::Pause,
            "seek" => Step::Seek(need("a position in ms")?.parse()?),
            "stream" => Step::SetStream(need("a URI")?.to_string()),
            "state" => Step::State,
            "close" => Step::Close,
            "ready" => Step::Ready,
            "end" => Step::End,
            "advance" => Step::Advance(need("a duration in ms")?.parse()?),
            "fail" => Step::Fail {
                origin: TrackOrigin::Primary,
                message: arg.unwrap_or("simulated failure").to_string(),
            },
            "fail-subtitle" => Step::Fail {
                origin: TrackOrigin::Subtitle,
                message: arg.unwrap_or("simulated subtitle failure").to_string(),
            },
            "dismiss" => Step::Dismiss,
            "key" => Step::Key(need("a key code")?.to_string()),
            "touch" => Step::Touch(match need("an action")?.to_lowercase().as_str() {
                "down" => TouchAction::Down,
                "up" => TouchAction::Up,
                "move" => TouchAction::Move,
                "cancel" => TouchAction::Cancel,
                other => bail!("unknown touch action '{}'", other),
            }),
            "wait" => Step::Wait(Duration::from_millis(need("a duration in ms")?.parse()?)),
            other => bail!("unknown step '{}'", other),
        };

        Ok(step)
    }
}
