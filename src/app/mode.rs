//! LED behaviour selector.
//!
//! Internal code matches on [`Mode`]; the string forms exist only at the
//! configuration-surface boundary ([`Mode::parse`] / [`Mode::as_str`]).

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Mode {
    /// All LEDs off.
    #[default]
    Default = 0,
    /// All LEDs on, steady.
    On = 1,
    /// Three-LED chase, `burstCount` passes per trigger.
    Burst = 2,
}

impl Mode {
    /// Parse the surface form.  Accepts `default`/`0`, `on`/`1`, `burst`,
    /// case-insensitively, ignoring surrounding whitespace.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.eq_ignore_ascii_case("default") || s == "0" {
            Some(Self::Default)
        } else if s.eq_ignore_ascii_case("on") || s == "1" {
            Some(Self::On)
        } else if s.eq_ignore_ascii_case("burst") {
            Some(Self::Burst)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::On => "on",
            Self::Burst => "burst",
        }
    }

    /// Inverse of `self as u8`, for atomic storage.
    pub(crate) fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::On,
            2 => Self::Burst,
            _ => Self::Default,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
