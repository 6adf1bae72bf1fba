// SPDX-License-Identifier: MIT OR Apache-2.0
//! Element settings: visibility flags and looping.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Story flags. Raised by choices, tested by elements before they show.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EventFlags: u32 {
        /// Flag 0
        const FLAG_00 = 1 << 0;
        /// Flag 1
        const FLAG_01 = 1 << 1;
        /// Flag 2
        const FLAG_02 = 1 << 2;
        /// Flag 3
        const FLAG_03 = 1 << 3;
        /// Flag 4
        const FLAG_04 = 1 << 4;
        /// Flag 5
        const FLAG_05 = 1 << 5;
        /// Flag 6
        const FLAG_06 = 1 << 6;
        /// Flag 7
        const FLAG_07 = 1 << 7;
        /// Flag 8
        const FLAG_08 = 1 << 8;
        /// Flag 9
        const FLAG_09 = 1 << 9;

        // Documents may carry any bit pattern
        const _ = !0;
    }
}

/// Type of setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingKind {
    /// Visibility flags
    Flags,
    /// Looping playback
    Loop,
}

impl SettingKind {
    /// Type tag used in documents
    pub fn code(self) -> i32 {
        match self {
            Self::Flags => 0,
            Self::Loop => 1,
        }
    }

    /// Look up a type tag
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Flags),
            1 => Some(Self::Loop),
            _ => None,
        }
    }
}

/// A small typed configuration value attached to an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Setting {
    /// Element is only shown when it shares a flag with the player (empty = always)
    Flags(EventFlags),
    /// Sound loops while active
    Loop(bool),
}

impl Setting {
    /// Default value for a setting kind
    pub fn default_for(kind: SettingKind) -> Self {
        match kind {
            SettingKind::Flags => Setting::Flags(EventFlags::empty()),
            SettingKind::Loop => Setting::Loop(false),
        }
    }

    /// Setting kind
    pub fn kind(&self) -> SettingKind {
        match self {
            Setting::Flags(_) => SettingKind::Flags,
            Setting::Loop(_) => SettingKind::Loop,
        }
    }

    /// Overwrite with `value` if it is the same kind. Returns whether it applied.
    pub fn apply(&mut self, value: Setting) -> bool {
        if self.kind() != value.kind() {
            return false;
        }
        *self = value;
        true
    }
}
