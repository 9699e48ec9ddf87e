//! Keyboard state captured alongside an action.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier keys held while the action was recorded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Modifiers: u32 {
        const SHIFT = 1;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyPhase {
    Down = 0,
    Up = 1,
    Press = 2,
}

impl KeyPhase {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Down),
            1 => Some(Self::Up),
            2 => Some(Self::Press),
            _ => None,
        }
    }
}

/// Snapshot of the last key event seen by the presenter's tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key_code: u32,
    pub modifiers: Modifiers,
    pub phase: KeyPhase,
}

impl KeyEvent {
    pub fn new(key_code: u32, modifiers: Modifiers, phase: KeyPhase) -> Self {
        Self {
            key_code,
            modifiers,
            phase,
        }
    }

    pub fn is_shift_down(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    pub fn is_ctrl_down(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    pub fn is_alt_down(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }
}
