mod catalog;
mod gender;

use serde::{Deserialize, Serialize};

pub use catalog::VoiceCatalog;
pub use gender::classify;

/// A synthetic speaking profile supplied by the external platform.
///
/// Cached by value after each catalog query; the platform owns the real
/// entity and may change the set at any time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub language: String,
}

impl Voice {
    pub fn new<N: Into<String>, L: Into<String>>(name: N, language: L) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }

    /// Best-effort gender label for UI iconography. Derived from the display
    /// name, never reported by the platform.
    pub fn gender(&self) -> Gender {
        gender::classify(&self.name)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
    Unknown,
}

impl Gender {
    pub fn icon(&self) -> &'static str {
        match self {
            Gender::Female => "👩",
            Gender::Male => "👨",
            Gender::Unknown => "🎤",
        }
    }
}
