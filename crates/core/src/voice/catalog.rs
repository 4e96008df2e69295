use crate::voice::Voice;

/// The set of voices last reported by the platform, plus the user's current
/// selection (by voice name).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    selected: Option<String>,
}

impl VoiceCatalog {
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_voice(&self) -> Option<&Voice> {
        let name = self.selected.as_deref()?;
        self.voices.iter().find(|v| v.name == name)
    }

    /// Replaces the catalog wholesale (no incremental diffing).
    ///
    /// A still-present selection is kept. Otherwise the default rule runs:
    /// exact match on `preferred`, else the first entry, else no selection.
    pub fn replace(&mut self, voices: Vec<Voice>, preferred: &str) {
        self.voices = voices;

        let selection_still_valid = self
            .selected
            .as_deref()
            .is_some_and(|name| self.voices.iter().any(|v| v.name == name));

        if !selection_still_valid {
            self.selected = self
                .voices
                .iter()
                .find(|v| v.name == preferred)
                .or_else(|| self.voices.first())
                .map(|v| v.name.clone());
        }
    }

    /// Selects a voice by name. Names not present in the catalog are ignored.
    pub fn select(&mut self, name: &str) -> bool {
        if self.voices.iter().any(|v| v.name == name) {
            self.selected = Some(name.to_owned());
            true
        } else {
            false
        }
    }
}
