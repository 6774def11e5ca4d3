//! Speaker label to voice id mapping.

use serde::{Deserialize, Serialize};

/// Ordered substring rules from speaker labels to voice ids.
///
/// The first rule whose key occurs in the lowercased speaker label wins;
/// unmatched speakers get the default voice.
///
/// # Examples
///
/// ```
/// use forge_narrative::VoiceTable;
///
/// let voices = VoiceTable::new("default-voice").with_voice("captain", "captain-voice");
/// assert_eq!(voices.voice_for("Star Captain Vega"), "captain-voice");
/// assert_eq!(voices.voice_for("Ship AI"), "default-voice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceTable {
    rules: Vec<(String, String)>,
    default_voice: String,
}

impl VoiceTable {
    /// Table with no rules.
    pub fn new(default_voice: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            default_voice: default_voice.into(),
        }
    }

    /// Append a rule; `key` is matched case-insensitively.
    pub fn with_voice(mut self, key: impl Into<String>, voice_id: impl Into<String>) -> Self {
        self.rules.push((key.into().to_lowercase(), voice_id.into()));
        self
    }

    /// Voice for `speaker`.
    pub fn voice_for(&self, speaker: &str) -> &str {
        let speaker = speaker.to_lowercase();
        self.rules
            .iter()
            .find(|(key, _)| speaker.contains(key.as_str()))
            .map(|(_, voice)| voice.as_str())
            .unwrap_or(&self.default_voice)
    }

    /// Voice for unmatched speakers.
    pub fn default_voice(&self) -> &str {
        &self.default_voice
    }
}

impl Default for VoiceTable {
    /// Stock voices of the hosted speech service.
    fn default() -> Self {
        Self::new("21m00Tcm4TlvDq8ikWAM")
            .with_voice("narrator", "JBFqnCBsd6RMkjVDRZzb")
            .with_voice("captain", "pNInz6obpgDQGcFmaJgB")
            .with_voice("hero", "TX3LPaxmHKxFdv7VOQHJ")
            .with_voice("villain", "N2lVS1w4EtoT3dr4eOWO")
            .with_voice("alien", "IKne3meq5aSn9XLyUdCD")
            .with_voice("robot", "onwK4e9ZLuTAKqWW03F9")
            .with_voice("detective", "nPczCjzI2devNBz1zQrb")
    }
}
