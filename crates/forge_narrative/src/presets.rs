//! Built-in story presets.

use forge_error::{ForgeResult, NarrativeError, NarrativeErrorKind};

/// Persona used when none is supplied.
pub const DEFAULT_PERSONA: &str = "A brave space explorer";

/// Narrative used when none is supplied.
pub const DEFAULT_NARRATIVE: &str = "Discovers a mysterious artifact.\n\
Outsmarts a lurking alien creature.\n\
Escapes in their spaceship.";

/// A ready-made persona and three-beat narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    /// Lookup key, e.g. `sci-fi`
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    /// Display emoji
    pub emoji: &'static str,
    /// Main character description
    pub persona: &'static str,
    /// Story beats, one per panel
    pub lines: [&'static str; 3],
}

impl Preset {
    /// The beats joined one per line.
    pub fn narrative(&self) -> String {
        self.lines.join("\n")
    }
}

const PRESETS: [Preset; 4] = [
    Preset {
        key: "sci-fi",
        name: "Sci-Fi",
        emoji: "🚀",
        persona: "A grizzled star captain on their last voyage",
        lines: [
            "Receives a distress signal from a ghost ship.",
            "Boards the vessel and finds it eerily empty.",
            "Discovers the ship's log, revealing a terrifying secret.",
        ],
    },
    Preset {
        key: "fantasy",
        name: "Fantasy",
        emoji: "⚔️",
        persona: "A rookie adventurer in a monster-filled dungeon",
        lines: [
            "Accidentally triggers a hidden trap.",
            "Finds a legendary sword in a secret chamber.",
            "Confronts the fearsome dungeon boss.",
        ],
    },
    Preset {
        key: "noir",
        name: "Noir",
        emoji: "🕵️",
        persona: "A cynical private eye in a rain-slicked city",
        lines: [
            "Takes on a case from a mysterious femme fatale.",
            "Uncovers a conspiracy that goes to the very top.",
            "Faces a moral choice in a shadowy back alley.",
        ],
    },
    Preset {
        key: "superhero",
        name: "Superhero",
        emoji: "💥",
        persona: "A rookie hero trying to prove themselves",
        lines: [
            "Stops a high-tech bank robbery.",
            "Discovers the villain's secret weakness.",
            "Saves the city in a climactic showdown.",
        ],
    },
];

/// All presets in display order.
pub fn presets() -> &'static [Preset] {
    &PRESETS
}

/// Look a preset up by key, ignoring case.
///
/// # Errors
///
/// `PresetNotFound` for an unknown key.
///
/// # Examples
///
/// ```
/// let noir = forge_narrative::preset("Noir").unwrap();
/// assert_eq!(noir.lines.len(), 3);
/// assert!(forge_narrative::preset("western").is_err());
/// ```
pub fn preset(key: &str) -> ForgeResult<&'static Preset> {
    PRESETS
        .iter()
        .find(|p| p.key.eq_ignore_ascii_case(key))
        .ok_or_else(|| {
            NarrativeError::new(NarrativeErrorKind::PresetNotFound(key.to_string())).into()
        })
}
