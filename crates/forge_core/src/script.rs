//! Per-panel dialogue script.

use serde::{Deserialize, Deserializer, Serialize};

/// One line of dialogue attached to a panel.
///
/// Serialized with the field names the script-extraction schema uses
/// (`panel`, `speaker`, `line`). A negative `panel` deserializes to 0, which
/// names no panel, so one bad entry does not reject the whole script.
///
/// # Examples
///
/// ```
/// use forge_core::ScriptEntry;
///
/// let entries: Vec<ScriptEntry> = serde_json::from_str(
///     r#"[{"panel": 1, "speaker": "Captain", "line": "Who sent that signal?"}]"#,
/// ).unwrap();
/// assert_eq!(*entries[0].panel_index(), 1);
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct ScriptEntry {
    /// 1-based panel index
    #[serde(rename = "panel", deserialize_with = "panel_number")]
    panel_index: usize,
    /// Speaker label
    speaker: String,
    /// Spoken line
    line: String,
}

impl ScriptEntry {
    /// Create an entry.
    pub fn new(panel_index: usize, speaker: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            panel_index,
            speaker: speaker.into(),
            line: line.into(),
        }
    }

    /// JSON schema of the script array, in the service's schema dialect.
    pub fn array_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "panel": { "type": "INTEGER" },
                    "speaker": { "type": "STRING" },
                    "line": { "type": "STRING" }
                },
                "required": ["panel", "speaker", "line"]
            }
        })
    }
}

/// Any JSON integer; negatives become 0 and values past `usize` saturate.
fn panel_number<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    struct PanelNumber;

    impl serde::de::Visitor<'_> for PanelNumber {
        type Value = usize;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an integer panel number")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<usize, E> {
            Ok(usize::try_from(v.max(0)).unwrap_or(usize::MAX))
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<usize, E> {
            Ok(usize::try_from(v).unwrap_or(usize::MAX))
        }
    }

    deserializer.deserialize_i64(PanelNumber)
}
