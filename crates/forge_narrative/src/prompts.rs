//! Prompt templates.

/// Image prompt for one panel, asking the model to keep the subject of the
/// reference photo recognisable.
///
/// # Examples
///
/// ```
/// let prompt =
///     forge_narrative::panel_prompt("A brave space explorer", "Escapes in their spaceship.");
/// assert!(prompt.contains("The main character is A brave space explorer."));
/// assert!(prompt.contains("\"Escapes in their spaceship.\""));
/// ```
pub fn panel_prompt(persona: &str, line: &str) -> String {
    format!(
        "Illustrate a scene for a science fiction comic book. The main character is {persona}. \
         In this panel, the character is in a dramatic moment: \"{line}\". The art style should be \
         vibrant and action-packed, like a classic comic. It is crucial to maintain the \
         character's appearance from the provided image."
    )
}

/// Instruction preceding the panels in the script-extraction call.
pub(crate) fn script_prompt(panel_count: usize) -> String {
    format!(
        "You are writing the dialogue for a {panel_count}-panel comic. The panels follow, each \
         introduced by its number and the story beat it illustrates. For every panel write zero \
         or more short spoken lines (at most two sentences each) that fit the scene, naming the \
         speaker. Use \"Narrator\" for narration. Return a JSON array of objects with the fields \
         \"panel\" (the 1-based panel number), \"speaker\" and \"line\", in reading order."
    )
}

/// Label introducing one panel in the script-extraction call.
pub(crate) fn panel_label(panel_index: usize, line: &str) -> String {
    format!("Panel {panel_index}: {line}")
}
