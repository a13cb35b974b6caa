//! Conversation builder: turns a review's stored messages into the context
//! handed to the model.
//!
//! The model is always shown the review's original code as the user message.
//! What was said before, plus the new instruction, travels in the system
//! message.

use crate::entities::{MessageRole, ReviewMessage};
use crate::gateway::ChatMessage;

/// Render prior messages as a role-tagged transcript, oldest first.
///
/// SYSTEM messages are framing and never replayed.  Each remaining message
/// becomes `<ROLE> body </ROLE>`, one per line.
pub fn render_transcript(messages: &[ReviewMessage]) -> String {
    let mut history: Vec<&ReviewMessage> = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .collect();
    history.sort_by(|a, b| ReviewMessage::chronological(a, b));

    history
        .iter()
        .map(|m| format!("<{role}> {body} </{role}>", role = m.role, body = m.body))
        .collect::<Vec<_>>()
        .join("\n")
}

/// System message for a follow-up turn.
pub fn follow_up_instructions(transcript: &str, new_prompt: &str) -> String {
    [
        "Here is what was discussed before:",
        "<conversation_history>",
        transcript,
        "</conversation_history>",
        "Here is your new task:",
        "<CRITICAL_TASK>",
        new_prompt,
        "</CRITICAL_TASK>",
    ]
    .join("\n")
}

/// Exchange that opens a review: the chosen prompt as system, the code as user.
pub fn opening_exchange(system_prompt: &str, code: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(system_prompt), ChatMessage::user(code)]
}

/// Exchange for a follow-up turn on a review whose original code is `code`.
pub fn follow_up_exchange(history: &[ReviewMessage], code: &str, new_prompt: &str) -> Vec<ChatMessage> {
    let instructions = follow_up_instructions(&render_transcript(history), new_prompt);
    vec![ChatMessage::system(instructions), ChatMessage::user(code)]
}
