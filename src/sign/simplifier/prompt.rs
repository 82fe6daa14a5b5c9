//! Simplification prompt construction.
//!
//! Transcripts are untrusted speech-to-text output.  Before they are framed
//! into the prompt, chat-template control tokens are stripped and
//! instruction-like phrases are flagged for the log.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Instruction given to the model ahead of every transcript.
pub const SIMPLIFICATION_INSTRUCTION: &str = "\
You are an assistant for Deaf and Hard-of-Hearing (DHH) users.
Your only job is to simplify a raw speech transcription.

TASK:
1. Simplify the [Raw Text] into the [Target Language].

SAFETY RULES:
* Do not hallucinate. Never add people, places, objects or actions that are not in the [Raw Text].
* Do not guess. If the [Raw Text] is unclear, translate and simplify it as it is.
* Do not add opinions.

STYLE RULES:
1. Use short, simple sentences and 5th-grade vocabulary.
2. Always use the active voice.
3. Remove all filler words (um, ah, uh, you know, na, toh, matlab) and stutters.

EMOTIONAL CONTEXT:
* You may add context in brackets () only when the tone of the [Raw Text] implies an emotion.
* The bracket may only describe the tone, e.g. \"We won the match (joyfully).\"

OUTPUT:
* Respond only with the simplified caption, with no preamble.";

/// Chat-template markers that must never reach the model verbatim.
const CONTROL_TOKENS: &[&str] = &[
    "<system>",
    "</system>",
    "<|system|>",
    "<|im_start|>",
    "<|im_end|>",
    "<<SYS>>",
    "<</SYS>>",
    "[INST]",
    "[/INST]",
    "<s>",
    "</s>",
];

static CONTROL_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    let alternatives = CONTROL_TOKENS
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternatives}")).expect("control token pattern is valid")
});

/// Phrases that look like someone talking to the model rather than to a
/// listener.  Flagged, never removed.
static SUSPICIOUS_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (
            r"(?i)ignore\s+(all\s+)?(previous|prior|above)\s+(instructions?|prompts?)",
            "ignore previous instructions",
        ),
        (
            r"(?i)disregard\s+(all\s+)?(previous|prior|above)",
            "disregard previous",
        ),
        (
            r"(?i)forget\s+(everything|all|your)\s+(instructions?|rules?)",
            "forget instructions",
        ),
        (r"(?i)new\s+instructions?:", "new instructions"),
        (
            r"(?i)system\s*:?\s*(prompt|override|command)",
            "system override",
        ),
        (
            r"(?i)respond\s+only\s+with\s+(?:the\s+)?(?:word|phrase)",
            "output override",
        ),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("suspicious pattern is valid"), label))
    .collect()
});

/// Replace chat-template control tokens with `[FILTERED]`.
pub fn strip_control_tokens(text: &str) -> String {
    CONTROL_TOKEN_RE.replace_all(text, "[FILTERED]").into_owned()
}

/// Labels of every suspicious phrase found in `text`.
pub fn detect_suspicious(text: &str) -> Vec<&'static str> {
    SUSPICIOUS_PATTERNS
        .iter()
        .filter(|(re, _)| re.is_match(text))
        .map(|(_, label)| *label)
        .collect()
}

/// Full prompt for one transcript.
pub fn build_prompt(raw_text: &str, target_language: &str) -> String {
    let cleaned = strip_control_tokens(raw_text);
    let flagged = detect_suspicious(&cleaned);
    if !flagged.is_empty() {
        warn!(patterns = ?flagged, "Transcript contains instruction-like phrases");
    }
    // Quotes would end the framed value early.
    let cleaned = cleaned.replace('"', "'");
    let language = target_language.replace('"', "'");
    format!(
        "{SIMPLIFICATION_INSTRUCTION}\n\n[Raw Text]: \"{cleaned}\"\n[Target Language]: \"{language}\"\n"
    )
}
