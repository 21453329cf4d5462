//! Pure text transforms shared by the assembler and the store: stripping
//! retrieval citation markers from generated answers and scrubbing scraped
//! contact fields.

use std::sync::OnceLock;

use regex::Regex;

fn filecite_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"filecite\S*").expect("static regex"))
}

fn turn_file_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"turn\d+file\d+").expect("static regex"))
}

fn repeated_spaces() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("static regex"))
}

/// Private-use-area characters and U+FFFD, which the generation step uses to
/// anchor its internal file citations.
fn is_private_or_replacement(ch: char) -> bool {
    let code = ch as u32;
    (0xE000..=0xF8FF).contains(&code)
        || (0xF0000..=0xFFFFD).contains(&code)
        || (0x100000..=0x10FFFD).contains(&code)
        || code == 0xFFFD
}

/// Removes internal citation markers and private special characters from a
/// generated answer while keeping line breaks and list formatting intact.
/// Idempotent: re-applying it to already-clean text is a no-op.
pub fn clean_citations(text: &str) -> String {
    let text = filecite_marker().replace_all(text, "");
    let text = turn_file_marker().replace_all(&text, "");
    let text: String = text.chars().filter(|ch| !is_private_or_replacement(*ch)).collect();

    // Collapse runs of spaces but leave newlines alone.
    let text = repeated_spaces().replace_all(&text, " ");

    let lines: Vec<&str> = text.split('\n').map(str::trim_end).collect();
    lines.join("\n").trim().to_string()
}

/// Drops markdown residue such as `(...utm_source=...)` that the source-page
/// scraper left behind in phone/email/url fields.
pub fn clean_contact_field(value: Option<&str>) -> Option<String> {
    let cleaned = value?.split('(').next().unwrap_or("").trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
