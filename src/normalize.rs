use google_gmail1::api::Message;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::models::NormalizedEmail;

const DEFAULT_SENDER: &str = "Unknown Sender";
const DEFAULT_SUBJECT: &str = "No Subject";

// "On Mon, Jan 15, 2024 at 3:45 PM, Jane Doe <jane@x.com> wrote:" and the
// quoted conversation that follows it. The whole header must sit on one line
// of its own, address included, so date mentions inside a sentence never
// count.
static REPLY_QUOTE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^On\s+\w{3},\s+\w{3,9}\s+\d{1,2},\s+\d{4}\s+at\s+\d{1,2}:\d{2}\s*(?:AM|PM)?,?[^\n]*?<[^\s@>]+@[^\s>]+>\s*wrote:(?s:.*)$",
    )
    .unwrap()
});

static QUOTED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*>.*$").unwrap());

// Forwarded-message header block lines
static FORWARD_HEADER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^(?:from|sent|to|subject):.*$").unwrap());

// A line starting with dashes or underscores begins a signature block;
// "--Jane Doe" counts just as much as a bare "--"
static SIGNATURE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:--|_{2,})").unwrap());

// Whole-line sign-off phrases; blanked rather than truncated so the name
// below them survives for the classifier
static CLOSING_PHRASE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:best regards|kind regards|warm regards|all the best|best wishes|best|regards|many thanks|thanks|thank you|sincerely|cheers)[,.!]?[ \t]*$",
    )
    .unwrap()
});

static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Build the classifier input from a raw Gmail message.
///
/// Pure: same message always yields the same result, no network or state.
pub fn normalize(message: &Message) -> NormalizedEmail {
    let id = message.id.clone().unwrap_or_default();
    let sender = header_value(message, "From").unwrap_or_else(|| DEFAULT_SENDER.to_string());
    let subject = header_value(message, "Subject").unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
    let body = clean_body(&extract_body(message));

    trace!(
        message_id = %id,
        body_len = body.len(),
        "Normalized message content"
    );

    NormalizedEmail {
        id,
        sender,
        subject,
        body,
    }
}

/// Case-insensitive header lookup on the message payload
pub fn header_value(message: &Message, name: &str) -> Option<String> {
    let headers = message.payload.as_ref()?.headers.as_ref()?;
    headers
        .iter()
        .find(|h| {
            h.name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
        .and_then(|h| h.value.clone())
}

/// Plain-text body with fallback chain: top-level text/plain, then the first
/// text/plain child part, then the snippet. HTML bodies are never parsed.
pub fn extract_body(message: &Message) -> String {
    if let Some(payload) = &message.payload {
        if payload.mime_type.as_deref() == Some("text/plain") {
            if let Some(text) = part_text(payload.body.as_ref()) {
                return text;
            }
        }

        if let Some(parts) = &payload.parts {
            for part in parts {
                if part.mime_type.as_deref() == Some("text/plain") {
                    if let Some(text) = part_text(part.body.as_ref()) {
                        return text;
                    }
                }
            }
        }
    }

    message.snippet.clone().unwrap_or_default()
}

fn part_text(body: Option<&google_gmail1::api::MessagePartBody>) -> Option<String> {
    let data = body?.data.as_ref()?;
    if data.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(data).into_owned())
}

/// Strip quoted replies, forwarded headers, signatures and sign-offs so the
/// classifier only sees the new content of the message.
///
/// Idempotent, and never turns a non-empty body into an empty one: when the
/// whole body is quote/signature material the original is kept as-is.
pub fn clean_body(body: &str) -> String {
    let original = body.trim();
    if original.is_empty() {
        return String::new();
    }

    let mut text = body.replace("\r\n", "\n");

    // Truncation rules first, then line-scoped removals
    if let Some(cut) = REPLY_QUOTE_HEADER.find(&text).map(|m| m.start()) {
        text.truncate(cut);
    }
    if let Some(cut) = SIGNATURE_SEPARATOR.find(&text).map(|m| m.start()) {
        text.truncate(cut);
    }

    let text = QUOTED_LINE.replace_all(&text, "");
    let text = FORWARD_HEADER_LINE.replace_all(&text, "");
    let text = CLOSING_PHRASE_LINE.replace_all(&text, "");

    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    let cleaned = text.trim().to_string();

    if cleaned.is_empty() {
        original.to_string()
    } else {
        cleaned
    }
}
