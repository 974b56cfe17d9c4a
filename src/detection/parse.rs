//! Pulls the `{ "events": [...] }` object out of free-form model text.
//!
//! Models wrap JSON in prose, markdown fences, or both. A fenced block holding
//! an object wins; otherwise the first balanced top-level `{...}` span is used.

use anyhow::{Context, Result};
use serde::Deserialize;

use super::events::DetectedEvent;

const FENCE: &str = "```";

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    events: Option<Vec<WireEvent>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_dangerous: bool,
}

/// Parses model text into events. Events without a timestamp get `fallback_stamp`.
pub fn parse_events(text: &str, fallback_stamp: &str) -> Result<Vec<DetectedEvent>> {
    let json = extract_json(text).unwrap_or(text);
    let parsed: WireResponse =
        serde_json::from_str(json).context("model response is not the expected JSON object")?;

    Ok(parsed
        .events
        .unwrap_or_default()
        .into_iter()
        .map(|event| DetectedEvent {
            timestamp: event
                .timestamp
                .map(|stamp| stamp.trim().to_string())
                .filter(|stamp| !stamp.is_empty())
                .unwrap_or_else(|| fallback_stamp.to_string()),
            description: event.description,
            is_dangerous: event.is_dangerous,
        })
        .collect())
}

pub fn extract_json(text: &str) -> Option<&str> {
    fenced_object(text).or_else(|| first_object_span(text))
}

fn fenced_object(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let close = after_open.find(FENCE)?;
        let body = strip_language_tag(&after_open[..close]).trim();
        if body.starts_with('{') && body.ends_with('}') {
            return Some(body);
        }
        rest = &after_open[close + FENCE.len()..];
    }
    None
}

fn strip_language_tag(body: &str) -> &str {
    match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    }
}

fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_block_is_extracted() {
        let text = "Here is the result:\n```json\n{\"events\":[{\"timestamp\":\"00:05\",\"description\":\"Fall detected\",\"isDangerous\":true}]}\n```";

        let events = parse_events(text, "59:59").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, "00:05");
        assert_eq!(events[0].description, "Fall detected");
        assert!(events[0].is_dangerous);
    }

    #[test]
    fn untagged_fence_is_accepted() {
        let text = "```\n{\"events\": []}\n```";
        assert_eq!(extract_json(text), Some("{\"events\": []}"));
    }

    #[test]
    fn fence_without_object_falls_through_to_next_fence() {
        let text = "```sh\necho hi\n```\nthen\n```json\n{\"events\": []}\n```";
        assert_eq!(extract_json(text), Some("{\"events\": []}"));
    }

    #[test]
    fn bare_object_inside_prose_is_extracted() {
        let text = "Sure! {\"events\": [{\"description\": \"a } in text\", \"isDangerous\": false}]} Hope that helps {x}";
        let span = extract_json(text).unwrap();
        assert!(span.starts_with("{\"events\""));
        assert!(span.ends_with("]}"));

        let events = parse_events(text, "01:02").unwrap();
        assert_eq!(events[0].description, "a } in text");
        assert_eq!(events[0].timestamp, "01:02");
    }

    #[test]
    fn missing_events_key_means_no_events() {
        assert!(parse_events("{\"summary\": \"quiet\"}", "00:00").unwrap().is_empty());
        assert!(parse_events("{\"events\": null}", "00:00").unwrap().is_empty());
    }

    #[test]
    fn prose_without_json_is_an_error() {
        assert!(parse_events("I cannot analyze this image.", "00:00").is_err());
        assert!(parse_events("{\"events\": [", "00:00").is_err());
    }

    #[test]
    fn blank_timestamp_is_replaced() {
        let events =
            parse_events("{\"events\":[{\"timestamp\":\" \",\"description\":\"x\"}]}", "12:34").unwrap();
        assert_eq!(events[0].timestamp, "12:34");
        assert!(!events[0].is_dangerous);
    }
}
