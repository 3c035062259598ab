//! Upstream event payload: a JavaScript file declaring
//! `const eventDatas = [ {...}, {...}, ];`.
//!
//! The body is a list of object literals. It is close to JSON but may use
//! single-quoted strings, bare keys and trailing commas, so it is rewritten
//! into strict JSON before deserializing.

use serde::Deserialize;

use cjedb_recon::model::{Choice, EventKind, SourceEvent};

use crate::error::IoError;

pub const UPSTREAM_DATA_URL: &str =
    "https://gamewith-tool.s3-ap-northeast-1.amazonaws.com/uma-musume/uma_event_datas.js";

const UPSTREAM_DATA_HEADER: &str = "const eventDatas = [";
const UPSTREAM_DATA_FOOTER: &str = "];";

#[derive(Debug, Deserialize)]
struct RawEvent {
    /// Event name.
    e: String,
    /// Character display name.
    n: String,
    /// Kind code: c = character, s = support card, m = scenario.
    c: String,
    #[serde(default)]
    choices: Vec<RawChoice>,
}

#[derive(Debug, Deserialize)]
struct RawChoice {
    n: String,
    t: String,
}

impl From<RawEvent> for SourceEvent {
    fn from(raw: RawEvent) -> Self {
        SourceEvent {
            name: raw.e,
            chara_name: raw.n,
            kind: EventKind::from_code(&raw.c),
            choices: raw
                .choices
                .into_iter()
                .map(|c| Choice {
                    title: c.n,
                    text: c.t,
                })
                .collect(),
        }
    }
}

/// Parse the full upstream file into source records, in file order.
pub fn parse_payload(text: &str) -> Result<Vec<SourceEvent>, IoError> {
    let body = extract_body(text)?;
    let json = format!("[{}]", to_strict_json(body)?);
    let raw: Vec<RawEvent> = serde_json::from_str(&json)
        .map_err(|e| IoError::MalformedPayload(format!("event list: {e}")))?;
    Ok(raw.into_iter().map(SourceEvent::from).collect())
}

fn extract_body(text: &str) -> Result<&str, IoError> {
    let start = text
        .find(UPSTREAM_DATA_HEADER)
        .ok_or_else(|| IoError::MalformedPayload(format!("missing '{UPSTREAM_DATA_HEADER}'")))?
        + UPSTREAM_DATA_HEADER.len();
    let end = text[start..]
        .find(UPSTREAM_DATA_FOOTER)
        .ok_or_else(|| IoError::MalformedPayload(format!("missing '{UPSTREAM_DATA_FOOTER}'")))?
        + start;
    Ok(&text[start..end])
}

/// Rewrite a JavaScript literal list body into strict JSON.
fn to_strict_json(body: &str) -> Result<String, IoError> {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                i = copy_string(&chars, i, &mut out)?;
                continue;
            }
            ',' => {
                // Drop trailing commas before a closing bracket or the end.
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, None | Some(']') | Some('}')) {
                    out.push(',');
                }
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let next = chars[i..].iter().find(|c| !c.is_whitespace());
                if next == Some(&':') {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                } else {
                    out.push_str(&word);
                }
                continue;
            }
            _ => out.push(c),
        }
        i += 1;
    }

    Ok(out)
}

/// Copy the string literal opening at `start` as a JSON string. Returns the
/// index just past the closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> Result<usize, IoError> {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');

    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            out.push('"');
            return Ok(i + 1);
        }
        if c != '\\' {
            push_json_char(out, c);
            i += 1;
            continue;
        }

        let escaped = *chars
            .get(i + 1)
            .ok_or_else(|| IoError::MalformedPayload("dangling escape at end of payload".into()))?;
        i += 2;
        match escaped {
            'b' => out.push_str("\\b"),
            'f' => out.push_str("\\f"),
            'n' => out.push_str("\\n"),
            'r' => out.push_str("\\r"),
            't' => out.push_str("\\t"),
            'v' => out.push_str("\\u000b"),
            '0' => out.push_str("\\u0000"),
            'x' => {
                let (decoded, next) = hex_escape(chars, i, 2)?;
                push_json_char(out, decoded);
                i = next;
            }
            'u' if chars.get(i) == Some(&'{') => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == '}')
                    .ok_or_else(|| IoError::MalformedPayload("unterminated \\u{...} escape".into()))?;
                let (decoded, _) = hex_escape(chars, i + 1, close - 1)?;
                push_json_char(out, decoded);
                i += close + 1;
            }
            'u' => {
                // Left as \uXXXX so serde_json joins surrogate pairs.
                hex_digits(chars, i, 4)?;
                out.push_str("\\u");
                out.extend(&chars[i..i + 4]);
                i += 4;
            }
            // Line continuation.
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '\r' => {
                if chars.get(i) == Some(&'\n') {
                    i += 1;
                }
            }
            other => push_json_char(out, other),
        }
    }

    Err(IoError::MalformedPayload(format!(
        "unterminated string starting at character {start}"
    )))
}

fn push_json_char(out: &mut String, c: char) {
    match c {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
        c => out.push(c),
    }
}

fn hex_digits(chars: &[char], start: usize, len: usize) -> Result<u32, IoError> {
    let digits: String = chars.get(start..start + len).unwrap_or_default().iter().collect();
    if len == 0 || digits.chars().count() != len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(IoError::MalformedPayload(format!(
            "truncated hex escape at character {start}"
        )));
    }
    u32::from_str_radix(&digits, 16)
        .map_err(|_| IoError::MalformedPayload(format!("invalid hex escape '{digits}'")))
}

/// Decode `len` hex digits at `start` into a char. Returns it with the index
/// past the digits.
fn hex_escape(chars: &[char], start: usize, len: usize) -> Result<(char, usize), IoError> {
    let code = hex_digits(chars, start, len)?;
    let decoded = char::from_u32(code).ok_or_else(|| {
        IoError::MalformedPayload(format!("escape U+{code:X} is not a character"))
    })?;
    Ok((decoded, start + len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!("// generated\n{UPSTREAM_DATA_HEADER}\n{body}\n{UPSTREAM_DATA_FOOTER}\nexport default eventDatas;\n")
    }

    #[test]
    fn parses_double_quoted_records() {
        let text = wrap(
            r#"{"e":"ダンスレッスン","n":"ゴールドシップ(新衣装)","c":"c","choices":[{"n":"上","t":"スピード+10[br]スキルPt+15"}]},"#,
        );
        let events = parse_payload(&text).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "ダンスレッスン");
        assert_eq!(events[0].chara_name, "ゴールドシップ(新衣装)");
        assert_eq!(events[0].kind, EventKind::Character);
        assert_eq!(events[0].choices[0].title, "上");
        assert_eq!(events[0].choices[0].text, "スピード+10[br]スキルPt+15");
    }

    #[test]
    fn accepts_single_quotes_bare_keys_and_trailing_commas() {
        let text = wrap(
            "{e:'It\\'s \"fine\"', n:'URA', c:'m', choices:[{n:'a', t:'b',},],},\n{'e':'x','n':'y','c':'z'},",
        );
        let events = parse_payload(&text).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "It's \"fine\"");
        assert_eq!(events[0].kind, EventKind::Scenario);
        assert_eq!(events[0].choices.len(), 1);
        assert_eq!(events[1].kind, EventKind::Unknown("z".into()));
        assert!(events[1].choices.is_empty());
    }

    #[test]
    fn decodes_hex_and_control_escapes() {
        let text = wrap(r#"{e:'\x41B\u{1F600}\u00e9', n:'a\0b\vc', c:'c'},"#);
        let events = parse_payload(&text).unwrap();
        assert_eq!(events[0].name, "AB\u{1F600}\u{e9}");
        assert_eq!(events[0].chara_name, "a\u{0}b\u{b}c");
    }

    #[test]
    fn surrogate_pair_escape() {
        let events = parse_payload(&wrap(r#"{"e":"\ud83d\ude00","n":"","c":"c"}"#)).unwrap();
        assert_eq!(events[0].name, "\u{1F600}");
    }

    #[test]
    fn line_continuation_is_removed() {
        let events = parse_payload(&wrap("{e:'ab\\\ncd', n:'x\\\r\ny', c:'c'},")).unwrap();
        assert_eq!(events[0].name, "abcd");
        assert_eq!(events[0].chara_name, "xy");
    }

    #[test]
    fn raw_control_characters_are_escaped() {
        let events = parse_payload(&wrap("{e:'tab\there', n:'', c:'c'},")).unwrap();
        assert_eq!(events[0].name, "tab\there");
    }

    #[test]
    fn bad_hex_escape_is_malformed() {
        for body in [r#"{e:'\xZ1', n:'', c:'c'}"#, r#"{e:'\x+1', n:'', c:'c'}"#, r#"{e:'\u{}', n:'', c:'c'}"#] {
            let err = parse_payload(&wrap(body)).unwrap_err();
            assert!(matches!(err, IoError::MalformedPayload(_)), "{body}");
        }
    }

    #[test]
    fn empty_list() {
        assert!(parse_payload(&wrap("")).unwrap().is_empty());
    }

    #[test]
    fn missing_header_is_malformed() {
        let err = parse_payload("var x = [];").unwrap_err();
        assert!(matches!(err, IoError::MalformedPayload(_)));
    }

    #[test]
    fn missing_footer_is_malformed() {
        let err = parse_payload("const eventDatas = [{\"e\":\"a\"}").unwrap_err();
        assert!(matches!(err, IoError::MalformedPayload(_)));
    }

    #[test]
    fn missing_field_is_malformed() {
        let err = parse_payload(&wrap(r#"{"e":"a","c":"c"}"#)).unwrap_err();
        assert!(err.to_string().contains("event list"));
    }

    #[test]
    fn unterminated_string_is_malformed() {
        let err = parse_payload(&wrap(r#"{"e":"a}"#)).unwrap_err();
        assert!(matches!(err, IoError::MalformedPayload(_)));
    }
}
