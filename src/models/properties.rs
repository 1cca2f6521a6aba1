//! Reader and writer for the `key=value` properties text format used by
//! object sidecar files.
//!
//! ## Format
//! - One entry per logical line; `#` or `!` as the first non-blank character
//!   marks a comment.
//! - The key ends at the first unescaped `=`, `:` or blank; blanks and one
//!   separator after it are skipped.
//! - A line ending in an odd number of backslashes continues on the next one.
//! - Escapes: `\t`, `\n`, `\r`, `\f`, `\uXXXX`; any other escaped character
//!   stands for itself.
//!
//! Files are read as ISO-8859-1. Written files are pure ASCII: everything
//! outside the printable range is emitted as `\uXXXX`.

use crate::errors::{ObjectError, ObjectResult};
use chrono::Local;
use std::{
    collections::BTreeMap,
    io::{self, BufWriter, Read, Write},
};

/// Flat key/value metadata attached to an object.
pub type Properties = BTreeMap<String, String>;

const FORM_FEED: char = '\u{000C}';

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | FORM_FEED)
}

/// Read and parse a complete properties document.
pub fn read_properties<R: Read>(mut reader: R) -> ObjectResult<Properties> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    parse_properties(&raw)
}

/// Parse properties from raw ISO-8859-1 bytes. Later duplicates win.
pub fn parse_properties(raw: &[u8]) -> ObjectResult<Properties> {
    let text: String = raw.iter().map(|&b| b as char).collect();

    let mut properties = Properties::new();
    for (line_no, line) in logical_lines(&text) {
        let (key, value) = split_entry(&line);
        properties.insert(unescape(key, line_no)?, unescape(value, line_no)?);
    }
    Ok(properties)
}

/// Split text into natural lines on `\n`, `\r` or `\r\n`.
fn natural_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\n' => {
                lines.push(&text[start..idx]);
                start = idx + 1;
            }
            '\r' => {
                lines.push(&text[start..idx]);
                start = idx + c.len_utf8();
                if let Some(&(next_idx, '\n')) = chars.peek() {
                    chars.next();
                    start = next_idx + 1;
                }
            }
            _ => {}
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Join continuation lines and drop blanks and comments. Each logical line is
/// paired with the 1-based number of the natural line it starts on.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut lines = natural_lines(text).into_iter().enumerate();

    while let Some((idx, line)) = lines.next() {
        let trimmed = line.trim_start_matches(is_blank);
        if trimmed.is_empty() || trimmed.starts_with(['#', '!']) {
            continue;
        }

        let mut logical = String::new();
        let mut current = trimmed;
        loop {
            if !continues(current) {
                logical.push_str(current);
                break;
            }
            logical.push_str(&current[..current.len() - 1]);
            match lines.next() {
                Some((_, next)) => current = next.trim_start_matches(is_blank),
                None => break,
            }
        }
        out.push((idx + 1, logical));
    }
    out
}

/// Locate the still-escaped key and value of a logical line.
fn split_entry(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut has_separator = false;
    let mut escaped = false;

    for (idx, c) in line.char_indices() {
        if !escaped && (c == '=' || c == ':') {
            key_end = idx;
            value_start = idx + 1;
            has_separator = true;
            break;
        }
        if !escaped && is_blank(c) {
            key_end = idx;
            value_start = idx + c.len_utf8();
            break;
        }
        escaped = c == '\\' && !escaped;
    }

    for c in line[value_start..].chars() {
        if is_blank(c) {
            value_start += c.len_utf8();
        } else if !has_separator && (c == '=' || c == ':') {
            has_separator = true;
            value_start += 1;
        } else {
            break;
        }
    }

    (&line[..key_end], &line[value_start..])
}

fn unescape(escaped: &str, line_no: usize) -> ObjectResult<String> {
    let mut units: Vec<u16> = Vec::with_capacity(escaped.len());
    let mut chars = escaped.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }
        let Some(next) = chars.next() else {
            break;
        };
        let decoded = match next {
            't' => '\t' as u16,
            'n' => '\n' as u16,
            'r' => '\r' as u16,
            'f' => FORM_FEED as u16,
            'u' => {
                let digits: String = chars.by_ref().take(4).collect();
                if digits.chars().count() != 4 {
                    return Err(ObjectError::malformed(line_no, "truncated \\uxxxx escape"));
                }
                if !digits.chars().all(|d| d.is_ascii_hexdigit()) {
                    return Err(ObjectError::malformed(
                        line_no,
                        format!("invalid \\u{} escape", digits),
                    ));
                }
                u16::from_str_radix(&digits, 16).map_err(|_| {
                    ObjectError::malformed(line_no, format!("invalid \\u{} escape", digits))
                })?
            }
            other => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(other.encode_utf16(&mut buf));
                continue;
            }
        };
        units.push(decoded);
    }

    Ok(String::from_utf16_lossy(&units))
}

/// Serialize `properties` in full: an empty comment line, a timestamp
/// comment, then one sorted `key=value` line per entry.
pub fn write_properties<W: Write>(writer: W, properties: &Properties) -> io::Result<()> {
    let mut out = BufWriter::new(writer);
    writeln!(out, "#")?;
    writeln!(out, "#{}", Local::now().format("%a %b %d %H:%M:%S %Z %Y"))?;
    for (key, value) in properties {
        writeln!(out, "{}={}", escape(key, true), escape(value, false))?;
    }
    out.flush()
}

fn escape(raw: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for (idx, c) in raw.chars().enumerate() {
        match c {
            ' ' if is_key || idx == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            FORM_FEED => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn stored(properties: &Properties) -> String {
        let mut buf = Vec::new();
        write_properties(&mut buf, properties).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn parses_files_written_by_older_stores() {
        let text = "#\n\
                    #Sat Aug 17 10:12:44 CEST 2013\n\
                    Content-MD5=XUFAKrxLKna5cZ2REBfFkg\\=\\=\n\
                    Content-Type=text/plain\n\
                    x-amz-meta-author=Andreas\n";
        let parsed = parse_properties(text.as_bytes()).unwrap();
        assert_eq!(
            parsed,
            props(&[
                ("Content-MD5", "XUFAKrxLKna5cZ2REBfFkg=="),
                ("Content-Type", "text/plain"),
                ("x-amz-meta-author", "Andreas"),
            ])
        );
    }

    #[test]
    fn accepts_all_separator_styles() {
        let text = "a=1\r\nb : 2\rc 3\n  d\t=  4\ne\n! comment\n\n   # another\n";
        let parsed = parse_properties(text.as_bytes()).unwrap();
        assert_eq!(
            parsed,
            props(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4"), ("e", "")])
        );
    }

    #[test]
    fn joins_continuation_lines() {
        let text = "fruits=apple, \\\n    banana, \\\n    pear\nescaped=ends\\\\\nnext=x\n";
        let parsed = parse_properties(text.as_bytes()).unwrap();
        assert_eq!(parsed["fruits"], "apple, banana, pear");
        assert_eq!(parsed["escaped"], "ends\\");
        assert_eq!(parsed["next"], "x");
    }

    #[test]
    fn decodes_escapes() {
        let text = "key\\ with\\ spaces=tab\\there\nuni=caf\\u00E9 \\uD83D\\uDE00\nplain=\\q\n";
        let parsed = parse_properties(text.as_bytes()).unwrap();
        assert_eq!(parsed["key with spaces"], "tab\there");
        assert_eq!(parsed["uni"], "café 😀");
        assert_eq!(parsed["plain"], "q");
    }

    #[test]
    fn reads_latin1_bytes() {
        let parsed = parse_properties(b"name=M\xfcller\n").unwrap();
        assert_eq!(parsed["name"], "Müller");
    }

    #[test]
    fn later_duplicates_win() {
        let parsed = parse_properties(b"k=first\nk=second\n").unwrap();
        assert_eq!(parsed, props(&[("k", "second")]));
    }

    #[test]
    fn rejects_malformed_unicode_escape() {
        let err = parse_properties(b"ok=1\nbad=\\u12G4\n").unwrap_err();
        assert!(matches!(err, ObjectError::MalformedProperties { line: 2, .. }));

        let err = parse_properties(b"bad=\\u12").unwrap_err();
        assert!(matches!(err, ObjectError::MalformedProperties { line: 1, .. }));

        let err = parse_properties(b"k=\\u+041\n").unwrap_err();
        assert!(matches!(err, ObjectError::MalformedProperties { line: 1, .. }));

        let err = parse_properties(b"k=\\u0\xe912\n").unwrap_err();
        assert!(matches!(err, ObjectError::MalformedProperties { line: 1, .. }));
    }

    #[test]
    fn writes_header_and_sorted_entries() {
        let text = stored(&props(&[("b", "2"), ("a", "1")]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "#");
        assert!(lines[1].starts_with('#'));
        assert_eq!(&lines[2..], ["a=1", "b=2"]);
    }

    #[test]
    fn writes_ascii_escapes() {
        let text = stored(&props(&[
            ("my key", " lead=a:b#c!d"),
            ("x-amz-meta-city", "Zürich\n😀"),
            ("path", "C:\\tmp"),
        ]));
        assert!(text.is_ascii());
        assert!(text.contains("my\\ key=\\ lead\\=a\\:b\\#c\\!d\n"));
        assert!(text.contains("x-amz-meta-city=Z\\u00FCrich\\n\\uD83D\\uDE00\n"));
        assert!(text.contains("path=C\\:\\\\tmp\n"));
    }

    #[test]
    fn stored_text_reads_back() {
        let original = props(&[
            ("Content-Type", "text/plain; charset=utf-8"),
            ("x-amz-meta-note", "#1 = best! ünïcödé"),
            ("x-amz-meta-empty", ""),
            ("  spaced key ", "  spaced value  "),
        ]);
        let text = stored(&original);
        assert_eq!(parse_properties(text.as_bytes()).unwrap(), original);
    }

    #[test]
    fn empty_mapping_writes_only_header() {
        let text = stored(&Properties::new());
        assert_eq!(text.lines().count(), 2);
        assert!(parse_properties(text.as_bytes()).unwrap().is_empty());
    }
}
