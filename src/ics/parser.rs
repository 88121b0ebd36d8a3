//! Line unfolding, property parsing, and BEGIN/END block extraction.
//!
//! A single left-to-right pass over unfolded lines, matching the state
//! machine in the design doc: header -> (tz-block | event)* -> footer.

use crate::error::CoreError;

use super::model::{ParsedCalendar, ParsedEvent, Property};

/// Split on CRLF/LF and rejoin RFC 5545 folded continuation lines.
///
/// Any line starting with a single space or tab is appended to the
/// previous line with the leading whitespace byte stripped. A
/// continuation line with no previous line is discarded.
pub fn unfold(bytes: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in bytes.split(['\r', '\n']).filter(|l| !l.is_empty()) {
        // split(['\r','\n']) already separates CRLF pairs into one empty
        // segment between them, filtered above, so each yielded `raw` is
        // one physical line.
        if let Some(rest) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
            // continuation with no previous line: discard
            continue;
        }
        lines.push(raw.to_string());
    }
    lines
}

/// Parse a single content line into a `Property`, if it contains an
/// unescaped colon. Lines with no colon (e.g. `BEGIN:VEVENT` delimiters
/// are handled separately) yield `None`.
pub fn parse_property_line(line: &str) -> Option<Property> {
    let colon_idx = find_unescaped_colon(line)?;
    let (head, value) = (&line[..colon_idx], &line[colon_idx + 1..]);

    let mut parts = head.split(';');
    let name = parts.next()?.trim().to_uppercase();
    if name.is_empty() {
        return None;
    }

    let mut prop = Property::new(name, value.to_string());
    for param in parts {
        if let Some((k, v)) = param.split_once('=') {
            prop.params.insert(k.trim().to_uppercase(), v.to_string());
        }
    }
    Some(prop)
}

fn find_unescaped_colon(line: &str) -> Option<usize> {
    // Parameter values may be double-quoted and contain a colon inside the
    // quotes; a colon inside a quoted parameter value does not end the
    // name/params section.
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Parse a raw upstream ICS byte sequence into a `ParsedCalendar`.
///
/// Returns `CoreError::UpstreamInvalid` if `BEGIN:VCALENDAR` never
/// appears. An empty-feed condition (no `BEGIN:VEVENT`) is not an error
/// here; callers inspect `events.is_empty()` and apply §7 semantics.
pub fn parse(bytes: &str) -> Result<ParsedCalendar, CoreError> {
    let lines = unfold(bytes);

    if !lines.iter().any(|l| l.trim() == "BEGIN:VCALENDAR") {
        return Err(CoreError::UpstreamInvalid(
            "missing BEGIN:VCALENDAR".into(),
        ));
    }

    #[derive(PartialEq)]
    enum State {
        Header,
        TzBlock,
        Event,
    }

    let mut state = State::Header;
    let mut header_done = false;

    let mut calendar = ParsedCalendar::default();
    let mut current_tz: Vec<String> = Vec::new();
    let mut current_event = ParsedEvent::default();

    for line in lines {
        let trimmed = line.trim_end();

        match state {
            State::Header => {
                if trimmed == "BEGIN:VTIMEZONE" {
                    state = State::TzBlock;
                    current_tz = vec![line.clone()];
                } else if trimmed == "BEGIN:VEVENT" {
                    state = State::Event;
                    header_done = true;
                    current_event = ParsedEvent::default();
                } else if !header_done {
                    calendar.header.push(line);
                }
            }
            State::TzBlock => {
                current_tz.push(line.clone());
                if trimmed == "END:VTIMEZONE" {
                    calendar.timezones.push(current_tz.join("\r\n"));
                    current_tz = Vec::new();
                    state = State::Header;
                }
            }
            State::Event => {
                current_event.raw_lines.push(line.clone());
                if trimmed == "END:VEVENT" {
                    calendar.events.push(std::mem::take(&mut current_event));
                    state = State::Header;
                } else if let Some(prop) = parse_property_line(trimmed) {
                    if prop.name == "UID" {
                        current_event.original_uid = prop.value.clone();
                    }
                    current_event.properties.push(prop);
                }
                // malformed lines with no colon inside an event are
                // skipped: the parser is permissive.
            }
        }
    }

    // Footer: only the final END:VCALENDAR line, per §4.1. Anything else
    // trailing the last event is intentionally dropped (§9 open question b).
    if lines_contains_end_vcalendar(bytes) {
        calendar.footer.push("END:VCALENDAR".to_string());
    }

    Ok(calendar)
}

fn lines_contains_end_vcalendar(bytes: &str) -> bool {
    bytes.lines().any(|l| l.trim_end() == "END:VCALENDAR")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfold_joins_continuation_lines() {
        let folded = "SUMMARY:Long event\r\n  name here";
        let lines = unfold(folded);
        assert_eq!(lines, vec!["SUMMARY:Long eventname here".to_string()]);
    }

    #[test]
    fn unfold_discards_leading_continuation() {
        let folded = " continuation\r\nSUMMARY:ok";
        let lines = unfold(folded);
        assert_eq!(lines, vec!["SUMMARY:ok".to_string()]);
    }

    #[test]
    fn parse_property_line_splits_params() {
        let prop = parse_property_line("DTSTART;TZID=Eastern Standard Time:20240601T090000").unwrap();
        assert_eq!(prop.name, "DTSTART");
        assert_eq!(prop.param("TZID"), Some("Eastern Standard Time"));
        assert_eq!(prop.value, "20240601T090000");
    }

    #[test]
    fn parse_property_line_no_colon_is_none() {
        assert!(parse_property_line("BEGIN:VEVENT is not this").is_some()); // has colon
        assert!(parse_property_line("garbage no colon here").is_none());
    }

    #[test]
    fn parse_property_line_quoted_value_with_colon() {
        let prop = parse_property_line(r#"ATTENDEE;CN="Doe, J: Smith":mailto:j@example.com"#).unwrap();
        assert_eq!(prop.name, "ATTENDEE");
        assert_eq!(prop.value, "mailto:j@example.com");
    }

    #[test]
    fn parse_missing_begin_vcalendar_is_invalid() {
        let err = parse("BEGIN:VEVENT\r\nUID:x\r\nEND:VEVENT").unwrap_err();
        assert!(matches!(err, CoreError::UpstreamInvalid(_)));
    }

    #[test]
    fn parse_extracts_header_tz_and_events() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VTIMEZONE\r\nTZID:Eastern Standard Time\r\nEND:VTIMEZONE\r\nBEGIN:VEVENT\r\nUID:abc\r\nSUMMARY:Test\r\nEND:VEVENT\r\nEND:VCALENDAR";
        let cal = parse(ics).unwrap();
        assert_eq!(cal.header, vec!["BEGIN:VCALENDAR", "VERSION:2.0"]);
        assert_eq!(cal.timezones.len(), 1);
        assert!(cal.timezones[0].contains("TZID:Eastern Standard Time"));
        assert_eq!(cal.events.len(), 1);
        assert_eq!(cal.events[0].original_uid, "abc");
        assert_eq!(cal.footer, vec!["END:VCALENDAR"]);
    }

    #[test]
    fn parse_empty_feed_has_no_events() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR";
        let cal = parse(ics).unwrap();
        assert!(cal.events.is_empty());
    }

    #[test]
    fn parse_unknown_properties_preserved() {
        let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:abc\r\nX-CUSTOM:value\r\nEND:VEVENT\r\nEND:VCALENDAR";
        let cal = parse(ics).unwrap();
        assert_eq!(cal.events[0].get_value("X-CUSTOM"), Some("value"));
    }
}
