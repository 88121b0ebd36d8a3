//! Final feed assembly: VTIMEZONE injection/rewriting, event ordering,
//! and line folding. §4.5.

use crate::normalize::to_iana;
use crate::reconcile::ReconciledEvent;

const FOLD_WIDTH: usize = 75;
const CONTINUATION_WIDTH: usize = 74;

/// Fixed VTIMEZONE templates for the common North American zones the
/// design doc names explicitly. Any other zone gets a minimal placeholder
/// (single STANDARD rule at +0000/+0000).
fn builtin_vtimezone(iana_tz: &str) -> Option<&'static str> {
    match iana_tz {
        "America/New_York" | "America/Indiana/Indianapolis" => Some(
            "BEGIN:VTIMEZONE\r\n\
             TZID:America/New_York\r\n\
             BEGIN:DAYLIGHT\r\n\
             TZOFFSETFROM:-0500\r\n\
             TZOFFSETTO:-0400\r\n\
             TZNAME:EDT\r\n\
             DTSTART:19700308T020000\r\n\
             RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU\r\n\
             END:DAYLIGHT\r\n\
             BEGIN:STANDARD\r\n\
             TZOFFSETFROM:-0400\r\n\
             TZOFFSETTO:-0500\r\n\
             TZNAME:EST\r\n\
             DTSTART:19701101T020000\r\n\
             RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU\r\n\
             END:STANDARD\r\n\
             END:VTIMEZONE",
        ),
        "America/Chicago" => Some(
            "BEGIN:VTIMEZONE\r\n\
             TZID:America/Chicago\r\n\
             BEGIN:DAYLIGHT\r\n\
             TZOFFSETFROM:-0600\r\n\
             TZOFFSETTO:-0500\r\n\
             TZNAME:CDT\r\n\
             DTSTART:19700308T020000\r\n\
             RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU\r\n\
             END:DAYLIGHT\r\n\
             BEGIN:STANDARD\r\n\
             TZOFFSETFROM:-0500\r\n\
             TZOFFSETTO:-0600\r\n\
             TZNAME:CST\r\n\
             DTSTART:19701101T020000\r\n\
             RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU\r\n\
             END:STANDARD\r\n\
             END:VTIMEZONE",
        ),
        "America/Los_Angeles" => Some(
            "BEGIN:VTIMEZONE\r\n\
             TZID:America/Los_Angeles\r\n\
             BEGIN:DAYLIGHT\r\n\
             TZOFFSETFROM:-0800\r\n\
             TZOFFSETTO:-0700\r\n\
             TZNAME:PDT\r\n\
             DTSTART:19700308T020000\r\n\
             RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU\r\n\
             END:DAYLIGHT\r\n\
             BEGIN:STANDARD\r\n\
             TZOFFSETFROM:-0700\r\n\
             TZOFFSETTO:-0800\r\n\
             TZNAME:PST\r\n\
             DTSTART:19701101T020000\r\n\
             RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU\r\n\
             END:STANDARD\r\n\
             END:VTIMEZONE",
        ),
        _ => None,
    }
}

fn placeholder_vtimezone(iana_tz: &str) -> String {
    format!(
        "BEGIN:VTIMEZONE\r\n\
         TZID:{iana_tz}\r\n\
         BEGIN:STANDARD\r\n\
         TZOFFSETFROM:+0000\r\n\
         TZOFFSETTO:+0000\r\n\
         DTSTART:19700101T000000\r\n\
         END:STANDARD\r\n\
         END:VTIMEZONE"
    )
}

fn render_vtimezone_for(iana_tz: &str) -> String {
    builtin_vtimezone(iana_tz)
        .map(str::to_string)
        .unwrap_or_else(|| placeholder_vtimezone(iana_tz))
}

/// Rewrite an existing VTIMEZONE block's `TZID:` line through the
/// Windows->IANA mapping. The block is raw text (preserving inner lines
/// as parsed); only the `TZID:` line is touched.
fn rewrite_existing_vtimezone(raw: &str) -> String {
    raw.split("\r\n")
        .map(|line| {
            if let Some(value) = line.strip_prefix("TZID:") {
                format!("TZID:{}", to_iana(value))
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn contains_tzid(raw: &str, iana_tz: &str) -> bool {
    raw.split("\r\n").any(|line| {
        line.strip_prefix("TZID:")
            .map(|value| to_iana(value) == iana_tz)
            .unwrap_or(false)
    })
}

/// Order events per §4.5: non-exception events first (sorted by
/// stable-uid ascending), then exception events (sorted by
/// (stable-uid, recurrence-id) ascending) — masters always precede their
/// overrides.
pub fn order_events(mut events: Vec<ReconciledEvent>) -> Vec<ReconciledEvent> {
    events.sort_by(|a, b| {
        a.is_exception
            .cmp(&b.is_exception)
            .then_with(|| a.stable_uid.cmp(&b.stable_uid))
            .then_with(|| a.recurrence_id.cmp(&b.recurrence_id))
    });
    events
}

/// The largest char boundary in `s` at or below `index`. ICS fold widths
/// are octet counts, but a fold must never land inside a multi-byte
/// UTF-8 sequence.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut idx = index;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Fold a single unfolded output line at 75 octets: the first 75 stand,
/// each subsequent 74-byte chunk is CRLF + one leading space. Fold points
/// are snapped back to the nearest UTF-8 char boundary so a multi-byte
/// character is never split.
pub fn fold_line(line: &str) -> String {
    if line.len() <= FOLD_WIDTH {
        return line.to_string();
    }

    let mut out = String::new();
    let first_end = floor_char_boundary(line, FOLD_WIDTH);
    out.push_str(&line[..first_end]);
    let mut rest = &line[first_end..];
    while !rest.is_empty() {
        let take = floor_char_boundary(rest, CONTINUATION_WIDTH.min(rest.len()));
        out.push_str("\r\n ");
        out.push_str(&rest[..take]);
        rest = &rest[take..];
    }
    out
}

/// Assemble the full output feed: header, injected default-zone
/// VTIMEZONE (if absent), existing VTIMEZONE blocks (rewritten), ordered
/// events wrapped in BEGIN/END VEVENT, then the footer. Every line is
/// folded and CRLF-terminated.
pub fn serialize(
    header: &[String],
    existing_timezones: &[String],
    default_tz: &str,
    events: Vec<ReconciledEvent>,
    footer: &[String],
) -> String {
    let default_iana = to_iana(default_tz);
    let mut lines: Vec<String> = Vec::new();

    lines.extend(header.iter().cloned());

    let has_default = existing_timezones
        .iter()
        .any(|tz| contains_tzid(tz, default_iana));
    if !has_default {
        lines.extend(render_vtimezone_for(default_iana).split("\r\n").map(String::from));
    }

    for tz in existing_timezones {
        lines.extend(rewrite_existing_vtimezone(tz).split("\r\n").map(String::from));
    }

    for event in order_events(events) {
        lines.push("BEGIN:VEVENT".to_string());
        lines.extend(event.lines);
        lines.push("END:VEVENT".to_string());
    }

    lines.extend(footer.iter().cloned());

    let mut out = String::new();
    for line in lines {
        out.push_str(&fold_line(&line));
        out.push_str("\r\n");
    }
    out
}
