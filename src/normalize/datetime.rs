//! Datetime value classification and rewriting per §4.2.

use super::timezone::to_iana;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    /// No `T`: a bare date.
    DateOnly,
    /// Ends in `Z`: already UTC.
    Utc,
    /// Neither of the above.
    Floating,
}

pub fn classify(value: &str) -> DateKind {
    if !value.contains('T') {
        DateKind::DateOnly
    } else if value.ends_with('Z') {
        DateKind::Utc
    } else {
        DateKind::Floating
    }
}

/// The result of rewriting a single DTSTART/DTEND/RECURRENCE-ID-style
/// datetime value: the parameters to attach (if any) and the value text.
pub struct Rewritten {
    pub tzid_param: Option<String>,
    pub value_date_param: bool,
    pub value: String,
}

/// Rewrite one datetime value per the DTSTART/DTEND/RECURRENCE-ID rule:
/// date-only -> VALUE=DATE, UTC -> trailing Z preserved, floating -> TZID
/// attached (explicit param if present, else `default_tz`), normalizing
/// any TZID through the Windows->IANA table.
pub fn rewrite(value: &str, explicit_tzid: Option<&str>, default_tz: &str) -> Rewritten {
    match classify(value) {
        DateKind::DateOnly => Rewritten {
            tzid_param: None,
            value_date_param: true,
            value: value.to_string(),
        },
        DateKind::Utc => Rewritten {
            tzid_param: None,
            value_date_param: false,
            value: value.to_string(),
        },
        DateKind::Floating => {
            let tz = explicit_tzid.map(to_iana).unwrap_or(default_tz);
            Rewritten {
                tzid_param: Some(tz.to_string()),
                value_date_param: false,
                value: value.to_string(),
            }
        }
    }
}

/// Render a rewritten value back into a full `NAME;PARAM=...:VALUE` line.
pub fn render(name: &str, r: &Rewritten) -> String {
    if r.value_date_param {
        format!("{name};VALUE=DATE:{}", r.value)
    } else if let Some(tz) = &r.tzid_param {
        format!("{name};TZID={tz}:{}", r.value)
    } else {
        format!("{name}:{}", r.value)
    }
}

/// EXDATE/RDATE: comma-separated list, each entry classified and
/// rewritten independently, then sorted lexicographically (ASCII) before
/// joining. The property carries `TZID=` if any entry is floating with a
/// TZID, or `VALUE=DATE` if every entry is date-only.
pub fn rewrite_list(name: &str, raw_value: &str, explicit_tzid: Option<&str>, default_tz: &str) -> String {
    let mut entries: Vec<Rewritten> = raw_value
        .split(',')
        .map(|v| rewrite(v.trim(), explicit_tzid, default_tz))
        .collect();

    let all_date_only = entries.iter().all(|e| e.value_date_param);
    let floating_tz = entries.iter().find_map(|e| e.tzid_param.clone());

    let mut values: Vec<String> = entries.drain(..).map(|e| e.value).collect();
    values.sort();

    let joined = values.join(",");
    if all_date_only {
        format!("{name};VALUE=DATE:{joined}")
    } else if let Some(tz) = floating_tz {
        format!("{name};TZID={tz}:{joined}")
    } else {
        format!("{name}:{joined}")
    }
}
