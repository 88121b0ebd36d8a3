//! Per-event normalization: rewrite property values and reorder the
//! property list into canonical form, per §4.2.

use crate::ics::model::{ParsedEvent, Property};

use super::datetime::{render, rewrite, rewrite_list};
use super::rrule;
use super::timezone::to_iana;

/// Canonical property order (excluding BEGIN/END/UID/SEQUENCE, which are
/// always the first two emitted lines of a VEVENT). Properties not named
/// here follow in their original relative order.
const CANONICAL_ORDER: &[&str] = &[
    "DTSTAMP",
    "DTSTART",
    "DTEND",
    "SUMMARY",
    "DESCRIPTION",
    "LOCATION",
    "STATUS",
    "ORGANIZER",
    "ATTENDEE",
    "RECURRENCE-ID",
    "RRULE",
    "EXDATE",
    "RDATE",
    "CREATED",
    "LAST-MODIFIED",
    "CATEGORIES",
    "PRIORITY",
    "TRANSP",
    "CLASS",
];

/// Properties whose volatile values must never affect the content hash.
pub const VOLATILE_PROPERTIES: &[&str] = &["DTSTAMP", "LAST-MODIFIED", "SEQUENCE"];

fn is_datetime_prop(name: &str) -> bool {
    matches!(name, "DTSTART" | "DTEND" | "RECURRENCE-ID")
}

fn default_tz_for(name: &str, tenant_default_tz: &str) -> String {
    match name {
        "DTSTAMP" | "CREATED" | "LAST-MODIFIED" => "UTC".to_string(),
        _ => tenant_default_tz.to_string(),
    }
}

/// Rewrite one property's output line per §4.2's tagged-variant rules.
/// The catch-all "other" case reconstructs `NAME(;PARAM=VALUE)*:VALUE`
/// with parameters sorted by name ascending.
fn rewrite_property(prop: &Property, tenant_default_tz: &str) -> String {
    let name = prop.name.as_str();

    if is_datetime_prop(name) || name == "DTSTAMP" || name == "CREATED" || name == "LAST-MODIFIED" {
        let default_tz = default_tz_for(name, tenant_default_tz);
        let r = rewrite(&prop.value, prop.param("TZID"), &default_tz);
        return render(name, &r);
    }

    if name == "EXDATE" || name == "RDATE" {
        let default_tz = tenant_default_tz.to_string();
        return rewrite_list(name, &prop.value, prop.param("TZID"), &default_tz);
    }

    if name == "RRULE" {
        return format!("RRULE:{}", rrule::rewrite(&prop.value));
    }

    // TZID parameters on any other property (rare, but the design doc
    // says the mapping is "applied everywhere a TZID= parameter appears").
    let mut params: Vec<(String, String)> = prop
        .params
        .iter()
        .map(|(k, v)| {
            if k == "TZID" {
                (k.clone(), to_iana(v).to_string())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = name.to_string();
    for (k, v) in &params {
        out.push(';');
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }
    out.push(':');
    out.push_str(&prop.value);
    out
}

/// Rewrite and order a parsed event's properties into the canonical
/// output line list (without the leading UID/SEQUENCE lines, which the
/// reconciler prepends once identity has been derived).
pub fn normalize_body(event: &ParsedEvent, tenant_default_tz: &str) -> Vec<String> {
    let mut ordered: Vec<&Property> = Vec::with_capacity(event.properties.len());

    for &name in CANONICAL_ORDER {
        for prop in &event.properties {
            if prop.name == name {
                ordered.push(prop);
            }
        }
    }
    for prop in &event.properties {
        if prop.name == "UID" || prop.name == "SEQUENCE" {
            continue;
        }
        if !CANONICAL_ORDER.contains(&prop.name.as_str()) {
            ordered.push(prop);
        }
    }

    ordered
        .into_iter()
        .map(|p| rewrite_property(p, tenant_default_tz))
        .collect()
}

/// Reorder already-rendered `NAME:value` / `NAME;PARAM=value:value` output
/// lines into the same canonical order `normalize_body` applies to parsed
/// properties. Used by the reconciler for synthesized lines (cancellation
/// VEVENTs) that never go through `normalize_body` itself, so the §3
/// whole-output ordering invariant still holds for them.
pub fn order_property_lines(mut lines: Vec<String>) -> Vec<String> {
    lines.sort_by_key(|line| {
        let name = line
            .split(|c| c == ':' || c == ';')
            .next()
            .unwrap_or(line.as_str());
        CANONICAL_ORDER
            .iter()
            .position(|n| *n == name)
            .unwrap_or(CANONICAL_ORDER.len())
    });
    lines
}

pub fn is_exception(event: &ParsedEvent) -> bool {
    event.get("RECURRENCE-ID").is_some()
}

pub fn recurrence_id_value(event: &ParsedEvent) -> Option<&str> {
    event.get_value("RECURRENCE-ID")
}
