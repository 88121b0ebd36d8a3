//! The reconciliation engine: assigns stable identities, tracks content
//! hashes, increments sequence numbers, and synthesizes cancellations for
//! events that disappear from the upstream feed. §4.4, §3 (Event state /
//! Calendar snapshot).

use serde::{Deserialize, Serialize};

use crate::ics::model::ParsedEvent;
use crate::identity::{content_hash, event_key, stable_uid};
use crate::normalize::{is_exception, normalize_body, order_property_lines, recurrence_id_value};
use crate::store::{self, StateStore};

const CANCELLED_SENTINEL: &str = "CANCELLED";

/// Persisted per-event state: one record per tenant x event-key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventState {
    pub sequence: u64,
    pub content_hash: String,
    pub last_seen: i64,
}

/// The set of event-keys observed in the most recent successful
/// normalization, plus a generated-at timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CalendarSnapshot {
    pub event_keys: Vec<String>,
    pub generated_at: i64,
}

/// A fully reconciled output event: identity, sequence, exception flag,
/// recurrence-id (if any), and the canonical VEVENT line list (without
/// BEGIN/END, which the serializer wraps on).
#[derive(Debug, Clone)]
pub struct ReconciledEvent {
    pub stable_uid: String,
    pub sequence: u64,
    pub is_exception: bool,
    pub recurrence_id: Option<String>,
    pub lines: Vec<String>,
}

fn event_key_for(stable: &str, event: &ParsedEvent) -> String {
    event_key(stable, recurrence_id_value(event))
}

fn event_state_key(tenant_id: &str, key: &str) -> String {
    format!("{tenant_id}:event:{key}")
}

fn snapshot_key(tenant_id: &str) -> String {
    format!("{tenant_id}:snapshot:keys")
}

fn load_state(store: &dyn StateStore, tenant_id: &str, key: &str) -> Option<EventState> {
    store::get_or_absent(store, &event_state_key(tenant_id, key))
        .and_then(|json| serde_json::from_str(&json).ok())
}

fn save_state(store: &dyn StateStore, tenant_id: &str, key: &str, state: &EventState) {
    if let Ok(json) = serde_json::to_string(state) {
        store::put_best_effort(store, &event_state_key(tenant_id, key), &json);
    }
}

fn load_snapshot(store: &dyn StateStore, tenant_id: &str) -> CalendarSnapshot {
    store::get_or_absent(store, &snapshot_key(tenant_id))
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}

fn save_snapshot(store: &dyn StateStore, tenant_id: &str, snapshot: &CalendarSnapshot) {
    if let Ok(json) = serde_json::to_string(snapshot) {
        store::put_best_effort(store, &snapshot_key(tenant_id), &json);
    }
}

/// Reconcile a parsed event set against prior state. Returns the
/// reconciled output events (parsed events first, synthesized
/// cancellations appended) and writes per-event state plus the new
/// snapshot as a side effect.
///
/// `now_millis` is the current wall-clock time in milliseconds, supplied
/// by the caller so the algorithm itself stays free of hidden clock
/// reads (and is trivially testable).
pub fn reconcile(
    store: &dyn StateStore,
    tenant_id: &str,
    tenant_default_tz: &str,
    parsed_events: &[ParsedEvent],
    now_millis: i64,
) -> Vec<ReconciledEvent> {
    let mut output = Vec::with_capacity(parsed_events.len());
    let mut current_keys = Vec::with_capacity(parsed_events.len());

    for event in parsed_events {
        let uid = stable_uid(event);
        let key = event_key_for(&uid, event);
        let hash = content_hash(event);

        let sequence = match load_state(store, tenant_id, &key) {
            None => 0,
            Some(prior) if prior.content_hash == hash => prior.sequence,
            Some(prior) => prior.sequence + 1,
        };

        save_state(
            store,
            tenant_id,
            &key,
            &EventState {
                sequence,
                content_hash: hash,
                last_seen: now_millis,
            },
        );

        let body = normalize_body(event, tenant_default_tz);
        let mut lines = vec![format!("UID:{uid}@calproxy"), format!("SEQUENCE:{sequence}")];
        lines.extend(body);

        current_keys.push(key.clone());
        output.push(ReconciledEvent {
            stable_uid: uid,
            sequence,
            is_exception: is_exception(event),
            recurrence_id: recurrence_id_value(event).map(str::to_string),
            lines,
        });
    }

    let previous_snapshot = load_snapshot(store, tenant_id);
    let disappeared: Vec<&String> = previous_snapshot
        .event_keys
        .iter()
        .filter(|k| !current_keys.contains(k))
        .collect();

    for key in disappeared {
        let Some(prior) = load_state(store, tenant_id, key) else {
            continue;
        };

        let sequence = prior.sequence + 1;
        let dtstamp = render_utc_stamp(now_millis);
        let (uid, recurrence_id) = split_event_key(key);

        let mut body = vec![format!("DTSTAMP:{dtstamp}")];
        if let Some(rid) = &recurrence_id {
            body.push(format!("RECURRENCE-ID:{rid}"));
            body.push(format!("DTSTART:{rid}"));
        } else {
            body.push(format!("DTSTART:{dtstamp}"));
        }
        body.push("SUMMARY:Cancelled Event".to_string());
        body.push("STATUS:CANCELLED".to_string());

        let mut lines = vec![format!("UID:{uid}@calproxy"), format!("SEQUENCE:{sequence}")];
        lines.extend(order_property_lines(body));

        save_state(
            store,
            tenant_id,
            key,
            &EventState {
                sequence,
                content_hash: CANCELLED_SENTINEL.to_string(),
                last_seen: now_millis,
            },
        );

        output.push(ReconciledEvent {
            stable_uid: uid,
            sequence,
            is_exception: recurrence_id.is_some(),
            recurrence_id,
            lines,
        });
    }

    save_snapshot(
        store,
        tenant_id,
        &CalendarSnapshot {
            event_keys: current_keys,
            generated_at: now_millis,
        },
    );

    output
}

fn split_event_key(key: &str) -> (String, Option<String>) {
    match key.split_once('#') {
        Some((uid, rid)) => (uid.to_string(), Some(rid.to_string())),
        None => (key.to_string(), None),
    }
}

fn render_utc_stamp(now_millis: i64) -> String {
    use chrono::{DateTime, Utc};
    let dt: DateTime<Utc> = DateTime::from_timestamp_millis(now_millis).unwrap_or_else(Utc::now);
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
