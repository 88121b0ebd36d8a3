//! The pure core entry point: `(upstream bytes or failure, tenant-id,
//! default-timezone, store handle) -> (output bytes, etag)`, per the
//! design note in spec.md §9. The HTTP boundary is the only caller that
//! knows whether the upstream fetch itself succeeded; everything after
//! that is deterministic given the store's current contents.

use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::ics;
use crate::reconcile;
use crate::serialize;
use crate::store::{self, StateStore};

/// What the HTTP boundary observed when it fetched the upstream feed.
pub enum Upstream {
    /// A 2xx response with a UTF-8 body.
    Body(String),
    /// Non-2xx status or a transport failure.
    Unreachable,
}

pub struct Outcome {
    pub ics: String,
    pub etag: String,
}

fn snapshot_latest_key(tenant_id: &str) -> String {
    format!("{tenant_id}:snapshot:latest")
}

fn upstream_hash_key(tenant_id: &str) -> String {
    format!("{tenant_id}:snapshot:upstream_hash")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn etag_for(text: &str) -> String {
    sha256_hex(text.as_bytes())
}

fn last_known_good(store: &dyn StateStore, tenant_id: &str) -> Option<Outcome> {
    store::get_or_absent(store, &snapshot_latest_key(tenant_id)).map(|cached| Outcome {
        etag: etag_for(&cached),
        ics: cached,
    })
}

/// Run one normalization. `now_millis` is the caller-supplied wall-clock
/// time (see `reconcile::reconcile`).
pub fn process(
    upstream: Upstream,
    tenant_id: &str,
    default_tz: &str,
    store: &dyn StateStore,
    now_millis: i64,
) -> Result<Outcome, CoreError> {
    let bytes = match upstream {
        Upstream::Unreachable => {
            return last_known_good(store, tenant_id).ok_or_else(|| {
                CoreError::UpstreamUnreachable(
                    "upstream unreachable and no last-known-good snapshot exists".into(),
                )
            });
        }
        Upstream::Body(b) => b,
    };

    let upstream_hash = sha256_hex(bytes.as_bytes());
    let stored_hash = store::get_or_absent(store, &upstream_hash_key(tenant_id));
    if stored_hash.as_deref() == Some(upstream_hash.as_str())
        && let Some(outcome) = last_known_good(store, tenant_id)
    {
        return Ok(outcome);
    }

    let parsed = ics::parse(&bytes)?;

    if parsed.events.is_empty() {
        if let Some(outcome) = last_known_good(store, tenant_id) {
            return Ok(outcome);
        }
        // No last-known-good to fall back to: proceed with the empty
        // parse per §7 — this will cancel everything in the prior
        // snapshot, which is the correct behavior in this situation.
    }

    let reconciled = reconcile::reconcile(store, tenant_id, default_tz, &parsed.events, now_millis);
    let output = serialize::serialize(
        &parsed.header,
        &parsed.timezones,
        default_tz,
        reconciled,
        &parsed.footer,
    );

    store::put_best_effort(store, &snapshot_latest_key(tenant_id), &output);
    store::put_best_effort(store, &upstream_hash_key(tenant_id), &upstream_hash);

    Ok(Outcome {
        etag: etag_for(&output),
        ics: output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    const TENANT: &str = "t1";
    const TZ: &str = "America/Chicago";

    fn ics_with_event(uid: &str, summary: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:{uid}\r\nDTSTART;TZID=Eastern Standard Time:20240601T090000\r\nSUMMARY:{summary}\r\nORGANIZER:mailto:o@example.com\r\nEND:VEVENT\r\nEND:VCALENDAR"
        )
    }

    #[test]
    fn s1_rewrites_tzid_and_assigns_sequence_zero() {
        let store = MemoryStore::new();
        let out = process(Upstream::Body(ics_with_event("X", "M")), TENANT, TZ, &store, 1000).unwrap();
        assert!(out.ics.contains("DTSTART;TZID=America/New_York:20240601T090000"));
        assert!(out.ics.contains("SEQUENCE:0"));
        assert!(out.ics.contains("@calproxy"));
    }

    #[test]
    fn s2_identical_resubmission_is_idempotent() {
        let store = MemoryStore::new();
        let body = ics_with_event("X", "M");
        let first = process(Upstream::Body(body.clone()), TENANT, TZ, &store, 1000).unwrap();
        let second = process(Upstream::Body(body), TENANT, TZ, &store, 2000).unwrap();
        assert_eq!(first.ics, second.ics);
    }

    #[test]
    fn s4_dtstamp_only_change_keeps_sequence_and_rest_of_body() {
        let store = MemoryStore::new();
        let first = process(
            Upstream::Body(ics_with_event("X", "M").replace(
                "END:VEVENT",
                "DTSTAMP:20240101T000000Z\r\nEND:VEVENT",
            )),
            TENANT,
            TZ,
            &store,
            1000,
        )
        .unwrap();
        let second = process(
            Upstream::Body(ics_with_event("X", "M").replace(
                "END:VEVENT",
                "DTSTAMP:20260101T000000Z\r\nEND:VEVENT",
            )),
            TENANT,
            TZ,
            &store,
            2000,
        )
        .unwrap();
        assert!(second.ics.contains("SEQUENCE:0"));
        let strip_dtstamp = |s: &str| {
            s.lines()
                .filter(|l| !l.starts_with("DTSTAMP"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert_eq!(strip_dtstamp(&first.ics), strip_dtstamp(&second.ics));
    }

    #[test]
    fn s5_bysetpos_rewrite_applied_end_to_end() {
        let store = MemoryStore::new();
        let body = ics_with_event("X", "M").replace(
            "END:VEVENT",
            "RRULE:FREQ=MONTHLY;BYDAY=MO;BYSETPOS=1\r\nEND:VEVENT",
        );
        let out = process(Upstream::Body(body), TENANT, TZ, &store, 1000).unwrap();
        assert!(out.ics.contains("RRULE:FREQ=MONTHLY;BYDAY=1MO"));
    }

    #[test]
    fn s7_upstream_unreachable_falls_back_to_snapshot() {
        let store = MemoryStore::new();
        let first = process(Upstream::Body(ics_with_event("X", "M")), TENANT, TZ, &store, 1000).unwrap();
        let fallback = process(Upstream::Unreachable, TENANT, TZ, &store, 2000).unwrap();
        assert_eq!(first.ics, fallback.ics);
    }

    #[test]
    fn upstream_unreachable_with_no_snapshot_fails() {
        let store = MemoryStore::new();
        let err = process(Upstream::Unreachable, TENANT, TZ, &store, 1000).unwrap_err();
        assert!(matches!(err, CoreError::UpstreamUnreachable(_)));
    }

    #[test]
    fn upstream_invalid_never_overwrites_snapshot() {
        let store = MemoryStore::new();
        let first = process(Upstream::Body(ics_with_event("X", "M")), TENANT, TZ, &store, 1000).unwrap();
        let err = process(
            Upstream::Body("garbage, no vcalendar here".to_string()),
            TENANT,
            TZ,
            &store,
            2000,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::UpstreamInvalid(_)));
        let still_good = last_known_good(&store, TENANT).unwrap();
        assert_eq!(still_good.ics, first.ics);
    }

    #[test]
    fn s8_matching_upstream_hash_skips_reparse() {
        let store = MemoryStore::new();
        let body = ics_with_event("X", "M");
        let first = process(Upstream::Body(body.clone()), TENANT, TZ, &store, 1000).unwrap();
        // Tamper with the stored snapshot to prove it's returned verbatim
        // rather than recomputed.
        store::put_best_effort(&store, &snapshot_latest_key(TENANT), "SENTINEL");
        let second = process(Upstream::Body(body), TENANT, TZ, &store, 2000).unwrap();
        assert_eq!(second.ics, "SENTINEL");
        let _ = first;
    }

    #[test]
    fn empty_feed_falls_back_to_snapshot_when_present() {
        let store = MemoryStore::new();
        let first = process(Upstream::Body(ics_with_event("X", "M")), TENANT, TZ, &store, 1000).unwrap();
        let empty = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR".to_string();
        let second = process(Upstream::Body(empty), TENANT, TZ, &store, 2000).unwrap();
        assert_eq!(first.ics, second.ics);
    }

    #[test]
    fn empty_feed_with_no_snapshot_proceeds_and_cancels_prior() {
        let store = MemoryStore::new();
        process(Upstream::Body(ics_with_event("X", "M")), TENANT, TZ, &store, 1000).unwrap();
        // Force the "no snapshot" branch by clearing the stored snapshot
        // but leaving event + tenant snapshot-keys state intact.
        store.delete(&snapshot_latest_key(TENANT)).unwrap();
        let empty = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR".to_string();
        let out = process(Upstream::Body(empty), TENANT, TZ, &store, 2000).unwrap();
        assert!(out.ics.contains("STATUS:CANCELLED"));
    }
}
