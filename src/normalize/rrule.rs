//! RRULE rewriting: the single required rule from §4.2 — a
//! `BYSETPOS=<n>` paired with exactly one two-letter `BYDAY=<wd>` collapses
//! to `BYDAY=<n><wd>` with `BYSETPOS` dropped. Everything else passes
//! through verbatim.

pub fn rewrite(rrule_value: &str) -> String {
    let clauses: Vec<&str> = rrule_value.split(';').collect();

    let bysetpos = clauses
        .iter()
        .find_map(|c| c.strip_prefix("BYSETPOS="))
        .filter(|v| !v.contains(','));
    let byday = clauses
        .iter()
        .find_map(|c| c.strip_prefix("BYDAY="))
        .filter(|v| !v.contains(',') && v.len() == 2);

    let (Some(n), Some(wd)) = (bysetpos, byday) else {
        return rrule_value.to_string();
    };

    let mut out: Vec<String> = clauses
        .iter()
        .filter(|c| !c.starts_with("BYSETPOS=") && !c.starts_with("BYDAY="))
        .map(|c| c.to_string())
        .collect();
    out.push(format!("BYDAY={n}{wd}"));
    out.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_bysetpos_and_single_byday() {
        let out = rewrite("FREQ=MONTHLY;BYDAY=MO;BYSETPOS=1");
        assert_eq!(out, "FREQ=MONTHLY;BYDAY=1MO");
    }

    #[test]
    fn leaves_unrelated_rules_untouched() {
        let out = rewrite("FREQ=WEEKLY;INTERVAL=2");
        assert_eq!(out, "FREQ=WEEKLY;INTERVAL=2");
    }

    #[test]
    fn leaves_multi_byday_untouched() {
        let out = rewrite("FREQ=MONTHLY;BYDAY=MO,TU;BYSETPOS=1");
        assert_eq!(out, "FREQ=MONTHLY;BYDAY=MO,TU;BYSETPOS=1");
    }

    #[test]
    fn leaves_multi_bysetpos_untouched() {
        let out = rewrite("FREQ=MONTHLY;BYDAY=MO;BYSETPOS=1,2");
        assert_eq!(out, "FREQ=MONTHLY;BYDAY=MO;BYSETPOS=1,2");
    }

    #[test]
    fn negative_bysetpos_supported() {
        let out = rewrite("FREQ=MONTHLY;BYDAY=FR;BYSETPOS=-1");
        assert_eq!(out, "FREQ=MONTHLY;BYDAY=-1FR");
    }
}
