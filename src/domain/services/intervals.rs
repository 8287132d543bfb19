use chrono::{Duration, NaiveDateTime, NaiveTime};

/// Half-open interval overlap: touching endpoints do not overlap.
pub fn overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Expands interval A by `buffer_minutes` on both sides before testing.
/// The expansion is plain datetime arithmetic, so a buffer can spill past
/// midnight into the neighboring calendar day.
pub fn buffered_overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
    buffer_minutes: i64,
) -> bool {
    let pad = Duration::minutes(buffer_minutes);
    overlaps(a_start - pad, a_end + pad, b_start, b_end)
}

/// A wall-clock end numerically before its start means the period ends on
/// the following calendar date.
pub fn crosses_midnight(start: NaiveTime, end: NaiveTime) -> bool {
    start > end
}

/// Duration in whole minutes, adding 24h when the period crosses midnight.
pub fn span_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    let diff = (end - start).num_minutes();
    if crosses_midnight(start, end) { diff + 24 * 60 } else { diff }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 15).unwrap().and_time(t(h, m))
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let cases = [
            ((9, 0), (10, 0), (9, 30), (11, 0)),
            ((9, 0), (10, 0), (10, 0), (11, 0)),
            ((9, 0), (12, 0), (10, 0), (11, 0)),
            ((9, 0), (10, 0), (14, 0), (15, 0)),
        ];
        for ((a1, a2), (b1, b2), (c1, c2), (d1, d2)) in cases {
            let forward = overlaps(dt(a1, a2), dt(b1, b2), dt(c1, c2), dt(d1, d2));
            let backward = overlaps(dt(c1, c2), dt(d1, d2), dt(a1, a2), dt(b1, b2));
            assert_eq!(forward, backward);
        }
    }

    #[test]
    fn test_touching_endpoints_do_not_overlap() {
        assert!(!overlaps(dt(9, 0), dt(10, 0), dt(10, 0), dt(11, 0)));
        assert!(!overlaps(dt(10, 0), dt(11, 0), dt(9, 0), dt(10, 0)));
    }

    #[test]
    fn test_zero_buffer_degrades_to_plain_overlap() {
        let pairs = [
            ((9, 0), (10, 0), (9, 30), (11, 0)),
            ((9, 0), (10, 0), (10, 0), (11, 0)),
            ((9, 0), (10, 0), (11, 0), (12, 0)),
        ];
        for ((a1, a2), (b1, b2), (c1, c2), (d1, d2)) in pairs {
            assert_eq!(
                buffered_overlaps(dt(a1, a2), dt(b1, b2), dt(c1, c2), dt(d1, d2), 0),
                overlaps(dt(a1, a2), dt(b1, b2), dt(c1, c2), dt(d1, d2)),
            );
        }
    }

    #[test]
    fn test_buffer_extends_conflict_window() {
        // Session 10:00-11:00 with a 15 minute buffer blocks 11:05 but not 11:15.
        assert!(buffered_overlaps(dt(11, 5), dt(12, 0), dt(10, 0), dt(11, 0), 15));
        assert!(!buffered_overlaps(dt(11, 15), dt(12, 0), dt(10, 0), dt(11, 0), 15));
    }

    #[test]
    fn test_buffer_spills_across_midnight() {
        let prev_day_end = NaiveDate::from_ymd_opt(2025, 8, 14)
            .unwrap()
            .and_time(t(23, 50));
        let prev_day_start = NaiveDate::from_ymd_opt(2025, 8, 14)
            .unwrap()
            .and_time(t(23, 0));
        // 00:05 next day is within a 15 minute buffer of a 23:00-23:50 session.
        assert!(buffered_overlaps(dt(0, 5), dt(1, 0), prev_day_start, prev_day_end, 15));
    }

    #[test]
    fn test_crosses_midnight() {
        assert!(crosses_midnight(t(23, 0), t(1, 0)));
        assert!(!crosses_midnight(t(9, 0), t(10, 0)));
        assert!(!crosses_midnight(t(9, 0), t(9, 0)));
    }

    #[test]
    fn test_span_minutes() {
        assert_eq!(span_minutes(t(9, 0), t(10, 30)), 90);
        assert_eq!(span_minutes(t(23, 0), t(1, 0)), 120);
        assert_eq!(span_minutes(t(23, 30), t(0, 15)), 45);
    }
}
