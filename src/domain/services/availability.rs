use chrono::{NaiveDate, NaiveTime};

use crate::domain::models::availability::{TeacherAvailability, TeacherUnavailability};

/// The bookable windows for one teacher on one date, in school-local time.
///
/// Active weekly windows matching the date's weekday are the base set. An
/// all-day unavailability empties the date; partial-day unavailability is
/// subtracted from each window, splitting it where needed.
pub fn windows_for_date(
    availabilities: &[TeacherAvailability],
    unavailabilities: &[TeacherUnavailability],
    date: NaiveDate,
) -> Vec<(NaiveTime, NaiveTime)> {
    let day_exceptions: Vec<&TeacherUnavailability> =
        unavailabilities.iter().filter(|u| u.date == date).collect();

    if day_exceptions.iter().any(|u| u.all_day) {
        return Vec::new();
    }

    let mut blocked: Vec<(NaiveTime, NaiveTime)> = day_exceptions
        .iter()
        .filter_map(|u| match (u.start_time, u.end_time) {
            (Some(start), Some(end)) if start < end => Some((start, end)),
            _ => None,
        })
        .collect();
    blocked.sort_by_key(|w| w.0);

    let mut windows: Vec<(NaiveTime, NaiveTime)> = availabilities
        .iter()
        .filter(|a| a.active && a.matches_date(date) && a.start_time < a.end_time)
        .map(|a| (a.start_time, a.end_time))
        .collect();
    windows.sort_by_key(|w| w.0);

    if blocked.is_empty() {
        return windows;
    }

    subtract_intervals(&windows, &blocked)
}

/// Removes sorted `to_remove` intervals from sorted `base` intervals,
/// keeping whatever remains of each base interval.
fn subtract_intervals(
    base: &[(NaiveTime, NaiveTime)],
    to_remove: &[(NaiveTime, NaiveTime)],
) -> Vec<(NaiveTime, NaiveTime)> {
    let mut result = Vec::new();

    for &(start, end) in base {
        let mut cursor = start;
        for &(r_start, r_end) in to_remove {
            if r_end <= cursor || r_start >= end {
                continue;
            }
            if r_start > cursor {
                result.push((cursor, r_start));
            }
            cursor = cursor.max(r_end);
            if cursor >= end {
                break;
            }
        }
        if cursor < end {
            result.push((cursor, end));
        }
    }

    result
}
