use crate::domain::models::policy::{BookingPolicy, TeacherPolicyOverride};
use crate::domain::models::school::School;
use crate::domain::models::session::ClassKind;

pub const DEFAULT_MIN_NOTICE_MINUTES: i64 = 120;
pub const DEFAULT_BUFFER_MINUTES: i64 = 15;
pub const DEFAULT_TEACHER_DAILY_CAP: i64 = 8;
pub const DEFAULT_TEACHER_WEEKLY_CAP: i64 = 30;
pub const DEFAULT_STUDENT_DAILY_CAP: i64 = 3;
pub const DEFAULT_STUDENT_WEEKLY_CAP: i64 = 10;

/// Resolves the effective booking policy for one (school, teacher, kind)
/// combination. Per-field precedence, first present wins:
/// teacher override, class-kind buffer (buffer only), school setting,
/// system default. Resolution never fails; malformed school settings parse
/// to the empty document and fall through.
pub fn resolve(
    school: &School,
    teacher_override: Option<&TeacherPolicyOverride>,
    kind: Option<ClassKind>,
) -> BookingPolicy {
    let settings = school.policy_settings();

    let kind_buffer = match kind {
        Some(ClassKind::Trial) => settings.trial_buffer_minutes,
        Some(ClassKind::Group) => settings.group_buffer_minutes,
        _ => None,
    };

    BookingPolicy {
        min_notice_minutes: teacher_override
            .and_then(|o| o.min_notice_minutes)
            .or(settings.min_notice_minutes)
            .unwrap_or(DEFAULT_MIN_NOTICE_MINUTES),
        buffer_minutes: teacher_override
            .and_then(|o| o.buffer_minutes)
            .or(kind_buffer)
            .or(settings.buffer_minutes)
            .unwrap_or(DEFAULT_BUFFER_MINUTES),
        teacher_daily_cap: teacher_override
            .and_then(|o| o.daily_cap)
            .or(settings.teacher_daily_cap)
            .unwrap_or(DEFAULT_TEACHER_DAILY_CAP),
        teacher_weekly_cap: teacher_override
            .and_then(|o| o.weekly_cap)
            .or(settings.teacher_weekly_cap)
            .unwrap_or(DEFAULT_TEACHER_WEEKLY_CAP),
        student_daily_cap: settings
            .student_daily_cap
            .unwrap_or(DEFAULT_STUDENT_DAILY_CAP),
        student_weekly_cap: settings
            .student_weekly_cap
            .unwrap_or(DEFAULT_STUDENT_WEEKLY_CAP),
    }
}
