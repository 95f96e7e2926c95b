use std::time::Duration;

/// Formats a duration, rounded to whole seconds (halves to even), as
/// `H:MM:SS`, with a day count in front once it reaches 24 hours:
/// `1 day, 2:03:04`.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs_f64().round_ties_even() as u64;
    let (days, rest) = (total / 86_400, total % 86_400);
    let (h, m, s) = (rest / 3600, rest % 3600 / 60, rest % 60);

    match days {
        0 => format!("{h}:{m:02}:{s:02}"),
        1 => format!("1 day, {h}:{m:02}:{s:02}"),
        _ => format!("{days} days, {h}:{m:02}:{s:02}"),
    }
}
