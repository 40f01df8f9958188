//! Lockup formatting helpers.

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const YEAR: u64 = 365 * DAY;

const UNITS: [(u64, &str); 6] = [(YEAR, "y"), (WEEK, "w"), (DAY, "d"), (HOUR, "h"), (MINUTE, "m"), (1, "s")];

/// Remaining lockup as its two largest units, e.g. `"1y 3w"` or `"5h 2m"`.
///
/// Zero reads as `"unlocked"`.
pub fn format_lockup(secs: u64) -> String {
    if secs == 0 {
        return "unlocked".to_string();
    }
    let Some(lead) = UNITS.iter().position(|(size, _)| secs >= *size) else {
        return format!("{secs}s");
    };
    let (size, unit) = UNITS[lead];
    let head = format!("{}{unit}", secs / size);
    match UNITS.get(lead + 1) {
        Some((next, next_unit)) => format!("{head} {}{next_unit}", (secs % size) / next),
        None => head,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_two_largest_units() {
        assert_eq!(format_lockup(0), "unlocked");
        assert_eq!(format_lockup(42), "42s");
        assert_eq!(format_lockup(300), "5m 0s");
        assert_eq!(format_lockup(7_260), "2h 1m");
        assert_eq!(format_lockup(10 * DAY + 5 * HOUR), "1w 3d");
        assert_eq!(format_lockup(YEAR + 3 * WEEK + DAY), "1y 3w");
    }
}
