use chrono::{Datelike, Duration, NaiveDate};

/// Monday of the week owning the given date. Weeks run Monday through Sunday.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// The Sunday ending the week that owns the given date.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    week_monday(date) + Duration::days(6)
}

/// Every Monday from the week owning `start` up to and including `end`.
pub fn mondays_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut mondays = Vec::new();
    let mut monday = week_monday(start);
    while monday <= end {
        mondays.push(monday);
        monday += Duration::days(7);
    }
    mondays
}

/// Billing periods run from the 16th of one month through the 15th of the
/// next. `month` is the month the period starts in.
pub fn billing_period(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 16)?;
    let (end_year, end_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(end_year, end_month, 15)?;
    Some((start, end))
}

/// The billing period containing the given date.
pub fn billing_period_for(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    if date.day() >= 16 {
        billing_period(date.year(), date.month())
    } else if date.month() == 1 {
        billing_period(date.year() - 1, 12)
    } else {
        billing_period(date.year(), date.month() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn monday_of_a_midweek_date() {
        // 2024-02-01 is a Thursday
        assert_eq!(week_monday(d(2024, 2, 1)), d(2024, 1, 29));
        assert_eq!(week_ending(d(2024, 2, 1)), d(2024, 2, 4));
    }

    #[test]
    fn monday_is_its_own_week_start() {
        assert_eq!(week_monday(d(2024, 1, 29)), d(2024, 1, 29));
    }

    #[test]
    fn sunday_belongs_to_the_preceding_monday() {
        // 2024-02-04 is a Sunday
        assert_eq!(week_monday(d(2024, 2, 4)), d(2024, 1, 29));
        assert_eq!(week_ending(d(2024, 2, 4)), d(2024, 2, 4));
    }

    #[test]
    fn week_boundary_across_year_end() {
        // 2024-01-01 is a Monday; 2023-12-31 is the Sunday before it
        assert_eq!(week_monday(d(2023, 12, 31)), d(2023, 12, 25));
        assert_eq!(week_ending(d(2024, 1, 1)), d(2024, 1, 7));
    }

    #[test]
    fn mondays_cover_the_range_inclusive() {
        let mondays = mondays_between(d(2024, 1, 16), d(2024, 2, 15));
        assert_eq!(
            mondays,
            vec![
                d(2024, 1, 15),
                d(2024, 1, 22),
                d(2024, 1, 29),
                d(2024, 2, 5),
                d(2024, 2, 12),
            ]
        );
    }

    #[test]
    fn billing_period_runs_16th_to_15th() {
        assert_eq!(billing_period(2024, 1), Some((d(2024, 1, 16), d(2024, 2, 15))));
        assert_eq!(billing_period(2024, 12), Some((d(2024, 12, 16), d(2025, 1, 15))));
        assert_eq!(billing_period(2024, 13), None);
    }

    #[test]
    fn billing_period_for_date_respects_the_16th_boundary() {
        assert_eq!(
            billing_period_for(d(2024, 3, 15)),
            Some((d(2024, 2, 16), d(2024, 3, 15)))
        );
        assert_eq!(
            billing_period_for(d(2024, 3, 16)),
            Some((d(2024, 3, 16), d(2024, 4, 15)))
        );
        assert_eq!(
            billing_period_for(d(2024, 1, 10)),
            Some((d(2023, 12, 16), d(2024, 1, 15)))
        );
    }
}
