use chrono::NaiveDate;
use std::fmt;

/// A versioned record valid over a date interval. An unset end date means the
/// version is open-ended.
pub trait EffectiveDated {
    fn effective_date(&self) -> NaiveDate;
    fn end_date(&self) -> Option<NaiveDate>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// More than one version matched the as-of date. This violates the
    /// non-overlap invariant; callers must abort rather than pick a winner.
    AmbiguousVersions { matches: usize, as_of: NaiveDate },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::AmbiguousVersions { matches, as_of } => write!(
                f,
                "{} configuration versions are active on {}; validity intervals overlap",
                matches, as_of
            ),
        }
    }
}

pub fn is_active<T: EffectiveDated>(version: &T, as_of: NaiveDate) -> bool {
    version.effective_date() <= as_of && version.end_date().map_or(true, |end| end >= as_of)
}

/// Select the single version applicable on `as_of` among all versions of one
/// scope. `Ok(None)` is "no active configuration" (missing data, caller warns
/// or falls back); `Err` is a data-integrity fault.
pub fn resolve_as_of<T: EffectiveDated>(
    versions: &[T],
    as_of: NaiveDate,
) -> Result<Option<&T>, ResolveError> {
    let mut matched = versions.iter().filter(|v| is_active(*v, as_of));
    match (matched.next(), matched.next()) {
        (None, _) => Ok(None),
        (Some(version), None) => Ok(Some(version)),
        (Some(_), Some(_)) => {
            let matches = versions.iter().filter(|v| is_active(*v, as_of)).count();
            Err(ResolveError::AmbiguousVersions { matches, as_of })
        }
    }
}

/// Closed-interval intersection test used by the mutation path before a new
/// version is committed.
pub fn intervals_overlap(
    a_start: NaiveDate,
    a_end: Option<NaiveDate>,
    b_start: NaiveDate,
    b_end: Option<NaiveDate>,
) -> bool {
    a_end.map_or(true, |end| end >= b_start) && b_end.map_or(true, |end| end >= a_start)
}

/// First existing version whose interval intersects the proposed one.
pub fn find_overlapping<T: EffectiveDated>(
    versions: &[T],
    proposed_start: NaiveDate,
    proposed_end: Option<NaiveDate>,
) -> Option<&T> {
    versions
        .iter()
        .find(|v| intervals_overlap(v.effective_date(), v.end_date(), proposed_start, proposed_end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Version {
        effective_date: NaiveDate,
        end_date: Option<NaiveDate>,
    }

    impl EffectiveDated for Version {
        fn effective_date(&self) -> NaiveDate {
            self.effective_date
        }
        fn end_date(&self) -> Option<NaiveDate> {
            self.end_date
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn v(start: NaiveDate, end: Option<NaiveDate>) -> Version {
        Version {
            effective_date: start,
            end_date: end,
        }
    }

    #[test]
    fn resolves_the_single_active_version() {
        let versions = vec![
            v(d(2023, 1, 1), Some(d(2023, 12, 31))),
            v(d(2024, 1, 1), None),
        ];
        let resolved = resolve_as_of(&versions, d(2024, 2, 1)).unwrap().unwrap();
        assert_eq!(resolved.effective_date, d(2024, 1, 1));
    }

    #[test]
    fn no_active_version_is_none_not_an_error() {
        let versions = vec![v(d(2024, 1, 1), None)];
        assert!(resolve_as_of(&versions, d(2023, 6, 1)).unwrap().is_none());
        assert!(resolve_as_of(&[] as &[Version], d(2023, 6, 1)).unwrap().is_none());
    }

    #[test]
    fn end_date_is_inclusive() {
        let versions = vec![v(d(2024, 1, 1), Some(d(2024, 3, 31)))];
        assert!(resolve_as_of(&versions, d(2024, 3, 31)).unwrap().is_some());
        assert!(resolve_as_of(&versions, d(2024, 4, 1)).unwrap().is_none());
    }

    #[test]
    fn overlapping_versions_fail_closed() {
        let versions = vec![
            v(d(2024, 1, 1), None),
            v(d(2024, 2, 1), Some(d(2024, 6, 30))),
        ];
        let err = resolve_as_of(&versions, d(2024, 3, 1)).unwrap_err();
        assert_eq!(
            err,
            ResolveError::AmbiguousVersions {
                matches: 2,
                as_of: d(2024, 3, 1)
            }
        );
    }

    #[test]
    fn overlap_check_catches_intersecting_intervals() {
        let existing = vec![v(d(2024, 1, 1), Some(d(2024, 6, 30)))];

        // intersects the middle
        assert!(find_overlapping(&existing, d(2024, 3, 1), Some(d(2024, 9, 30))).is_some());
        // open-ended proposal starting before the existing end
        assert!(find_overlapping(&existing, d(2024, 6, 30), None).is_some());
        // adjacent, non-overlapping
        assert!(find_overlapping(&existing, d(2024, 7, 1), None).is_none());
        // entirely before
        assert!(find_overlapping(&existing, d(2023, 1, 1), Some(d(2023, 12, 31))).is_none());
    }

    #[test]
    fn open_ended_existing_version_overlaps_any_later_start() {
        let existing = vec![v(d(2024, 1, 1), None)];
        assert!(find_overlapping(&existing, d(2030, 1, 1), None).is_some());
    }
}
