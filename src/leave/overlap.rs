use crate::leave::range::DateRange;
use crate::leave::validation::ValidationErrors;
use crate::model::leave_request::LeaveRequest;
use crate::model::status::StatusCode;

/// Whether `candidate` shares a day with any approved request in `existing`.
///
/// Requests in any other status are ignored, as is `exclude` so a request
/// being edited never collides with its own stored dates.
pub fn overlaps_any<'a, I>(candidate: &DateRange, existing: I, exclude: Option<u64>) -> bool
where
    I: IntoIterator<Item = &'a LeaveRequest>,
{
    existing
        .into_iter()
        .filter(|request| request.status == StatusCode::Approved)
        .filter(|request| Some(request.id) != exclude)
        .any(|request| candidate.overlaps(&request.range()))
}

pub fn overlap_errors<'a, I>(candidate: &DateRange, existing: I, exclude: Option<u64>) -> ValidationErrors
where
    I: IntoIterator<Item = &'a LeaveRequest>,
{
    if overlaps_any(candidate, existing, exclude) {
        ValidationErrors::single(
            "start_date",
            "The requested dates overlap an already approved leave request",
        )
    } else {
        ValidationErrors::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::fixtures::{date, request};

    fn candidate(a: (i32, u32, u32), b: (i32, u32, u32)) -> DateRange {
        DateRange::new(date(a.0, a.1, a.2), date(b.0, b.1, b.2)).unwrap()
    }

    #[test]
    fn disjoint_approved_requests_never_overlap() {
        let existing = vec![
            request(1, (2025, 2, 1), (2025, 2, 5), StatusCode::Approved),
            request(2, (2025, 2, 20), (2025, 2, 21), StatusCode::Approved),
        ];

        assert!(!overlaps_any(&candidate((2025, 2, 6), (2025, 2, 19)), &existing, None));
    }

    #[test]
    fn endpoint_inside_existing_range_overlaps() {
        let existing = vec![request(1, (2025, 2, 1), (2025, 2, 5), StatusCode::Approved)];

        assert!(overlaps_any(&candidate((2025, 1, 28), (2025, 2, 1)), &existing, None));
        assert!(overlaps_any(&candidate((2025, 2, 5), (2025, 2, 9)), &existing, None));
    }

    #[test]
    fn candidate_containing_existing_overlaps() {
        let existing = vec![request(1, (2025, 2, 3), (2025, 2, 4), StatusCode::Approved)];

        assert!(overlaps_any(&candidate((2025, 2, 1), (2025, 2, 10)), &existing, None));
    }

    #[test]
    fn only_approved_requests_count() {
        let existing = vec![
            request(1, (2025, 2, 1), (2025, 2, 5), StatusCode::InProcess),
            request(2, (2025, 2, 1), (2025, 2, 5), StatusCode::Denied),
            request(3, (2025, 2, 1), (2025, 2, 5), StatusCode::Requested),
        ];

        assert!(!overlaps_any(&candidate((2025, 2, 2), (2025, 2, 3)), &existing, None));
    }

    #[test]
    fn excluded_request_is_skipped() {
        let existing = vec![request(9, (2025, 2, 1), (2025, 2, 5), StatusCode::Approved)];
        let range = candidate((2025, 2, 2), (2025, 2, 3));

        assert!(overlaps_any(&range, &existing, None));
        assert!(!overlaps_any(&range, &existing, Some(9)));
    }

    #[test]
    fn overlap_is_reported_on_start_date() {
        let existing = vec![request(1, (2025, 2, 1), (2025, 2, 5), StatusCode::Approved)];
        let errors = overlap_errors(&candidate((2025, 2, 4), (2025, 2, 6)), &existing, None);

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["start_date"]);
    }
}
