use crate::leave::range::{DateRange, days_label, usage_by_year};
use crate::leave::validation::ValidationErrors;
use crate::model::leave_request::LeaveRequest;
use crate::model::leave_type::LeaveType;
use crate::model::status::StatusCode;

/// Checks a single request against the leave type's duration cap.
pub fn validate_duration(leave_type: &LeaveType, range: &DateRange) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if let Some(cap) = leave_type.cap() {
        if range.duration() > cap {
            errors.add(
                "end_date",
                format!(
                    "{} cannot exceed {} per request ({} requested)",
                    leave_type.name,
                    days_label(cap),
                    days_label(range.duration())
                ),
            );
        }
    }

    errors
}

/// Checks the yearly budget of a leave type for every calendar year the
/// candidate range touches.
///
/// `approved` holds the employee's other requests; only approved ones of the
/// same leave type are counted and `exclude` is skipped. Types without a cap,
/// or whose cap does not reset yearly, produce no errors here.
pub fn validate_annual_duration<'a, I>(
    leave_type: &LeaveType,
    range: &DateRange,
    approved: I,
    exclude: Option<u64>,
) -> ValidationErrors
where
    I: IntoIterator<Item = &'a LeaveRequest>,
{
    let mut errors = ValidationErrors::new();

    let Some(cap) = leave_type.cap() else {
        return errors;
    };
    if !leave_type.resets_yearly {
        return errors;
    }

    let counted: Vec<DateRange> = approved
        .into_iter()
        .filter(|request| request.status == StatusCode::Approved)
        .filter(|request| request.leave_type_id == leave_type.id)
        .filter(|request| Some(request.id) != exclude)
        .map(LeaveRequest::range)
        .collect();

    let used = usage_by_year(counted.iter(), range.years());

    for (year, used) in used {
        let requested = range.year_slice(year);
        if used + requested > cap {
            let remaining = (cap - used).max(chrono::Duration::zero());
            errors.add(
                "end_date",
                format!(
                    "{} is limited to {} per year; {} remaining in {}, {} requested",
                    leave_type.name,
                    days_label(cap),
                    days_label(remaining),
                    year,
                    days_label(requested)
                ),
            );
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::fixtures::{date, request};
    use crate::leave::range::DAY_MS;

    fn capped(days: i64, resets_yearly: bool) -> LeaveType {
        LeaveType {
            id: 1,
            name: "Vacation".to_string(),
            max_duration_ms: Some(days * DAY_MS),
            resets_yearly,
        }
    }

    fn range(a: (i32, u32, u32), b: (i32, u32, u32)) -> DateRange {
        DateRange::new(date(a.0, a.1, a.2), date(b.0, b.1, b.2)).unwrap()
    }

    #[test]
    fn single_request_cap() {
        let leave_type = capped(5, false);

        assert!(validate_duration(&leave_type, &range((2025, 3, 3), (2025, 3, 7))).is_empty());

        let errors = validate_duration(&leave_type, &range((2025, 3, 3), (2025, 3, 8)));
        assert_eq!(
            errors.get("end_date").unwrap()[0],
            "Vacation cannot exceed 5 day(s) per request (6 day(s) requested)"
        );
    }

    #[test]
    fn unlimited_type_never_fails() {
        let leave_type = LeaveType {
            id: 1,
            name: "Unpaid".to_string(),
            max_duration_ms: None,
            resets_yearly: true,
        };
        let existing = vec![request(1, (2025, 1, 1), (2025, 12, 31), StatusCode::Approved)];
        let long = range((2025, 1, 1), (2025, 12, 31));

        assert!(validate_duration(&leave_type, &long).is_empty());
        assert!(validate_annual_duration(&leave_type, &long, &existing, None).is_empty());
    }

    #[test]
    fn request_filling_the_budget_exactly_passes() {
        let leave_type = capped(5, true);
        let existing = vec![request(1, (2025, 2, 3), (2025, 2, 5), StatusCode::Approved)];

        let errors =
            validate_annual_duration(&leave_type, &range((2025, 6, 2), (2025, 6, 3)), &existing, None);
        assert!(errors.is_empty());
    }

    #[test]
    fn request_over_budget_reports_remaining() {
        let leave_type = capped(5, true);
        let existing = vec![request(1, (2025, 2, 3), (2025, 2, 5), StatusCode::Approved)];

        let errors =
            validate_annual_duration(&leave_type, &range((2025, 6, 2), (2025, 6, 4)), &existing, None);
        assert_eq!(
            errors.get("end_date").unwrap(),
            &["Vacation is limited to 5 day(s) per year; 2 day(s) remaining in 2025, 3 day(s) requested"
                .to_string()]
        );
    }

    #[test]
    fn each_spanned_year_is_checked_independently() {
        let leave_type = capped(5, true);
        let existing = vec![
            request(1, (2024, 3, 1), (2024, 3, 1), StatusCode::Approved),
            request(2, (2025, 3, 3), (2025, 3, 5), StatusCode::Approved),
        ];

        // 4 days fall in 2024 (1 + 4 <= 5), 3 in 2025 (3 + 3 > 5).
        let errors = validate_annual_duration(
            &leave_type,
            &range((2024, 12, 28), (2025, 1, 3)),
            &existing,
            None,
        );
        let messages = errors.get("end_date").unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("2 day(s) remaining in 2025"));
    }

    #[test]
    fn existing_request_spanning_years_is_sliced() {
        let leave_type = capped(5, true);
        // Only Jan 1-2 of this request count against 2025.
        let existing = vec![request(1, (2024, 12, 20), (2025, 1, 2), StatusCode::Approved)];

        let ok = validate_annual_duration(
            &leave_type,
            &range((2025, 5, 5), (2025, 5, 7)),
            &existing,
            None,
        );
        assert!(ok.is_empty());
    }

    #[test]
    fn ignores_other_types_statuses_and_the_excluded_request() {
        let leave_type = capped(5, true);
        let mut other_type = request(1, (2025, 2, 3), (2025, 2, 7), StatusCode::Approved);
        other_type.leave_type_id = 2;
        let existing = vec![
            other_type,
            request(2, (2025, 3, 3), (2025, 3, 7), StatusCode::InProcess),
            request(3, (2025, 4, 7), (2025, 4, 11), StatusCode::Approved),
        ];
        let candidate = range((2025, 4, 7), (2025, 4, 11));

        assert!(!validate_annual_duration(&leave_type, &candidate, &existing, None).is_empty());
        assert!(validate_annual_duration(&leave_type, &candidate, &existing, Some(3)).is_empty());
    }

    #[test]
    fn non_resetting_cap_skips_annual_check() {
        let leave_type = capped(5, false);
        let existing = vec![request(1, (2025, 2, 3), (2025, 2, 7), StatusCode::Approved)];

        assert!(
            validate_annual_duration(&leave_type, &range((2025, 6, 2), (2025, 6, 4)), &existing, None)
                .is_empty()
        );
    }
}
