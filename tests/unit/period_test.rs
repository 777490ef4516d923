// Property and edge tests for billing periods
//
// Covers:
// - Construction bounds (month 1..=12, year 2000..=2100)
// - Reference period is always exactly one month earlier
// - MMYYYY formatting used by the billing API

use healthsync::core::{AppError, Period};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_valid_periods_construct(month in 1u32..=12, year in 2000i32..=2100) {
        let period = Period::new(month, year).unwrap();
        prop_assert_eq!(period.month(), month);
        prop_assert_eq!(period.year(), year);
    }

    #[test]
    fn test_month_out_of_range_rejected(month in 13u32..1000, year in 2000i32..=2100) {
        prop_assert!(Period::new(month, year).is_err());
    }

    #[test]
    fn test_year_out_of_range_rejected(month in 1u32..=12, year in prop_oneof![0i32..2000, 2101i32..5000]) {
        prop_assert!(Period::new(month, year).is_err());
    }

    #[test]
    fn test_reference_is_one_month_earlier(month in 1u32..=12, year in 2000i32..=2100) {
        let period = Period::new(month, year).unwrap();
        let reference = period.reference_period();

        // Months since year 0 differ by exactly one
        let index = |p: Period| p.year() as i64 * 12 + p.month() as i64 - 1;
        prop_assert_eq!(index(period) - index(reference), 1);
        prop_assert!(reference < period);
    }

    #[test]
    fn test_formatted_is_six_digits(month in 1u32..=12, year in 2000i32..=2100) {
        let formatted = Period::new(month, year).unwrap().formatted();
        prop_assert_eq!(formatted.len(), 6);
        prop_assert!(formatted.chars().all(|c| c.is_ascii_digit()));
        prop_assert_eq!(formatted[..2].parse::<u32>().unwrap(), month);
        prop_assert_eq!(formatted[2..].parse::<i32>().unwrap(), year);
    }
}

#[test]
fn test_month_zero_is_invalid_period() {
    match Period::new(0, 2024) {
        Err(AppError::InvalidPeriod { month, year }) => {
            assert_eq!(month, 0);
            assert_eq!(year, 2024);
        }
        other => panic!("expected InvalidPeriod, got {:?}", other),
    }
}

#[test]
fn test_january_rolls_back_to_december() {
    let reference = Period::new(1, 2024).unwrap().reference_period();
    assert_eq!(reference, Period::new(12, 2023).unwrap());
}

#[test]
fn test_january_2000_reference_is_still_labelled() {
    let reference = Period::new(1, 2000).unwrap().reference_period();
    assert_eq!(reference.month(), 12);
    assert_eq!(reference.year(), 1999);
}

#[test]
fn test_formatting_examples() {
    assert_eq!(Period::new(3, 2025).unwrap().formatted(), "032025");

    let january = Period::new(1, 2026).unwrap();
    assert_eq!(january.formatted(), "012026");
    assert_eq!(january.reference_period().formatted(), "122025");
    assert_eq!(Period::new(12, 2100).unwrap().to_string(), "12/2100");
}

#[test]
fn test_deserialization_validates() {
    let ok: Period = serde_json::from_str(r#"{"month": 7, "year": 2025}"#).unwrap();
    assert_eq!(ok, Period::new(7, 2025).unwrap());

    assert!(serde_json::from_str::<Period>(r#"{"month": 13, "year": 2025}"#).is_err());
}
