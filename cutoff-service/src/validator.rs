// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use history_store::CutoffRecord;
use serde::Serialize;

/// Verdict on whether a requested period is covered by available history.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// First instant inside available history, set when the request starts too early.
    pub adjusted_start: Option<DateTime<Utc>>,
    pub cutoff_date: Option<DateTime<Utc>>,
    pub message: String,
    pub requires_sync: bool,
}

/// Compares requested analysis periods against stored cutoffs.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeriodValidator;

impl PeriodValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        stored: Option<&CutoffRecord>,
        requested_start: DateTime<Utc>,
        requested_end: DateTime<Utc>,
    ) -> ValidationResult {
        let Some(record) = stored else {
            return ValidationResult {
                is_valid: false,
                adjusted_start: None,
                cutoff_date: None,
                message: "cutoff unknown: discovery required before validating this period"
                    .to_string(),
                requires_sync: true,
            };
        };

        if requested_end <= requested_start {
            return ValidationResult {
                is_valid: false,
                adjusted_start: None,
                cutoff_date: Some(record.cutoff_date),
                message: format!(
                    "empty period: end {} is not after start {}",
                    day(requested_end),
                    day(requested_start)
                ),
                requires_sync: false,
            };
        }

        let cutoff = record.cutoff_date;
        if requested_start >= cutoff {
            return ValidationResult {
                is_valid: true,
                adjusted_start: None,
                cutoff_date: Some(cutoff),
                message: format!("period is within available history (cutoff {})", day(cutoff)),
                requires_sync: false,
            };
        }

        let adjusted = cutoff + Duration::days(1);
        let message = if adjusted >= requested_end {
            format!(
                "entire period predates available history (cutoff {})",
                day(cutoff)
            )
        } else {
            format!(
                "requested start {} predates cutoff {}; earliest usable start is {}",
                day(requested_start),
                day(cutoff),
                day(adjusted)
            )
        };
        ValidationResult {
            is_valid: false,
            adjusted_start: Some(adjusted),
            cutoff_date: Some(cutoff),
            message,
            requires_sync: true,
        }
    }
}

fn day(value: DateTime<Utc>) -> String {
    if value.time() == chrono::NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::Metadata;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn record(cutoff: DateTime<Utc>) -> CutoffRecord {
        CutoffRecord::new(
            "BINANCEFUTURES_BTC_USDT",
            cutoff,
            at(2024, 1, 1),
            24,
            Metadata::new(),
        )
    }

    #[test]
    fn early_start_is_adjusted_past_cutoff() {
        let stored = record(at(2019, 9, 13));
        let result =
            PeriodValidator::new().validate(Some(&stored), at(2018, 1, 1), at(2024, 1, 1));

        assert!(!result.is_valid);
        assert!(result.requires_sync);
        assert_eq!(result.adjusted_start, Some(at(2019, 9, 14)));
        assert_eq!(result.cutoff_date, Some(at(2019, 9, 13)));
        assert!(result.message.contains("2019-09-14"), "{}", result.message);
    }

    #[test]
    fn start_at_or_after_cutoff_is_valid() {
        let stored = record(at(2019, 9, 13));
        let validator = PeriodValidator::new();

        let exact = validator.validate(Some(&stored), at(2019, 9, 13), at(2020, 1, 1));
        assert!(exact.is_valid);
        assert!(!exact.requires_sync);
        assert_eq!(exact.adjusted_start, None);

        let later = validator.validate(Some(&stored), at(2021, 1, 1), at(2022, 1, 1));
        assert!(later.is_valid);
    }

    #[test]
    fn unknown_cutoff_requires_sync() {
        let result = PeriodValidator::new().validate(None, at(2020, 1, 1), at(2021, 1, 1));
        assert!(!result.is_valid);
        assert!(result.requires_sync);
        assert!(result.cutoff_date.is_none());
        assert!(result.message.contains("unknown"));
    }

    #[test]
    fn unknown_cutoff_takes_precedence_over_empty_period() {
        let result = PeriodValidator::new().validate(None, at(2021, 1, 1), at(2020, 1, 1));
        assert!(!result.is_valid);
        assert!(result.requires_sync);
        assert!(result.message.contains("unknown"));
    }

    #[test]
    fn empty_period_never_requires_sync() {
        let stored = record(at(2019, 9, 13));
        let result =
            PeriodValidator::new().validate(Some(&stored), at(2021, 1, 1), at(2021, 1, 1));
        assert!(!result.is_valid);
        assert!(!result.requires_sync);
        assert!(result.message.starts_with("empty period"));
    }

    #[test]
    fn period_entirely_before_cutoff_says_so() {
        let stored = record(at(2019, 9, 13));
        let result =
            PeriodValidator::new().validate(Some(&stored), at(2018, 1, 1), at(2019, 6, 1));
        assert!(!result.is_valid);
        assert!(result.message.starts_with("entire period predates"));
    }
}
