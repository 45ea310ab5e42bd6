//! Overview statistics over a search result.

use crate::error::ValidationError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverviewFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for OverviewFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(ValidationError::new("output_format must be json or csv")),
        }
    }
}

/// Counts by time left until `acceptance_end_datetime`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeadlineBuckets {
    pub closed: u64,
    pub within_7_days: u64,
    pub within_30_days: u64,
    pub later: u64,
    pub unknown: u64,
}

/// Counts by `subsidy_max_limit` in yen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AmountBuckets {
    pub under_1m: u64,
    #[serde(rename = "1m_to_10m")]
    pub from_1m_to_10m: u64,
    #[serde(rename = "10m_to_100m")]
    pub from_10m_to_100m: u64,
    #[serde(rename = "100m_or_more")]
    pub over_100m: u64,
    pub unknown: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_count: u64,
    pub subsidies_count: u64,
    pub output_format: OverviewFormat,
    pub by_deadline: DeadlineBuckets,
    pub by_amount: AmountBuckets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
}

impl Overview {
    /// Aggregate a shaped search result (`{total_count, subsidies}`) as of `now`.
    #[must_use]
    pub fn from_search_result(result: &Value, format: OverviewFormat, now: DateTime<Utc>) -> Self {
        let subsidies = result
            .get("subsidies")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut by_deadline = DeadlineBuckets::default();
        let mut by_amount = AmountBuckets::default();
        for s in subsidies {
            by_deadline.record(s.get("acceptance_end_datetime"), now);
            by_amount.record(s.get("subsidy_max_limit"));
        }

        let subsidies_count = subsidies.len() as u64;
        let mut overview = Self {
            total_count: result
                .get("total_count")
                .and_then(Value::as_u64)
                .unwrap_or(subsidies_count),
            subsidies_count,
            output_format: format,
            by_deadline,
            by_amount,
            csv: None,
        };
        if format == OverviewFormat::Csv {
            overview.csv = Some(overview.to_csv());
        }
        overview
    }

    fn to_csv(&self) -> String {
        let d = &self.by_deadline;
        let a = &self.by_amount;
        let rows = [
            ("deadline", "closed", d.closed),
            ("deadline", "within_7_days", d.within_7_days),
            ("deadline", "within_30_days", d.within_30_days),
            ("deadline", "later", d.later),
            ("deadline", "unknown", d.unknown),
            ("amount", "under_1m", a.under_1m),
            ("amount", "1m_to_10m", a.from_1m_to_10m),
            ("amount", "10m_to_100m", a.from_10m_to_100m),
            ("amount", "100m_or_more", a.over_100m),
            ("amount", "unknown", a.unknown),
        ];
        let mut out = String::from("category,bucket,count\n");
        for (category, bucket, count) in rows {
            let _ = writeln!(out, "{category},{bucket},{count}");
        }
        out
    }
}

impl DeadlineBuckets {
    fn record(&mut self, end: Option<&Value>, now: DateTime<Utc>) {
        let Some(end) = end
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
        else {
            self.unknown += 1;
            return;
        };

        let left = end - now;
        if left < Duration::zero() {
            self.closed += 1;
        } else if left <= Duration::days(7) {
            self.within_7_days += 1;
        } else if left <= Duration::days(30) {
            self.within_30_days += 1;
        } else {
            self.later += 1;
        }
    }
}

impl AmountBuckets {
    fn record(&mut self, limit: Option<&Value>) {
        // Upstream sends a number, but tolerate numeric strings.
        let yen = limit.and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        });
        match yen {
            Some(y) if y < 0.0 => self.unknown += 1,
            Some(y) if y < 1_000_000.0 => self.under_1m += 1,
            Some(y) if y < 10_000_000.0 => self.from_1m_to_10m += 1,
            Some(y) if y < 100_000_000.0 => self.from_10m_to_100m += 1,
            Some(_) => self.over_100m += 1,
            None => self.unknown += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn buckets_by_deadline_and_amount() {
        let result = json!({
            "total_count": 120,
            "subsidies": [
                {"acceptance_end_datetime": "2025-05-31T23:59:59Z", "subsidy_max_limit": 500_000},
                {"acceptance_end_datetime": "2025-06-05T17:00:00+09:00", "subsidy_max_limit": 4_500_000},
                {"acceptance_end_datetime": "2025-06-20T00:00:00Z", "subsidy_max_limit": "30000000"},
                {"acceptance_end_datetime": "2026-01-01T00:00:00Z", "subsidy_max_limit": 150_000_000},
                {"acceptance_end_datetime": "someday"},
            ],
        });

        let o = Overview::from_search_result(&result, OverviewFormat::Json, now());
        assert_eq!(o.total_count, 120);
        assert_eq!(o.subsidies_count, 5);
        assert_eq!(
            o.by_deadline,
            DeadlineBuckets {
                closed: 1,
                within_7_days: 1,
                within_30_days: 1,
                later: 1,
                unknown: 1,
            }
        );
        assert_eq!(
            o.by_amount,
            AmountBuckets {
                under_1m: 1,
                from_1m_to_10m: 1,
                from_10m_to_100m: 1,
                over_100m: 1,
                unknown: 1,
            }
        );
        assert!(o.csv.is_none());
    }

    #[test]
    fn csv_format_renders_rows_and_serializes_bucket_names() {
        let result = json!({"subsidies": [{"subsidy_max_limit": 2_000_000}]});
        let o = Overview::from_search_result(&result, OverviewFormat::Csv, now());
        assert_eq!(o.total_count, 1);

        let csv = o.csv.as_deref().unwrap_or_default();
        assert!(csv.starts_with("category,bucket,count\n"));
        assert!(csv.contains("amount,1m_to_10m,1\n"));
        assert!(csv.contains("deadline,unknown,1\n"));

        let v = serde_json::to_value(&o).expect("serialize");
        assert_eq!(v["output_format"], json!("csv"));
        assert_eq!(v["by_amount"]["1m_to_10m"], json!(1));
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("CSV".parse::<OverviewFormat>(), Ok(OverviewFormat::Csv));
        assert_eq!("".parse::<OverviewFormat>(), Ok(OverviewFormat::Json));
        assert!("xml".parse::<OverviewFormat>().is_err());
    }
}
