// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Structured (json) and tabular (csv) export/import of cutoff records.
//!
//! The tabular form performs no quoting: a field containing the delimiter produces a row with
//! the wrong field count, which import rejects. Fields are read back verbatim, surrounding
//! whitespace included.

use std::{collections::BTreeMap, fmt, io, str::FromStr};

use chrono::{DateTime, SecondsFormat, Utc};
use core_types::Metadata;
use serde::Deserialize;

use crate::{
    error::{Result, StoreError},
    record::{CutoffDocument, CutoffRecord},
};

pub const TABULAR_HEADER: [&str; 7] = [
    "market_tag",
    "cutoff_date",
    "discovery_date",
    "precision_hours",
    "exchange",
    "primary_asset",
    "secondary_asset",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Full json document.
    Structured,
    /// Header row plus one csv row per record.
    Tabular,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Structured => "json",
            ExportFormat::Tabular => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" | "structured" => Ok(ExportFormat::Structured),
            "csv" | "tabular" => Ok(ExportFormat::Tabular),
            other => Err(StoreError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

pub(crate) fn export_document(document: &CutoffDocument, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Structured => Ok(serde_json::to_string_pretty(document)?),
        ExportFormat::Tabular => export_tabular(document.cutoffs.values()),
    }
}

/// Parses every record in `data` before returning so callers never apply a partial import.
pub(crate) fn parse_import(data: &str, format: ExportFormat) -> Result<Vec<CutoffRecord>> {
    match format {
        ExportFormat::Structured => parse_structured(data),
        ExportFormat::Tabular => parse_tabular(data),
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn export_tabular<'a>(records: impl Iterator<Item = &'a CutoffRecord>) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(TABULAR_HEADER)?;
    for record in records {
        let cutoff_date = format_ts(&record.cutoff_date);
        let discovery_date = format_ts(&record.discovery_date);
        let precision_hours = record.precision_hours.to_string();
        writer.write_record([
            record.market_tag.as_str(),
            cutoff_date.as_str(),
            discovery_date.as_str(),
            precision_hours.as_str(),
            record.exchange.as_str(),
            record.primary_asset.as_str(),
            record.secondary_asset.as_str(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| StoreError::Io(io::Error::new(err.error().kind(), err.to_string())))?;
    String::from_utf8(bytes).map_err(|err| StoreError::malformed(err.to_string()))
}

#[derive(Deserialize)]
struct StructuredImport {
    cutoffs: BTreeMap<String, CutoffRecord>,
}

fn parse_structured(data: &str) -> Result<Vec<CutoffRecord>> {
    let parsed: StructuredImport = serde_json::from_str(data)
        .map_err(|err| StoreError::malformed(format!("invalid json document: {err}")))?;
    let mut records = Vec::with_capacity(parsed.cutoffs.len());
    for (key, record) in parsed.cutoffs {
        if key != record.market_tag {
            return Err(StoreError::malformed(format!(
                "entry '{key}' holds record for '{}'",
                record.market_tag
            )));
        }
        records.push(record);
    }
    Ok(records)
}

fn parse_tabular(data: &str) -> Result<Vec<CutoffRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(data.as_bytes());
    let mut rows = reader.records();
    let header = match rows.next() {
        Some(row) => row?,
        None => return Err(StoreError::malformed("missing header row")),
    };
    if header.iter().ne(TABULAR_HEADER.iter().copied()) {
        return Err(StoreError::malformed(format!(
            "unexpected header '{}'",
            header.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut records = Vec::new();
    for (idx, row) in rows.enumerate() {
        let row = row?;
        let line = idx + 2;
        if row.len() != TABULAR_HEADER.len() {
            return Err(StoreError::malformed(format!(
                "line {line}: expected {} fields, found {}",
                TABULAR_HEADER.len(),
                row.len()
            )));
        }
        let market_tag = &row[0];
        if market_tag.is_empty() {
            return Err(StoreError::malformed(format!("line {line}: empty market_tag")));
        }
        let precision_hours = row[3].parse::<u32>().map_err(|err| {
            StoreError::malformed(format!("line {line}: precision_hours '{}': {err}", &row[3]))
        })?;
        records.push(CutoffRecord {
            market_tag: market_tag.to_string(),
            cutoff_date: parse_ts(&row[1], line, "cutoff_date")?,
            discovery_date: parse_ts(&row[2], line, "discovery_date")?,
            precision_hours,
            exchange: row[4].to_string(),
            primary_asset: row[5].to_string(),
            secondary_asset: row[6].to_string(),
            discovery_metadata: Metadata::new(),
        });
    }
    Ok(records)
}

fn parse_ts(value: &str, line: usize, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| StoreError::malformed(format!("line {line}: {field} '{value}': {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_document() -> CutoffDocument {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut document = CutoffDocument::empty(now);
        for (tag, year) in [
            ("BINANCE_BTC_USDT", 2017),
            ("KRAKEN_ETH_USD", 2016),
            ("BYBIT_SOL_USDT_PERPETUAL", 2021),
        ] {
            let cutoff = Utc.with_ymd_and_hms(year, 3, 4, 5, 0, 0).unwrap();
            document.cutoffs.insert(
                tag.to_string(),
                CutoffRecord::new(tag, cutoff, now, 24, Metadata::new()),
            );
        }
        document
    }

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Structured);
        assert_eq!("tabular".parse::<ExportFormat>().unwrap(), ExportFormat::Tabular);
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(StoreError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn tabular_export_has_header_and_one_row_per_record() {
        let csv = export_document(&sample_document(), ExportFormat::Tabular).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], TABULAR_HEADER.join(","));
        assert_eq!(
            lines[1],
            "BINANCE_BTC_USDT,2017-03-04T05:00:00Z,2024-06-01T12:00:00Z,24,BINANCE,BTC,USDT"
        );
    }

    #[test]
    fn tabular_rows_parse_back_into_records() {
        let document = sample_document();
        let csv = export_document(&document, ExportFormat::Tabular).unwrap();
        let records = parse_import(&csv, ExportFormat::Tabular).unwrap();
        let expected: Vec<CutoffRecord> = document.cutoffs.values().cloned().collect();
        assert_eq!(records, expected);
    }

    #[test]
    fn tabular_fields_keep_surrounding_whitespace() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut document = CutoffDocument::empty(now);
        let record = CutoffRecord::new(
            " PADDED_BTC_USDT ",
            Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
            now,
            24,
            Metadata::new(),
        );
        document
            .cutoffs
            .insert(record.market_tag.clone(), record.clone());

        let csv = export_document(&document, ExportFormat::Tabular).unwrap();
        let records = parse_import(&csv, ExportFormat::Tabular).unwrap();

        assert_eq!(records, vec![record]);
        assert_eq!(records[0].market_tag, " PADDED_BTC_USDT ");
        assert_eq!(records[0].secondary_asset, "USDT ");
    }

    #[test]
    fn header_only_import_is_empty() {
        let records = parse_import(&TABULAR_HEADER.join(","), ExportFormat::Tabular).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_tabular_inputs_are_rejected() {
        let header = TABULAR_HEADER.join(",");
        let cases = [
            String::new(),
            "tag,cutoff\nA_B_C,2020-01-01T00:00:00Z".to_string(),
            format!("{header}\nA_B_C,2020-01-01T00:00:00Z,2024-01-01T00:00:00Z,24"),
            format!("{header}\nA_B_C,yesterday,2024-01-01T00:00:00Z,24,A,B,C"),
            format!("{header}\nA_B_C,2020-01-01T00:00:00Z,2024-01-01T00:00:00Z,-1,A,B,C"),
        ];
        for case in cases {
            let result = parse_import(&case, ExportFormat::Tabular);
            assert!(
                matches!(result, Err(StoreError::MalformedImport { .. })),
                "expected malformed import for {case:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn structured_import_rejects_mismatched_keys() {
        let mut document = sample_document();
        let record = document.cutoffs.remove("KRAKEN_ETH_USD").unwrap();
        document.cutoffs.insert("KRAKEN_XBT_USD".to_string(), record);
        let json = serde_json::to_string(&document).unwrap();
        assert!(matches!(
            parse_import(&json, ExportFormat::Structured),
            Err(StoreError::MalformedImport { .. })
        ));
    }

    #[test]
    fn structured_import_rejects_garbage() {
        assert!(matches!(
            parse_import("not json", ExportFormat::Structured),
            Err(StoreError::MalformedImport { .. })
        ));
    }
}
