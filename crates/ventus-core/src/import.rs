//! Statement normalization
//!
//! Turns pasted text, uploaded CSV, or PDF-extracted tables into canonical
//! [`Transaction`] records. Header detection maps columns to fields; when a
//! required field cannot be detected the caller gets a
//! [`ImportOutcome::NeedsMapping`] and re-runs with an explicit mapping.
//!
//! Rows that fail to parse are skipped and reported in
//! [`NormalizedBatch::skipped`], never silently dropped.

use std::sync::OnceLock;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Transaction;

/// Transaction fields a column can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Description,
    Amount,
    Merchant,
    ZipCode,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Description => "description",
            Self::Amount => "amount",
            Self::Merchant => "merchant",
            Self::ZipCode => "zip_code",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Self::Date | Self::Description | Self::Amount)
    }

    /// Header names recognized for this field, best match first
    fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Self::Date => &[
                "date",
                "transaction date",
                "trans date",
                "posted date",
                "post date",
                "posting date",
            ],
            Self::Description => &[
                "description",
                "merchant description",
                "details",
                "payee",
                "memo",
                "name",
                "transaction",
            ],
            Self::Amount => &[
                "amount",
                "transaction amount",
                "amount (usd)",
                "debit",
                "charge",
                "charges",
            ],
            Self::Merchant => &["merchant", "merchant name", "normalized merchant", "vendor"],
            Self::ZipCode => &["zip", "zip code", "zipcode", "postal code", "postcode"],
        }
    }

    fn all() -> &'static [Field] {
        &[
            Self::Date,
            Self::Amount,
            Self::Description,
            Self::Merchant,
            Self::ZipCode,
        ]
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delimited rows with their header line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRows {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-based input line each row starts on, parallel to `rows`
    #[serde(default)]
    pub lines: Vec<usize>,
}

/// Header-name mapping for the fields of a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub merchant: Option<String>,
    pub zip_code: Option<String>,
}

impl ColumnMapping {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Date => self.date.as_deref(),
            Field::Description => self.description.as_deref(),
            Field::Amount => self.amount.as_deref(),
            Field::Merchant => self.merchant.as_deref(),
            Field::ZipCode => self.zip_code.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, header: Option<String>) {
        match field {
            Field::Date => self.date = header,
            Field::Description => self.description = header,
            Field::Amount => self.amount = header,
            Field::Merchant => self.merchant = header,
            Field::ZipCode => self.zip_code = header,
        }
    }

    /// Overlay explicitly provided columns on top of this mapping
    pub fn merged_with(&self, overrides: &ColumnMapping) -> ColumnMapping {
        let mut merged = self.clone();
        for field in Field::all() {
            if let Some(header) = overrides.get(*field) {
                merged.set(*field, Some(header.to_string()));
            }
        }
        merged
    }

    /// Required fields with no column assigned
    pub fn missing_required(&self) -> Vec<Field> {
        Field::all()
            .iter()
            .copied()
            .filter(|f| f.is_required() && self.get(*f).is_none())
            .collect()
    }
}

/// Result of automatic header detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSuggestion {
    pub mapping: ColumnMapping,
    pub missing: Vec<Field>,
}

impl MappingSuggestion {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Options for a normalization run
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Explicit header mapping (overrides detection)
    pub mapping: Option<ColumnMapping>,
    /// ZIP used for rows that do not carry one
    pub anchor_zip: Option<String>,
    /// Derive a merchant name from the description when no merchant column exists
    pub derive_merchants: bool,
}

/// A row excluded from the batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number in the input, header included
    pub line: usize,
    pub reason: String,
}

/// Normalized transactions plus the rows that were rejected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBatch {
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<SkippedRow>,
}

/// Outcome of normalizing raw text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    Ready(NormalizedBatch),
    NeedsMapping {
        headers: Vec<String>,
        suggestion: MappingSuggestion,
    },
}

/// Normalize a raw text block into transactions
///
/// Without an explicit mapping, header detection must find date, description
/// and amount columns; otherwise a `NeedsMapping` outcome is returned and no
/// rows are normalized.
pub fn normalize_text(raw: &str, options: &NormalizeOptions) -> Result<ImportOutcome> {
    let parsed = parse_rows(raw)?;
    let suggestion = suggest_mapping(&parsed.headers);

    let mapping = match &options.mapping {
        Some(explicit) => suggestion.mapping.merged_with(explicit),
        None if suggestion.is_complete() => suggestion.mapping.clone(),
        None => {
            debug!(
                missing = ?suggestion.missing,
                "Header detection incomplete, manual mapping required"
            );
            return Ok(ImportOutcome::NeedsMapping {
                headers: parsed.headers,
                suggestion,
            });
        }
    };

    let batch = normalize_rows(&parsed, &mapping, options)?;
    Ok(ImportOutcome::Ready(batch))
}

/// Split raw delimited text into a header row and data rows
pub fn parse_rows(raw: &str) -> Result<ParsedRows> {
    let trimmed = raw.trim_start();
    if trimmed.trim_end().is_empty() {
        return Err(Error::NoData);
    }
    // Lines dropped ahead of the header still count toward row line numbers
    let leading_lines = raw[..raw.len() - trimmed.len()].matches('\n').count();

    let header_line = trimmed.lines().next().unwrap_or_default();
    let delimiter = sniff_delimiter(header_line);

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(trimmed.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let bytes = trimmed.as_bytes();
    let (mut scanned, mut line) = (0usize, 1usize);
    let mut rows = Vec::new();
    let mut lines = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        // Record positions are taken before blank lines are skipped
        let start = record
            .position()
            .map(|p| p.byte() as usize)
            .unwrap_or(scanned);
        let start = skip_line_breaks(bytes, start.max(scanned));
        line += bytes[scanned..start].iter().filter(|&&b| b == b'\n').count();
        scanned = start;
        lines.push(line + leading_lines);
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }

    debug!(
        "Parsed {} rows with {} columns (delimiter {:?})",
        rows.len(),
        headers.len(),
        delimiter as char
    );
    Ok(ParsedRows {
        headers,
        rows,
        lines,
    })
}

/// First byte at or after `from` that is not a line break
fn skip_line_breaks(bytes: &[u8], from: usize) -> usize {
    let from = from.min(bytes.len());
    bytes[from..]
        .iter()
        .position(|b| !matches!(b, b'\r' | b'\n'))
        .map_or(bytes.len(), |offset| from + offset)
}

/// Pick the delimiter that splits the header line into the most columns
fn sniff_delimiter(header_line: &str) -> u8 {
    [b'\t', b';', b'|', b',']
        .into_iter()
        .max_by_key(|d| {
            // Ties prefer the later candidate, so plain commas win by default
            header_line.bytes().filter(|b| b == d).count()
        })
        .unwrap_or(b',')
}

/// Detect which header maps to which field
pub fn suggest_mapping(headers: &[String]) -> MappingSuggestion {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim().trim_matches('"').to_lowercase())
        .collect();
    let mut claimed = vec![false; headers.len()];
    let mut mapping = ColumnMapping::default();

    // Exact matches first so "Merchant Description" doesn't steal the merchant slot
    for field in Field::all() {
        if let Some(idx) = field
            .synonyms()
            .iter()
            .find_map(|syn| (0..headers.len()).find(|&i| !claimed[i] && normalized[i] == *syn))
        {
            claimed[idx] = true;
            mapping.set(*field, Some(headers[idx].clone()));
        }
    }

    for field in Field::all() {
        if mapping.get(*field).is_some() {
            continue;
        }
        if let Some(idx) = field.synonyms().iter().find_map(|syn| {
            (0..headers.len()).find(|&i| !claimed[i] && normalized[i].contains(syn))
        }) {
            claimed[idx] = true;
            mapping.set(*field, Some(headers[idx].clone()));
        }
    }

    let missing = mapping.missing_required();
    MappingSuggestion { mapping, missing }
}

/// Column indices resolved against a header row
struct ResolvedColumns {
    date: usize,
    description: usize,
    amount: usize,
    merchant: Option<usize>,
    zip_code: Option<usize>,
}

fn resolve_columns(headers: &[String], mapping: &ColumnMapping) -> Result<ResolvedColumns> {
    let find = |field: Field| -> Result<Option<usize>> {
        let Some(name) = mapping.get(field) else {
            return Ok(None);
        };
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
            .map(Some)
            .ok_or_else(|| {
                Error::Import(format!(
                    "Column \"{}\" mapped to {} not found in headers",
                    name, field
                ))
            })
    };
    let required = |field: Field| -> Result<usize> {
        find(field)?.ok_or_else(|| Error::Import(format!("No column mapped to {}", field)))
    };

    Ok(ResolvedColumns {
        date: required(Field::Date)?,
        description: required(Field::Description)?,
        amount: required(Field::Amount)?,
        merchant: find(Field::Merchant)?,
        zip_code: find(Field::ZipCode)?,
    })
}

/// Normalize parsed rows with a resolved mapping
///
/// Deterministic: the same rows and mapping always produce the same
/// transactions and identifiers.
pub fn normalize_rows(
    parsed: &ParsedRows,
    mapping: &ColumnMapping,
    options: &NormalizeOptions,
) -> Result<NormalizedBatch> {
    let columns = resolve_columns(&parsed.headers, mapping)?;
    let anchor_zip = options.anchor_zip.as_deref().and_then(parse_zip);
    let mut batch = NormalizedBatch::default();

    for (position, row) in parsed.rows.iter().enumerate() {
        let line = parsed.lines.get(position).copied().unwrap_or(position + 2);
        let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or("");

        let date = match parse_date(cell(columns.date)) {
            Ok(d) => d,
            Err(e) => {
                batch.skipped.push(SkippedRow {
                    line,
                    reason: skip_reason(e),
                });
                continue;
            }
        };

        let description = cell(columns.description).to_string();
        if description.is_empty() {
            batch.skipped.push(SkippedRow {
                line,
                reason: "Missing description".to_string(),
            });
            continue;
        }

        let amount = match parse_amount(cell(columns.amount)) {
            Ok(a) => a,
            Err(e) => {
                batch.skipped.push(SkippedRow {
                    line,
                    reason: skip_reason(e),
                });
                continue;
            }
        };

        let merchant = match columns.merchant {
            Some(idx) => Some(cell(idx).to_string()).filter(|m| !m.is_empty()),
            None if options.derive_merchants => clean_merchant(&description),
            None => None,
        };

        let zip_code = columns
            .zip_code
            .and_then(|idx| parse_zip(cell(idx)))
            .or_else(|| anchor_zip.clone());

        batch.transactions.push(Transaction {
            id: generate_id(position, &date, &description, amount),
            date,
            description,
            merchant,
            amount,
            zip_code,
        });
    }

    debug!(
        "Normalized {} transactions ({} rows skipped)",
        batch.transactions.len(),
        batch.skipped.len()
    );
    Ok(batch)
}

/// Row-level message without the error category prefix
fn skip_reason(err: Error) -> String {
    match err {
        Error::Import(msg) => msg,
        other => other.to_string(),
    }
}

/// Stable identifier for a row; the row position keeps identical rows distinct
fn generate_id(position: usize, date: &NaiveDate, description: &str, amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update((position as u64).to_be_bytes());
    hasher.update(date.to_string().as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("txn_{}", &digest[..16])
}

/// Parse a date string in various common formats
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%Y-%m-%d", // 2024-01-15
        "%Y/%m/%d", // 2024/01/15
        "%m-%d-%Y", // 01-15-2024
        "%b %d, %Y", // Jan 15, 2024
        "%d %b %Y", // 15 Jan 2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
///
/// Only non-negative finite amounts are accepted.
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace("USD", "")
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    let amount = cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))?;

    if !amount.is_finite() {
        return Err(Error::Import(format!("Unable to parse amount: {}", s)));
    }
    if amount < 0.0 {
        return Err(Error::Import(format!("Negative amount: {}", s)));
    }
    Ok(amount)
}

fn zip_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{5})(?:-\d{4})?$").expect("valid zip regex"))
}

/// Extract a 5-digit ZIP from a ZIP or ZIP+4 value
pub fn parse_zip(s: &str) -> Option<String> {
    zip_regex()
        .captures(s.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn merchant_noise_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(sq\s*\*|tst\s*\*|sp\s+|pp\s*\*|paypal\s*\*|aplpay\s+)")
            .expect("valid merchant prefix regex")
    })
}

fn store_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\s*#\s*\d+.*$)|(\s+\d{3,}.*$)").expect("valid store regex"))
}

/// Derive a display merchant name from a raw statement description
///
/// Strips payment-processor prefixes, store numbers and trailing reference
/// digits, then title-cases what remains.
pub fn clean_merchant(description: &str) -> Option<String> {
    let without_prefix = merchant_noise_regex().replace(description.trim(), "");
    let without_store = store_number_regex().replace(&without_prefix, "");

    let cleaned = without_store
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> NormalizeOptions {
        NormalizeOptions {
            derive_merchants: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("01/15/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date("Jan 15, 2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("12.00 USD").unwrap(), 12.0);
        assert_eq!(parse_amount("0").unwrap(), 0.0);
        assert!(parse_amount("-123.45").is_err());
        assert!(parse_amount("(100.00)").is_err());
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_zip() {
        assert_eq!(parse_zip("94110"), Some("94110".to_string()));
        assert_eq!(parse_zip("10001-1234"), Some("10001".to_string()));
        assert_eq!(parse_zip("ABCDE"), None);
        assert_eq!(parse_zip(""), None);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(parse_rows(""), Err(Error::NoData)));
        assert!(matches!(parse_rows("   \n\t  "), Err(Error::NoData)));
        assert!(matches!(
            normalize_text("  \n ", &options()),
            Err(Error::NoData)
        ));
    }

    #[test]
    fn test_parse_rows_sniffs_tabs() {
        let raw = "Date\tDescription\tAmount\n01/02/2024\tSTARBUCKS, DOWNTOWN\t5.25\n";
        let parsed = parse_rows(raw).unwrap();
        assert_eq!(parsed.headers, vec!["Date", "Description", "Amount"]);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0][1], "STARBUCKS, DOWNTOWN");
    }

    #[test]
    fn test_parse_rows_skips_blank_lines() {
        let raw = "Date,Description,Amount\n01/02/2024,A,1\n,,\n01/03/2024,B,2";
        let parsed = parse_rows(raw).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.lines, vec![2, 4]);

        let raw = "Date,Description,Amount\r\n\r\n01/02/2024,\"A\nB\",1\r\n01/03/2024,C,2";
        let parsed = parse_rows(raw).unwrap();
        assert_eq!(parsed.lines, vec![3, 5]);
    }

    #[test]
    fn test_suggest_mapping_detects_common_headers() {
        let headers: Vec<String> = [
            "Transaction Date",
            "Merchant Description",
            "Merchant",
            "Amount (USD)",
            "Zip Code",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let suggestion = suggest_mapping(&headers);
        assert!(suggestion.is_complete());
        assert_eq!(suggestion.mapping.date.as_deref(), Some("Transaction Date"));
        assert_eq!(
            suggestion.mapping.description.as_deref(),
            Some("Merchant Description")
        );
        assert_eq!(suggestion.mapping.merchant.as_deref(), Some("Merchant"));
        assert_eq!(suggestion.mapping.amount.as_deref(), Some("Amount (USD)"));
        assert_eq!(suggestion.mapping.zip_code.as_deref(), Some("Zip Code"));
    }

    #[test]
    fn test_needs_mapping_then_manual_mapping() {
        let raw = "When,What,How Much\n01/05/2024,UBER TRIP,23.10\n01/06/2024,CHIPOTLE 1234,11.45";

        let outcome = normalize_text(raw, &options()).unwrap();
        let ImportOutcome::NeedsMapping {
            headers,
            suggestion,
        } = outcome
        else {
            panic!("expected NeedsMapping");
        };
        assert_eq!(headers, vec!["When", "What", "How Much"]);
        assert_eq!(
            suggestion.missing,
            vec![Field::Date, Field::Amount, Field::Description]
        );

        let mapped = NormalizeOptions {
            mapping: Some(ColumnMapping {
                date: Some("When".to_string()),
                description: Some("What".to_string()),
                amount: Some("How Much".to_string()),
                ..Default::default()
            }),
            ..options()
        };
        let first = normalize_text(raw, &mapped).unwrap();
        let second = normalize_text(raw, &mapped).unwrap();
        assert_eq!(first, second);

        let ImportOutcome::Ready(batch) = first else {
            panic!("expected Ready");
        };
        assert_eq!(batch.transactions.len(), 2);
        assert_eq!(batch.transactions[0].amount, 23.10);
        assert_eq!(batch.transactions[1].merchant.as_deref(), Some("Chipotle"));
    }

    #[test]
    fn test_unknown_mapped_column_is_error() {
        let raw = "Date,Description,Amount\n01/05/2024,UBER,1.00";
        let opts = NormalizeOptions {
            mapping: Some(ColumnMapping {
                amount: Some("Total".to_string()),
                ..Default::default()
            }),
            ..options()
        };
        let err = normalize_text(raw, &opts).unwrap_err();
        assert!(err.to_string().contains("Total"));
    }

    #[test]
    fn test_bad_rows_are_skipped_and_flagged() {
        let raw = "Date,Description,Amount\n\
                   01/05/2024,UBER TRIP,23.10\n\
                   not-a-date,LYFT,9.00\n\
                   01/07/2024,REFUND,-5.00\n\
                   01/08/2024,,4.00\n\
                   01/09/2024,TARGET,abc\n\
                   01/10/2024,WHOLE FOODS,88.12";

        let ImportOutcome::Ready(batch) = normalize_text(raw, &options()).unwrap() else {
            panic!("expected Ready");
        };
        assert_eq!(batch.transactions.len(), 2);
        let lines: Vec<usize> = batch.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
        assert_eq!(batch.skipped[0].reason, "Unable to parse date: not-a-date");
        assert!(batch.skipped[1].reason.starts_with("Negative"));
        assert!(batch.skipped[2].reason.contains("description"));
        assert_eq!(batch.skipped[3].reason, "Unable to parse amount: abc");
    }

    #[test]
    fn test_skipped_line_counts_blank_and_empty_lines() {
        let raw = "Date,Description,Amount\n01/02/2024,A,1.00\n,,\nnot-a-date,B,2.00";
        let ImportOutcome::Ready(batch) = normalize_text(raw, &options()).unwrap() else {
            panic!("expected Ready");
        };
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].line, 4);

        let raw = "\n\nDate,Description,Amount\n01/02/2024,A,1.00\n\nnot-a-date,B,2.00";
        let ImportOutcome::Ready(batch) = normalize_text(raw, &options()).unwrap() else {
            panic!("expected Ready");
        };
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.skipped[0].line, 6);
    }

    #[test]
    fn test_ids_stable_and_unique_for_identical_rows() {
        let raw = "Date,Description,Amount\n01/05/2024,COFFEE,3.00\n01/05/2024,COFFEE,3.00";
        let ImportOutcome::Ready(a) = normalize_text(raw, &options()).unwrap() else {
            panic!("expected Ready");
        };
        let ImportOutcome::Ready(b) = normalize_text(raw, &options()).unwrap() else {
            panic!("expected Ready");
        };
        assert_ne!(a.transactions[0].id, a.transactions[1].id);
        assert_eq!(a.transactions[0].id, b.transactions[0].id);
        assert!(a.transactions[0].id.starts_with("txn_"));
        assert_eq!(a.transactions[0].id.len(), 20);
    }

    #[test]
    fn test_anchor_zip_fallback() {
        let raw = "Date,Description,Amount,Zip\n\
                   01/05/2024,A,1.00,30301\n\
                   01/06/2024,B,2.00,\n\
                   01/07/2024,C,3.00,n/a";
        let opts = NormalizeOptions {
            anchor_zip: Some("94110".to_string()),
            ..options()
        };
        let ImportOutcome::Ready(batch) = normalize_text(raw, &opts).unwrap() else {
            panic!("expected Ready");
        };
        let zips: Vec<_> = batch
            .transactions
            .iter()
            .map(|t| t.zip_code.as_deref())
            .collect();
        assert_eq!(zips, vec![Some("30301"), Some("94110"), Some("94110")]);
    }

    #[test]
    fn test_merchant_column_takes_precedence() {
        let raw = "Date,Description,Merchant,Amount\n01/05/2024,SQ *BLUE BOTTLE 0042,Blue Bottle Coffee,6.50";
        let ImportOutcome::Ready(batch) = normalize_text(raw, &options()).unwrap() else {
            panic!("expected Ready");
        };
        assert_eq!(
            batch.transactions[0].merchant.as_deref(),
            Some("Blue Bottle Coffee")
        );
    }

    #[test]
    fn test_merchant_left_absent_when_derivation_disabled() {
        let raw = "Date,Description,Amount\n01/05/2024,SQ *BLUE BOTTLE,6.50";
        let ImportOutcome::Ready(batch) =
            normalize_text(raw, &NormalizeOptions::default()).unwrap()
        else {
            panic!("expected Ready");
        };
        assert_eq!(batch.transactions[0].merchant, None);
    }

    #[test]
    fn test_clean_merchant() {
        assert_eq!(clean_merchant("SQ *BLUE BOTTLE"), Some("Blue Bottle".to_string()));
        assert_eq!(clean_merchant("TST* SHAKE SHACK"), Some("Shake Shack".to_string()));
        assert_eq!(clean_merchant("TARGET #1234 SEATTLE"), Some("Target".to_string()));
        assert_eq!(
            clean_merchant("DELTA AIR 0062345123"),
            Some("Delta Air".to_string())
        );
        assert_eq!(clean_merchant("   "), None);
    }
}
