//! Bank statement CSV parsing.
//!
//! Exports carry no header row; every line is a transaction. Two layouts are
//! supported, see [`StatementFormat`].

use chrono::NaiveDate;
use csv::{StringRecord, StringRecordsIntoIter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::domain::Transaction;

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Error)]
pub enum RowError {
    #[error("Failed to open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{}:{line}: unreadable CSV row", .path.display())]
    Csv {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("{}:{line}: expected at least {expected} columns, found {found}", .path.display())]
    MissingColumns {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("{}:{line}: invalid amount '{raw}'", .path.display())]
    Amount {
        path: PathBuf,
        line: u64,
        raw: String,
    },
    #[error("{}:{line}: invalid date '{raw}' (expected DD/MM/YYYY)", .path.display())]
    Date {
        path: PathBuf,
        line: u64,
        raw: String,
    },
}

/// Column layout of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementFormat {
    /// `_, flag, amount, description, date`. Flag `D` marks a debit.
    CreditCard,
    /// `_, description, _, _, _, signed amount, date`.
    Account,
}

impl StatementFormat {
    pub fn name(&self) -> &'static str {
        match self {
            StatementFormat::CreditCard => "credit_card",
            StatementFormat::Account => "account",
        }
    }

    fn min_columns(&self) -> usize {
        match self {
            StatementFormat::CreditCard => 5,
            StatementFormat::Account => 7,
        }
    }

    /// Map one CSV record to a transaction.
    pub fn extract(&self, row: &Row<'_>) -> Result<Transaction, RowError> {
        let found = row.record.len();
        if found < self.min_columns() {
            return Err(RowError::MissingColumns {
                path: row.path.to_path_buf(),
                line: row.line,
                expected: self.min_columns(),
                found,
            });
        }

        match self {
            StatementFormat::CreditCard => {
                let magnitude = row.amount(2)?;
                let amount = if row.field(1) == "D" {
                    -magnitude
                } else {
                    magnitude
                };
                Ok(Transaction::new(row.field(3), amount, row.date(4)?))
            }
            StatementFormat::Account => Ok(Transaction::new(
                row.field(1),
                row.amount(5)?,
                row.date(6)?,
            )),
        }
    }
}

impl fmt::Display for StatementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatementFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "credit_card" | "credit" => Ok(StatementFormat::CreditCard),
            "account" => Ok(StatementFormat::Account),
            other => Err(format!(
                "Unknown format '{other}'. Expected credit_card or account"
            )),
        }
    }
}

/// A raw record together with where it came from.
pub struct Row<'a> {
    path: &'a Path,
    line: u64,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn field(&self, idx: usize) -> &str {
        self.record.get(idx).unwrap_or("")
    }

    fn amount(&self, idx: usize) -> Result<Decimal, RowError> {
        let raw = self.field(idx);
        raw.trim().parse::<Decimal>().map_err(|_| RowError::Amount {
            path: self.path.to_path_buf(),
            line: self.line,
            raw: raw.to_string(),
        })
    }

    fn date(&self, idx: usize) -> Result<NaiveDate, RowError> {
        let raw = self.field(idx);
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| RowError::Date {
            path: self.path.to_path_buf(),
            line: self.line,
            raw: raw.to_string(),
        })
    }
}

/// Lazy iterator over the transactions of one file.
///
/// Single pass; the file handle is released when the iterator is dropped.
pub struct StatementRows {
    path: PathBuf,
    format: StatementFormat,
    records: StringRecordsIntoIter<File>,
    line: u64,
}

impl Iterator for StatementRows {
    type Item = Result<Transaction, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.records.next()?;
        self.line += 1;
        let record = match next {
            Ok(r) => r,
            Err(source) => {
                return Some(Err(RowError::Csv {
                    path: self.path.clone(),
                    line: self.line,
                    source,
                }));
            }
        };
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(self.line);
        let row = Row {
            path: &self.path,
            line,
            record: &record,
        };
        Some(self.format.extract(&row))
    }
}

pub fn parse_file(path: &Path, format: StatementFormat) -> Result<StatementRows, RowError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| RowError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(StatementRows {
        path: path.to_path_buf(),
        format,
        records: reader.into_records(),
        line: 0,
    })
}
