use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// One parsed statement row.
///
/// The sign of `amount` is normalized by the parser: negative means money left
/// the account, zero or positive means money came in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    description: String,
    amount: Decimal,
    date: NaiveDate,
}

impl Transaction {
    pub fn new(description: impl Into<String>, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_outgoing(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::of(self.date())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.description,
            self.date.format("%Y-%m-%d"),
            self.amount
        )
    }
}

/// Calendar month bucket. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (y, m) = raw
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("Invalid month '{raw}'. Expected YYYY-MM"))?;
        let year: i32 = y
            .parse()
            .map_err(|_| anyhow!("Invalid year in '{raw}'. Expected YYYY-MM"))?;
        let month: u32 = m
            .parse()
            .map_err(|_| anyhow!("Invalid month in '{raw}'. Expected YYYY-MM"))?;
        if !(1..=12).contains(&month) {
            return Err(anyhow!("Invalid month value in '{raw}'"));
        }
        Ok(Self { year, month })
    }
}
