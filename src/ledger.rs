use anyhow::{Result, anyhow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::domain::{Transaction, YearMonth};

/// Per-label running totals for one calendar month.
///
/// Outgoing totals hold magnitudes; incoming totals hold the amounts as parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthAccount {
    outgoing: BTreeMap<String, Decimal>,
    incoming: BTreeMap<String, Decimal>,
    net: Decimal,
}

impl MonthAccount {
    /// Add `txn` to the bucket of `label`. Fails without touching any total
    /// when the label total or the month net would leave `Decimal` range.
    pub fn process(&mut self, txn: &Transaction, label: &str) -> Result<()> {
        let overflow = || {
            anyhow!(
                "Total for '{label}' in {} is out of range after {txn}",
                txn.year_month()
            )
        };
        let (bucket, amount) = if txn.is_outgoing() {
            (&mut self.outgoing, txn.amount().abs())
        } else {
            (&mut self.incoming, txn.amount())
        };
        let current = bucket.get(label).copied().unwrap_or(Decimal::ZERO);
        let total = current.checked_add(amount).ok_or_else(overflow)?;
        let net = self.net.checked_add(txn.amount()).ok_or_else(overflow)?;

        bucket.insert(label.to_string(), total);
        self.net = net;
        Ok(())
    }

    pub fn outgoing(&self, label: &str) -> Decimal {
        self.outgoing.get(label).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn incoming(&self, label: &str) -> Decimal {
        self.incoming.get(label).copied().unwrap_or(Decimal::ZERO)
    }

    /// Net movement for the month: everything in minus everything out.
    pub fn balance(&self) -> Decimal {
        self.net
    }

    /// One line per label: name, outgoing total, incoming total.
    pub fn print_summary(&self, labels: &[&str], out: &mut impl Write) -> io::Result<()> {
        let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        for label in labels {
            writeln!(
                out,
                "{:<width$}{}{}",
                label,
                format_amount(self.outgoing(label)),
                format_amount(self.incoming(label)),
                width = width
            )?;
        }
        Ok(())
    }
}

/// Two decimals, right-aligned in eight columns.
pub fn format_amount(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.round_dp(2));
    format!("{fixed:>8}")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthOrder {
    #[default]
    Chronological,
    /// Order in which each month was first seen while importing.
    Encounter,
}

/// All month buckets of one run plus every label seen.
#[derive(Debug, Default)]
pub struct Ledger {
    months: BTreeMap<YearMonth, MonthAccount>,
    first_seen: Vec<YearMonth>,
    categories: BTreeSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    fn month_mut(&mut self, key: YearMonth) -> &mut MonthAccount {
        self.months.entry(key).or_insert_with(|| {
            self.first_seen.push(key);
            MonthAccount::default()
        })
    }

    pub fn record(&mut self, txn: &Transaction, label: &str) -> Result<()> {
        self.month_mut(txn.year_month()).process(txn, label)?;
        self.categories.insert(label.to_string());
        Ok(())
    }

    pub fn month(&self, key: YearMonth) -> Option<&MonthAccount> {
        self.months.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Sorted labels.
    pub fn categories(&self) -> Vec<&str> {
        self.categories.iter().map(String::as_str).collect()
    }

    pub fn months(&self, order: MonthOrder) -> Vec<(YearMonth, &MonthAccount)> {
        match order {
            MonthOrder::Chronological => self.months.iter().map(|(k, v)| (*k, v)).collect(),
            MonthOrder::Encounter => self
                .first_seen
                .iter()
                .filter_map(|k| self.months.get(k).map(|v| (*k, v)))
                .collect(),
        }
    }
}
