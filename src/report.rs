use std::io::{self, Write};

use crate::domain::YearMonth;
use crate::ledger::{Ledger, MonthOrder, format_amount};

/// Print every month: header, per-label table over all labels, then the net balance.
pub fn print_months(
    ledger: &Ledger,
    order: MonthOrder,
    only: Option<YearMonth>,
    out: &mut impl Write,
) -> io::Result<()> {
    if ledger.is_empty() {
        writeln!(out, "(no transactions)")?;
        return Ok(());
    }

    let labels = ledger.categories();
    let months = match only {
        Some(key) => match ledger.month(key) {
            Some(account) => vec![(key, account)],
            None => {
                writeln!(out, "(no transactions in {key})")?;
                return Ok(());
            }
        },
        None => ledger.months(order),
    };

    for (key, account) in months {
        writeln!(out, "{key}")?;
        account.print_summary(&labels, out)?;
        writeln!(out, "==== {} ====", format_amount(account.balance()).trim_start())?;
    }
    Ok(())
}
