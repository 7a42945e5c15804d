use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::Write;

use crate::classifier::Classifier;
use crate::config::Source;
use crate::domain::Transaction;
use crate::ledger::Ledger;
use crate::parser::parse_file;
use crate::prompt::LabelResolver;

/// One batch import: classify every row of every source and aggregate it.
pub struct Import<'a, R> {
    classifier: &'a mut Classifier,
    resolver: R,
    watch: BTreeSet<String>,
    ledger: Ledger,
    learned: usize,
}

impl<'a, R: LabelResolver> Import<'a, R> {
    pub fn new(classifier: &'a mut Classifier, resolver: R, watch: &[String]) -> Self {
        Self {
            classifier,
            resolver,
            watch: watch.iter().cloned().collect(),
            ledger: Ledger::new(),
            learned: 0,
        }
    }

    /// Label a single transaction, asking the resolver when no rule exists,
    /// and add it to its month. Returns the label used.
    pub fn ingest(&mut self, txn: &Transaction) -> Result<String> {
        let label = match self.classifier.classify(txn) {
            Some(label) => label.to_string(),
            None => {
                let label = self.resolver.resolve(txn)?;
                tracing::debug!(description = txn.description(), label = %label, "learned rule");
                self.classifier.add_classification(txn, label.clone());
                self.learned += 1;
                label
            }
        };
        self.ledger.record(txn, &label)?;
        Ok(label)
    }

    /// Import one file. Rows matching the watch-list are echoed to `trace`.
    pub fn import_file(&mut self, source: &Source, trace: &mut impl Write) -> Result<usize> {
        let rows = parse_file(&source.path, source.format)?;
        tracing::info!(path = %source.path.display(), format = %source.format, "importing");

        let mut count = 0usize;
        for row in rows {
            let txn = row?;
            let label = self.ingest(&txn)?;
            if self.watch.contains(&label) {
                writeln!(trace, "{} {}", source.path.display(), txn)?;
            }
            count += 1;
        }

        tracing::info!(path = %source.path.display(), rows = count, "imported");
        Ok(count)
    }

    pub fn import_all(&mut self, sources: &[Source], trace: &mut impl Write) -> Result<usize> {
        let mut total = 0usize;
        for source in sources {
            total += self
                .import_file(source, trace)
                .with_context(|| format!("Import of {} aborted", source.path.display()))?;
        }
        Ok(total)
    }

    /// Number of rules added during this import.
    pub fn learned(&self) -> usize {
        self.learned
    }

    pub fn finish(self) -> Ledger {
        self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::YearMonth;
    use crate::parser::StatementFormat;
    use anyhow::anyhow;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::VecDeque;
    use std::fs;

    /// Hands out canned answers and remembers who asked.
    #[derive(Default)]
    struct Scripted {
        answers: VecDeque<String>,
        asked: Vec<String>,
    }

    impl Scripted {
        fn with(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                asked: Vec::new(),
            }
        }
    }

    impl LabelResolver for Scripted {
        fn resolve(&mut self, txn: &Transaction) -> Result<String> {
            self.asked.push(txn.description().to_string());
            self.answers
                .pop_front()
                .ok_or_else(|| anyhow!("no scripted answer for {}", txn.description()))
        }
    }

    fn dec(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn txn(description: &str, amount: &str, y: i32, m: u32, d: u32) -> Transaction {
        Transaction::new(
            description,
            dec(amount),
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        )
    }

    #[test]
    fn unknown_description_is_resolved_and_cached() {
        let mut classifier = Classifier::new();
        let mut script = Scripted::with(&["Dining"]);
        let coffee = txn("Coffee Shop", "-4.50", 2023, 5, 2);

        let mut import = Import::new(&mut classifier, &mut script, &[]);
        assert_eq!(import.ingest(&coffee).unwrap(), "Dining");
        assert_eq!(import.learned(), 1);
        let ledger = import.finish();
        let may = ledger.month(YearMonth { year: 2023, month: 5 }).unwrap();
        assert_eq!(may.outgoing("Dining"), dec("4.50"));

        assert_eq!(script.asked, ["Coffee Shop"]);
        assert_eq!(classifier.classify(&coffee), Some("Dining"));
    }

    #[test]
    fn known_description_never_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("store.json");
        fs::write(&store, r#"{"Netflix": "Subscriptions"}"#).unwrap();
        let mut classifier = Classifier::from_path(&store).unwrap();
        let mut script = Scripted::default();

        let mut import = Import::new(&mut classifier, &mut script, &[]);
        let label = import.ingest(&txn("Netflix", "-15.99", 2023, 5, 9)).unwrap();
        assert_eq!(label, "Subscriptions");
        assert_eq!(import.learned(), 0);
        drop(import);
        assert!(script.asked.is_empty());
    }

    #[test]
    fn repeated_description_prompts_once() {
        let mut classifier = Classifier::new();
        let mut script = Scripted::with(&["Dining"]);

        let mut import = Import::new(&mut classifier, &mut script, &[]);
        import.ingest(&txn("Coffee Shop", "-4.50", 2023, 5, 2)).unwrap();
        import.ingest(&txn("Coffee Shop", "-3.00", 2023, 5, 9)).unwrap();
        let ledger = import.finish();

        assert_eq!(script.asked.len(), 1);
        let may = ledger.month(YearMonth { year: 2023, month: 5 }).unwrap();
        assert_eq!(may.outgoing("Dining"), dec("7.50"));
    }

    #[test]
    fn imports_files_in_order_and_traces_watched_labels() {
        let dir = tempfile::tempdir().unwrap();
        let joint = dir.path().join("joint.csv");
        let card = dir.path().join("card.csv");
        fs::write(
            &joint,
            "1,Landlord,x,x,x,-20.00,01/06/2023\n1,Acme,x,x,x,1000.00,28/06/2023\n",
        )
        .unwrap();
        fs::write(&card, "9,D,12.00,Mystery,03/06/2023\n").unwrap();

        let mut classifier = Classifier::new();
        classifier.set("Landlord", "Rent");
        classifier.set("Acme", "Salary");
        let mut script = Scripted::with(&["Unknown"]);
        let sources = [
            Source::new(&joint, StatementFormat::Account),
            Source::new(&card, StatementFormat::CreditCard),
        ];

        let mut trace = Vec::new();
        let mut import = Import::new(&mut classifier, &mut script, &["Unknown".to_string()]);
        let count = import.import_all(&sources, &mut trace).unwrap();
        let ledger = import.finish();

        assert_eq!(count, 3);
        assert_eq!(
            String::from_utf8(trace).unwrap(),
            format!("{} Mystery (2023-06-03, -12.00)\n", card.display())
        );
        let june = ledger.month(YearMonth { year: 2023, month: 6 }).unwrap();
        assert_eq!(june.balance(), dec("968.00"));
        assert_eq!(ledger.categories(), ["Rent", "Salary", "Unknown"]);
    }

    #[test]
    fn malformed_row_aborts_the_import() {
        let dir = tempfile::tempdir().unwrap();
        let joint = dir.path().join("joint.csv");
        fs::write(
            &joint,
            "1,Landlord,x,x,x,-20.00,01/06/2023\n1,Acme,x,x,x,lots,28/06/2023\n",
        )
        .unwrap();

        let mut classifier = Classifier::new();
        let mut script = Scripted::with(&["Rent", "Salary"]);
        let mut import = Import::new(&mut classifier, &mut script, &[]);
        let err = import
            .import_all(&[Source::new(&joint, StatementFormat::Account)], &mut Vec::new())
            .unwrap_err();

        let msg = format!("{err:#}");
        assert!(msg.contains("aborted"), "{msg}");
        assert!(msg.contains("invalid amount 'lots'"), "{msg}");
    }

    #[test]
    fn missing_source_aborts_the_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut classifier = Classifier::new();
        let mut script = Scripted::default();
        let mut import = Import::new(&mut classifier, &mut script, &[]);
        let err = import
            .import_all(
                &[Source::new(dir.path().join("gone.csv"), StatementFormat::Account)],
                &mut Vec::new(),
            )
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to open"));
    }

    #[test]
    fn trace_names_the_full_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let mine = dir.path().join("mine");
        let theirs = dir.path().join("theirs");
        fs::create_dir_all(&mine).unwrap();
        fs::create_dir_all(&theirs).unwrap();
        let a = mine.join("card.csv");
        let b = theirs.join("card.csv");
        fs::write(&a, "9,D,1.00,Kiosk,03/06/2023\n").unwrap();
        fs::write(&b, "9,D,2.00,Kiosk,04/06/2023\n").unwrap();

        let mut classifier = Classifier::new();
        classifier.set("Kiosk", "Unknown");
        let mut import = Import::new(&mut classifier, Scripted::default(), &["Unknown".to_string()]);
        let mut trace = Vec::new();
        import
            .import_all(
                &[
                    Source::new(&a, StatementFormat::CreditCard),
                    Source::new(&b, StatementFormat::CreditCard),
                ],
                &mut trace,
            )
            .unwrap();

        let lines: Vec<String> = String::from_utf8(trace)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(
            lines,
            [
                format!("{} Kiosk (2023-06-03, -1.00)", a.display()),
                format!("{} Kiosk (2023-06-04, -2.00)", b.display()),
            ]
        );
    }

    #[test]
    fn out_of_range_total_aborts_instead_of_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let joint = dir.path().join("joint.csv");
        fs::write(
            &joint,
            "1,Big,x,x,x,79228162514264337593543950335,01/06/2023\n\
             1,Big,x,x,x,79228162514264337593543950335,02/06/2023\n",
        )
        .unwrap();

        let mut classifier = Classifier::new();
        classifier.set("Big", "X");
        let mut import = Import::new(&mut classifier, Scripted::default(), &[]);
        let err = import
            .import_all(&[Source::new(&joint, StatementFormat::Account)], &mut Vec::new())
            .unwrap_err();

        let msg = format!("{err:#}");
        assert!(msg.contains("joint.csv aborted"), "{msg}");
        assert!(msg.contains("out of range"), "{msg}");
    }
}
