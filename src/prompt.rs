use anyhow::{Result, anyhow};
use std::io::{BufRead, Write};

use crate::domain::Transaction;

/// Supplies a label for a transaction the classifier does not know yet.
pub trait LabelResolver {
    fn resolve(&mut self, txn: &Transaction) -> Result<String>;
}

impl<T: LabelResolver + ?Sized> LabelResolver for &mut T {
    fn resolve(&mut self, txn: &Transaction) -> Result<String> {
        (**self).resolve(txn)
    }
}

/// Asks a person on a line-oriented terminal. Blocks until a non-empty line
/// is entered; end of input is an error.
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> LabelResolver for PromptResolver<R, W> {
    fn resolve(&mut self, txn: &Transaction) -> Result<String> {
        loop {
            write!(self.output, "Enter classification for {txn}:")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output).ok();
                return Err(anyhow!(
                    "Input closed while waiting for a classification of '{}'",
                    txn.description()
                ));
            }

            let label = line.trim();
            if !label.is_empty() {
                return Ok(label.to_string());
            }
        }
    }
}
