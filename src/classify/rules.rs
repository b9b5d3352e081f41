//! Ordered when/then rule sets producing a text column.

use std::sync::Arc;

use arrow::array::{Array, StringArray};

use crate::error::Result;
use crate::filter::Expr;
use crate::table::Table;

/// Value a rule assigns
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Literal(String),
    Column(String),
    Null,
}

impl Output {
    #[must_use]
    pub fn lit(value: &str) -> Self {
        Self::Literal(value.to_string())
    }

    #[must_use]
    pub fn col(column: &str) -> Self {
        Self::Column(column.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Rule {
    when: Expr,
    then: Output,
}

/// Rules evaluated top to bottom; the first matching rule decides a row
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    name: String,
    rules: Vec<Rule>,
    otherwise: Output,
}

impl RuleSet {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Vec::new(),
            otherwise: Output::Null,
        }
    }

    #[must_use]
    pub fn when(mut self, when: Expr, then: Output) -> Self {
        self.rules.push(Rule { when, then });
        self
    }

    #[must_use]
    pub fn otherwise(mut self, output: Output) -> Self {
        self.otherwise = output;
        self
    }

    /// Evaluate the rules for every row
    pub fn evaluate(&self, table: &Table) -> Result<StringArray> {
        let rows = table.num_rows();
        let mut decided = vec![false; rows];
        let mut values: Vec<Option<String>> = vec![None; rows];

        for rule in &self.rules {
            let mask = rule.when.evaluate_mask(table)?;
            let source = resolve(table, &rule.then)?;
            for row in 0..rows {
                if !decided[row] && mask.value(row) {
                    decided[row] = true;
                    values[row] = pick(&rule.then, source.as_ref(), row);
                }
            }
        }

        let source = resolve(table, &self.otherwise)?;
        for row in (0..rows).filter(|&row| !decided[row]) {
            values[row] = pick(&self.otherwise, source.as_ref(), row);
        }

        log::debug!(
            "{}: rule set {} matched {} of {} rows before the default",
            table.name(),
            self.name,
            decided.iter().filter(|d| **d).count(),
            rows
        );
        Ok(StringArray::from(values))
    }

    /// Add or replace `target` with the rule results
    pub fn apply(&self, table: &Table, target: &str) -> Result<Table> {
        let values = self.evaluate(table)?;
        table.with_column(target, Arc::new(values))
    }
}

fn resolve(table: &Table, output: &Output) -> Result<Option<StringArray>> {
    match output {
        Output::Column(column) => Ok(Some(table.string_column(column)?)),
        Output::Literal(_) | Output::Null => Ok(None),
    }
}

fn pick(output: &Output, source: Option<&StringArray>, row: usize) -> Option<String> {
    match (output, source) {
        (Output::Literal(value), _) => Some(value.clone()),
        (Output::Column(_), Some(array)) if !array.is_null(row) => Some(array.value(row).to_string()),
        _ => None,
    }
}
