//! Truth tables for writing Where blocks
//!
//! Given a header and the values each column can take, [`TruthTable`] lists every
//! combination, first column varying slowest, and renders it in the `a | b` layout a
//! Where block expects.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TruthTable {
    /// A column missing from `values` contributes no values, so the table has no rows.
    pub fn new(header: Vec<String>, values: &HashMap<String, Vec<String>>) -> Self {
        let rows = if header.is_empty() {
            Vec::new()
        } else {
            header.iter().fold(vec![Vec::new()], |rows, column| {
                let column_values = values.get(column).map(Vec::as_slice).unwrap_or_default();
                rows.iter()
                    .flat_map(|row| {
                        column_values.iter().map(move |value| {
                            let mut next = row.clone();
                            next.push(value.clone());
                            next
                        })
                    })
                    .collect()
            })
        };
        Self { header, rows }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Header followed by the rows; empty when there is no header.
    pub fn table(&self) -> Vec<Vec<String>> {
        if self.header.is_empty() {
            return Vec::new();
        }
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table();
        let columns = self.header.len();
        let widths: Vec<usize> = (0..columns)
            .map(|index| {
                table
                    .iter()
                    .filter_map(|row| row.get(index))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let lines: Vec<String> = table
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(index, cell)| {
                        if index + 1 == row.len() {
                            cell.clone()
                        } else {
                            format!("{:<width$}", cell, width = widths[index])
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect();
        f.write_str(&lines.join("\n"))
    }
}
