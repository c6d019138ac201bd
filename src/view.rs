//! Renders stored expenses as plain text tables.

use crate::model::{Category, ExpenseColumn, Expenses};
use std::collections::BTreeMap;
use tracing::warn;

/// Shown instead of a table when the store has no expense rows.
pub const NO_EXPENSES: &str = "No expenses recorded yet.";

/// Describes how a column should align its contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Alignment {
    Left,
    Right,
}

struct Column {
    header: &'static str,
    alignment: Alignment,
}

struct Table<'a> {
    columns: Vec<Column>,
    rows: &'a [Vec<String>],
}

impl Table<'_> {
    /// The widest of the header and every cell, per column.
    fn compute_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .fold(column.header.chars().count(), usize::max)
            })
            .collect()
    }

    fn render_row<S: AsRef<str>>(&self, row: &[S], widths: &[usize]) -> String {
        let cells: Vec<String> = self
            .columns
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(idx, (column, &width))| {
                let text = row.get(idx).map(|s| s.as_ref()).unwrap_or("");
                match column.alignment {
                    Alignment::Left => format!("{text:<width$}"),
                    Alignment::Right => format!("{text:>width$}"),
                }
            })
            .collect();
        cells.join("  ").trim_end().to_string()
    }

    fn render(&self) -> String {
        let widths = self.compute_widths();
        let headers: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        let mut lines = vec![self.render_row(&headers, &widths)];
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        lines.push(rule.join("  "));
        for row in self.rows {
            lines.push(self.render_row(row, &widths));
        }
        lines.join("\n")
    }
}

/// All expenses in the order they were stored, under a `Date Description Category Amount` header.
pub fn render_in_order(expenses: &Expenses) -> String {
    if expenses.is_empty() {
        return NO_EXPENSES.to_string();
    }
    let columns = ExpenseColumn::ALL
        .iter()
        .map(|c| Column {
            header: c.header(),
            alignment: match c {
                ExpenseColumn::Amount => Alignment::Right,
                _ => Alignment::Left,
            },
        })
        .collect();
    Table {
        columns,
        rows: expenses.rows(),
    }
    .render()
}

/// The sum of the amounts of one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
}

/// Sums amounts per category, largest total first. Categories without expenses are left out.
/// Rows that cannot be read as an expense are skipped.
pub fn category_totals(expenses: &Expenses) -> Vec<CategoryTotal> {
    let mut sums: BTreeMap<Category, f64> = BTreeMap::new();
    for (ix, parsed) in expenses.parsed() {
        match parsed {
            Ok(expense) => *sums.entry(expense.category()).or_default() += expense.amount().value(),
            Err(e) => warn!("Skipping expense row {}: {e:#}", ix + 1),
        }
    }
    let mut totals: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();
    // Stable, so equal totals stay in category order.
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals
}

/// The number of stored rows that cannot be read as an expense.
pub fn unreadable_rows(expenses: &Expenses) -> usize {
    expenses.parsed().filter(|(_, r)| r.is_err()).count()
}

/// A `Category Total` table followed by the grand total.
pub fn render_category_totals(totals: &[CategoryTotal]) -> String {
    if totals.is_empty() {
        return NO_EXPENSES.to_string();
    }
    let rows: Vec<Vec<String>> = totals
        .iter()
        .map(|t| vec![t.category.to_string(), format_amount(t.total)])
        .collect();
    let table = Table {
        columns: vec![
            Column {
                header: "Category",
                alignment: Alignment::Left,
            },
            Column {
                header: "Total",
                alignment: Alignment::Right,
            },
        ],
        rows: &rows,
    };
    let grand_total: f64 = totals.iter().map(|t| t.total).sum();
    format!("{}\n\nTotal: {}", table.render(), format_amount(grand_total))
}

fn format_amount(value: f64) -> String {
    format_num::format_num!(",.2", value)
}
