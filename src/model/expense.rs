use crate::model::{Amount, Category};
use crate::Result;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The textual form of dates, both as typed by the user and as stored in the sheet.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// A single expense, i.e. one row of the expenses worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    date: NaiveDate,
    description: String,
    category: Category,
    amount: Amount,
}

impl Expense {
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        category: Category,
        amount: Amount,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            category,
            amount,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// The date as it is written to the sheet, e.g. `15-03-2024`.
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// The values in worksheet column order: date, description, category, amount.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date_string(),
            self.description.clone(),
            self.category.to_string(),
            self.amount.to_string(),
        ]
    }

    /// Parses a worksheet row. Unlike the interactive prompts, no date range is enforced here since
    /// rows may have been typed into the sheet by hand.
    pub fn from_row<S>(row: &[S]) -> Result<Self>
    where
        S: AsRef<str>,
    {
        if row.len() < ExpenseColumn::COUNT {
            bail!(
                "Expected {} columns but the row has {}",
                ExpenseColumn::COUNT,
                row.len()
            );
        }
        let cell = |col: ExpenseColumn| row[col.index()].as_ref().trim();

        let date = NaiveDate::parse_from_str(cell(ExpenseColumn::Date), DATE_FORMAT)
            .with_context(|| format!("Invalid date '{}'", cell(ExpenseColumn::Date)))?;
        let category = Category::from_name(cell(ExpenseColumn::Category))
            .with_context(|| format!("Unknown category '{}'", cell(ExpenseColumn::Category)))?;
        let amount = Amount::from_str(cell(ExpenseColumn::Amount))
            .with_context(|| format!("Invalid amount '{}'", cell(ExpenseColumn::Amount)))?;

        Ok(Self {
            date,
            description: row[ExpenseColumn::Description.index()].as_ref().to_string(),
            category,
            amount,
        })
    }
}

/// The columns of the expenses worksheet, in order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseColumn {
    Date,
    Description,
    Category,
    Amount,
}

serde_plain::derive_display_from_serialize!(ExpenseColumn);
serde_plain::derive_fromstr_from_deserialize!(ExpenseColumn);

impl ExpenseColumn {
    pub const COUNT: usize = 4;

    pub const ALL: [ExpenseColumn; Self::COUNT] = [
        ExpenseColumn::Date,
        ExpenseColumn::Description,
        ExpenseColumn::Category,
        ExpenseColumn::Amount,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The header text shown in the sheet and in tables.
    pub fn header(self) -> &'static str {
        match self {
            ExpenseColumn::Date => DATE_STR,
            ExpenseColumn::Description => DESCRIPTION_STR,
            ExpenseColumn::Category => CATEGORY_STR,
            ExpenseColumn::Amount => AMOUNT_STR,
        }
    }

    /// The header row: `Date, Description, Category, Amount`.
    pub fn headers() -> Vec<String> {
        Self::ALL.iter().map(|c| c.header().to_string()).collect()
    }
}

const DATE_STR: &str = "Date";
const DESCRIPTION_STR: &str = "Description";
const CATEGORY_STR: &str = "Category";
const AMOUNT_STR: &str = "Amount";

/// The rows downloaded from the expenses worksheet.
///
/// The store returns its header row along with the data. If the first row looks like the header
/// it is kept separately so that it is not displayed or summed as an expense.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Expenses {
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
}

impl Expenses {
    /// Think of `sheet_data` as something that looks like `Vec<Vec<String>>`, i.e. rows.
    pub fn parse<S, R, I>(sheet_data: I) -> Self
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
        I: IntoIterator<Item = R>,
    {
        let mut rows: Vec<Vec<String>> = sheet_data
            .into_iter()
            .map(|row| row.into_iter().map(|s| s.into()).collect())
            .collect();
        let header = if rows.first().map(|r| is_header(r)).unwrap_or(false) {
            Some(rows.remove(0))
        } else {
            None
        };
        Self { header, rows }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// The data rows, in storage order, without the header.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parses every data row into an `Expense`, paired with its zero-based data row index.
    pub fn parsed(&self) -> impl Iterator<Item = (usize, Result<Expense>)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(ix, row)| (ix, Expense::from_row(row)))
    }
}

fn is_header(row: &[String]) -> bool {
    row.len() >= ExpenseColumn::COUNT
        && ExpenseColumn::ALL
            .iter()
            .all(|c| row[c.index()].trim().eq_ignore_ascii_case(c.header()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groceries() -> Expense {
        Expense::new(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            "Groceries",
            Category::Food,
            Amount::from_str("54.30").unwrap(),
        )
    }

    #[test]
    fn test_to_row_column_order() {
        assert_eq!(
            groceries().to_row(),
            vec!["15-03-2024", "Groceries", "Food", "54.3"]
        );
    }

    #[test]
    fn test_from_row() {
        let expense = Expense::from_row(&["15-03-2024", "Groceries", "food", " 54.3 "]).unwrap();
        assert_eq!(expense, groceries());
    }

    #[test]
    fn test_from_row_errors() {
        assert!(Expense::from_row(&["15-03-2024", "Groceries", "Food"]).is_err());
        assert!(Expense::from_row(&["2024-03-15", "Groceries", "Food", "1"]).is_err());
        assert!(Expense::from_row(&["15-03-2024", "Groceries", "Pets", "1"]).is_err());
        assert!(Expense::from_row(&["15-03-2024", "Groceries", "Food", "one"]).is_err());
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            ExpenseColumn::headers(),
            vec!["Date", "Description", "Category", "Amount"]
        );
        assert_eq!(ExpenseColumn::Amount.index(), 3);
    }

    #[test]
    fn test_parse_splits_header() {
        let expenses = Expenses::parse(vec![
            vec!["Date", "Description", "Category", "Amount"],
            vec!["15-03-2024", "Groceries", "Food", "54.3"],
        ]);
        assert_eq!(
            expenses.header().unwrap(),
            &["Date", "Description", "Category", "Amount"]
        );
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses.rows()[0][1], "Groceries");
    }

    #[test]
    fn test_parse_without_header_keeps_first_row() {
        let expenses = Expenses::parse(vec![vec!["15-03-2024", "Groceries", "Food", "54.3"]]);
        assert!(expenses.header().is_none());
        assert_eq!(expenses.len(), 1);
    }

    #[test]
    fn test_parse_empty() {
        let expenses = Expenses::parse(Vec::<Vec<String>>::new());
        assert!(expenses.is_empty());
        assert!(expenses.header().is_none());
    }

    #[test]
    fn test_parsed_reports_bad_rows() {
        let expenses = Expenses::parse(vec![
            vec!["date", "description", "category", "amount"],
            vec!["15-03-2024", "Groceries", "Food", "54.3"],
            vec!["16-03-2024", "Cinema", "Fun", "12"],
        ]);
        let results: Vec<(usize, bool)> = expenses.parsed().map(|(ix, r)| (ix, r.is_ok())).collect();
        assert_eq!(results, vec![(0, true), (1, false)]);
    }
}
