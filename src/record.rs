//! Collects the four fields of a new expense and asks the user to confirm them.

use crate::console::Console;
use crate::model::Expense;
use crate::validate::{prompt_amount, prompt_category, prompt_date, prompt_description};
use crate::Result;
use chrono::NaiveDate;
use std::io::{BufRead, Write};

/// What the user wants done with a collected expense.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Decision {
    Confirm,
    Reenter,
}

/// Asks for date, description, category and amount, in that order.
pub fn collect_expense<R, W>(console: &mut Console<R, W>, today: NaiveDate) -> Result<Expense>
where
    R: BufRead,
    W: Write,
{
    let date = prompt_date(console, today)?;
    console.newline()?;
    let description = prompt_description(console)?;
    console.newline()?;
    let category = prompt_category(console)?;
    console.newline()?;
    let amount = prompt_amount(console)?;
    console.newline()?;
    Ok(Expense::new(date, description, category, amount))
}

/// Shows `expense` and waits for `c` or `r`, in either case.
pub fn confirm<R, W>(console: &mut Console<R, W>, expense: &Expense) -> Result<Decision>
where
    R: BufRead,
    W: Write,
{
    console.transition("Summarizing expenses...")?;
    console.newline()?;
    console.line("Your expense details:")?;
    console.newline()?;
    console.line(&format!("     Expense Date: {}", expense.date_string()))?;
    console.line(&format!("     Expense Description: {}", expense.description()))?;
    console.line(&format!("     Expense Category: {}", expense.category()))?;
    console.line(&format!("     Expense Amount: {}", expense.amount()))?;
    console.newline()?;
    console.say("Confirm expense details (c) or re-enter (r)?")?;
    loop {
        match console.read_line()?.trim().to_lowercase().as_str() {
            "c" => return Ok(Decision::Confirm),
            "r" => return Ok(Decision::Reenter),
            _ => console.error(
                "Invalid input: Please enter (c) to confirm or (r) to re-enter details.",
            )?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Pacing;
    use crate::model::Category;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            Pacing::none(),
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[test]
    fn test_collect_expense() {
        let mut c = console("15-03-2024\nGroceries\n2\n54.30\n");
        let expense = collect_expense(&mut c, today()).unwrap();
        assert_eq!(
            expense.to_row(),
            vec!["15-03-2024", "Groceries", "Food", "54.3"]
        );
    }

    #[test]
    fn test_confirm_is_case_insensitive() {
        let mut c = console("C\n");
        let expense = collect_expense(&mut console("01-02-2024\nRent\n1\n900\n"), today()).unwrap();
        assert_eq!(confirm(&mut c, &expense).unwrap(), Decision::Confirm);
        let out = String::from_utf8_lossy(c.output()).to_string();
        assert!(out.contains("     Expense Category: Housing"));
        assert!(out.contains("     Expense Amount: 900"));
    }

    #[test]
    fn test_confirm_reprompts_without_restarting() {
        let mut c = console("x\nyes\nr\n");
        let expense = Expense::new(
            today(),
            "Taxi",
            Category::Transportation,
            "20".parse().unwrap(),
        );
        assert_eq!(confirm(&mut c, &expense).unwrap(), Decision::Reenter);
        let out = String::from_utf8_lossy(c.output()).to_string();
        assert_eq!(
            out.matches("Please enter (c) to confirm or (r) to re-enter details.")
                .count(),
            2
        );
        assert_eq!(out.matches("Your expense details:").count(), 1);
    }
}
