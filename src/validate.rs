//! Parsing and validation of the four expense fields.
//!
//! The `parse_*` functions are pure. The `prompt_*` functions ask for a field and keep asking until
//! the input is valid; they only give up when the console's input is closed.

use crate::console::Console;
use crate::model::{Amount, Category, DATE_FORMAT};
use crate::Result;
use chrono::NaiveDate;
use std::fmt::{self, Display, Formatter};
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::debug;

/// Why a typed value was rejected. The `Display` text is what the user sees.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputError {
    DateFormat,
    DateRange,
    EmptyDescription,
    CategoryOption,
    Amount,
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            InputError::DateFormat => "Please enter date as DD-MM-YYYY.",
            InputError::DateRange => "Please enter a date between 01-01-2024 and today.",
            InputError::EmptyDescription => "Description cannot be empty.",
            InputError::CategoryOption => "Please enter one of the options (1-6).",
            InputError::Amount => "Please enter a number.",
        };
        write!(f, "Invalid input: {message}")
    }
}

impl std::error::Error for InputError {}

/// The earliest date an expense may have.
pub fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Parses a `DD-MM-YYYY` date that falls between 01-01-2024 and `today`, both inclusive.
pub fn parse_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, InputError> {
    let date =
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| InputError::DateFormat)?;
    if date < earliest_date() || date > today {
        return Err(InputError::DateRange);
    }
    Ok(date)
}

/// Any non-empty text is kept exactly as typed, surrounding whitespace included.
pub fn parse_description(raw: &str) -> Result<String, InputError> {
    if raw.is_empty() {
        return Err(InputError::EmptyDescription);
    }
    Ok(raw.to_string())
}

/// Parses a category menu number, 1 through 6.
pub fn parse_category(raw: &str) -> Result<Category, InputError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(Category::from_menu_number)
        .ok_or(InputError::CategoryOption)
}

/// Any finite number is accepted, including zero and negative values.
pub fn parse_amount(raw: &str) -> Result<Amount, InputError> {
    Amount::from_str(raw).map_err(|_| InputError::Amount)
}

pub fn prompt_date<R, W>(console: &mut Console<R, W>, today: NaiveDate) -> Result<NaiveDate>
where
    R: BufRead,
    W: Write,
{
    console.say("Please enter date as DD-MM-YYYY.")?;
    prompt(console, |raw| parse_date(raw, today))
}

pub fn prompt_description<R, W>(console: &mut Console<R, W>) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    console.say("Please enter a description.")?;
    prompt(console, parse_description)
}

pub fn prompt_category<R, W>(console: &mut Console<R, W>) -> Result<Category>
where
    R: BufRead,
    W: Write,
{
    console.say("Please select a category (1-6).")?;
    let names: Vec<String> = Category::ALL.iter().map(|c| c.to_string()).collect();
    loop {
        console.options(&names)?;
        match parse_category(&console.read_line()?) {
            Ok(category) => return Ok(category),
            Err(e) => reject(console, e)?,
        }
    }
}

pub fn prompt_amount<R, W>(console: &mut Console<R, W>) -> Result<Amount>
where
    R: BufRead,
    W: Write,
{
    console.say("Please enter an amount:")?;
    prompt(console, parse_amount)
}

fn prompt<R, W, T, F>(console: &mut Console<R, W>, parse: F) -> Result<T>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> Result<T, InputError>,
{
    loop {
        match parse(&console.read_line()?) {
            Ok(value) => return Ok(value),
            Err(e) => reject(console, e)?,
        }
    }
}

fn reject<R, W>(console: &mut Console<R, W>, e: InputError) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    debug!("Rejected input: {e:?}");
    console.error(&e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Pacing;
    use crate::error::{error_type, ErrorType};
    use std::io::Cursor;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            Pacing::none(),
        )
    }

    fn printed(console: &Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8_lossy(console.output()).to_string()
    }

    #[test]
    fn test_parse_date_bounds() {
        assert_eq!(parse_date("01-01-2024", today()), Ok(date(2024, 1, 1)));
        assert_eq!(parse_date("30-06-2025", today()), Ok(date(2025, 6, 30)));
        assert_eq!(parse_date("31-12-2023", today()), Err(InputError::DateRange));
        assert_eq!(parse_date("01-07-2025", today()), Err(InputError::DateRange));
    }

    #[test]
    fn test_parse_date_format() {
        assert_eq!(parse_date("2024-03-15", today()), Err(InputError::DateFormat));
        assert_eq!(parse_date("15/03/2024", today()), Err(InputError::DateFormat));
        assert_eq!(parse_date("31-02-2024", today()), Err(InputError::DateFormat));
        assert_eq!(parse_date("", today()), Err(InputError::DateFormat));
        assert_eq!(parse_date(" 15-03-2024 ", today()), Ok(date(2024, 3, 15)));
    }

    #[test]
    fn test_parse_description() {
        assert_eq!(parse_description("Groceries"), Ok("Groceries".to_string()));
        assert_eq!(parse_description("  Groceries "), Ok("  Groceries ".to_string()));
        assert_eq!(parse_description("   "), Ok("   ".to_string()));
        assert_eq!(parse_description(""), Err(InputError::EmptyDescription));
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("1"), Ok(Category::Housing));
        assert_eq!(parse_category("2"), Ok(Category::Food));
        assert_eq!(parse_category(" 6 "), Ok(Category::Misc));
        for bad in ["0", "7", "-1", "1.5", "Food", ""] {
            assert_eq!(parse_category(bad), Err(InputError::CategoryOption), "{bad}");
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("54.30").unwrap().value(), 54.3);
        assert_eq!(parse_amount("-3").unwrap().value(), -3.0);
        assert_eq!(parse_amount("0").unwrap().value(), 0.0);
        for bad in ["", "abc", "nan", "inf", "12,50"] {
            assert_eq!(parse_amount(bad), Err(InputError::Amount), "{bad}");
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            InputError::DateRange.to_string(),
            "Invalid input: Please enter a date between 01-01-2024 and today."
        );
        assert_eq!(
            InputError::CategoryOption.to_string(),
            "Invalid input: Please enter one of the options (1-6)."
        );
    }

    #[test]
    fn test_prompt_date_loops_until_valid() {
        let mut c = console("01-01-2023\nyesterday\n15-03-2024\n");
        assert_eq!(prompt_date(&mut c, today()).unwrap(), date(2024, 3, 15));
        let out = printed(&c);
        assert!(out.contains("Invalid input: Please enter a date between 01-01-2024 and today."));
        assert!(out.contains("Invalid input: Please enter date as DD-MM-YYYY."));
    }

    #[test]
    fn test_prompt_category_redisplays_options() {
        let mut c = console("7\n3\n");
        assert_eq!(prompt_category(&mut c).unwrap(), Category::Transportation);
        let out = printed(&c);
        assert_eq!(out.matches("    6. Misc").count(), 2);
        assert!(out.contains("Invalid input: Please enter one of the options (1-6)."));
    }

    #[test]
    fn test_prompt_gives_up_when_input_closes() {
        let mut c = console("\n");
        let e = prompt_description(&mut c).err().unwrap();
        assert_eq!(error_type(&e), Some(ErrorType::InputClosed));
        assert!(printed(&c).contains("Invalid input: Description cannot be empty."));
    }

    #[test]
    fn test_prompt_amount() {
        let mut c = console("twelve\n12.5\n");
        assert_eq!(prompt_amount(&mut c).unwrap().value(), 12.5);
    }
}
