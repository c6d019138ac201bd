//! The boundary between the interactive program and the spreadsheet.
//!
//! All reads and writes of expense rows go through `Gateway`, which retries transient failures and
//! hands fatal ones straight back to the caller.

use crate::api::Sheet;
use crate::error::{error_type, ErrorType};
use crate::model::Expense;
use crate::{Error, Result};
use anyhow::Context;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often and how patiently to retry a transient failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total number of tries, including the first one.
    pub max_attempts: u32,
    /// Wait before the second try; each subsequent wait is doubled.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Retries without waiting.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// The wait after the failed try number `attempt` (1-based).
    fn delay(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

pub struct Gateway {
    sheet: Box<dyn Sheet + Send>,
    worksheet: String,
    retry: RetryPolicy,
}

impl Gateway {
    pub fn new(sheet: Box<dyn Sheet + Send>, worksheet: impl Into<String>) -> Self {
        Self {
            sheet,
            worksheet: worksheet.into(),
            retry: RetryPolicy::default(),
        }
    }

    #[cfg(test)]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    /// Appends exactly one row for `expense` after the last row of the worksheet.
    pub async fn append(&mut self, expense: &Expense) -> Result<()> {
        let row = expense.to_row();
        info!("Appending {row:?} to '{}'", self.worksheet);
        self.append_rows(&[row], "append the expense")
            .await
            .with_context(|| format!("Unable to add the expense to '{}'", self.worksheet))
    }

    /// All rows of the worksheet, header included, in storage order.
    pub async fn read_all(&mut self) -> Result<Vec<Vec<String>>> {
        let mut attempt = 1;
        let rows = loop {
            match self.sheet.get(&self.worksheet).await {
                Ok(rows) => break rows,
                Err(e) => attempt = self.retry.backoff(attempt, "read the expenses", e).await?,
            }
        };
        debug!("Read {} rows from '{}'", rows.len(), self.worksheet);
        Ok(rows)
    }

    async fn append_rows(&mut self, rows: &[Vec<String>], what: &str) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.sheet.append(&self.worksheet, rows).await {
                Ok(()) => return Ok(()),
                Err(e) => attempt = self.retry.backoff(attempt, what, e).await?,
            }
        }
    }
}

impl RetryPolicy {
    /// Decides what to do after try number `attempt` failed with `e`. Returns `e` when it is not
    /// transient or no tries are left, otherwise waits and returns the next attempt number.
    async fn backoff(&self, attempt: u32, what: &str, e: Error) -> Result<u32> {
        let transient = error_type(&e).map(ErrorType::is_transient).unwrap_or(false);
        if !transient || attempt >= self.max_attempts {
            return Err(e);
        }
        let delay = self.delay(attempt);
        warn!(
            "Attempt {attempt} of {} to {what} failed, retrying in {delay:?}: {e:#}",
            self.max_attempts
        );
        tokio::time::sleep(delay).await;
        Ok(attempt + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TestSheet, TestSheetState};
    use crate::model::{Amount, Category, ExpenseColumn};
    use chrono::NaiveDate;
    use std::str::FromStr;

    const WS: &str = "expenses";

    fn sheet(state: TestSheetState) -> TestSheet {
        let sheet = TestSheet::new(uuid::Uuid::new_v4().to_string());
        sheet.set_state(state);
        sheet
    }

    fn gateway(sheet: &TestSheet) -> Gateway {
        Gateway::new(Box::new(sheet.clone()), WS).with_retry(RetryPolicy::immediate())
    }

    fn groceries() -> Expense {
        Expense::new(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            "Groceries",
            Category::Food,
            Amount::from_str("54.30").unwrap(),
        )
    }

    #[test]
    fn test_retry_delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_millis(1000));
        assert_eq!(policy.delay(3), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_append_to_empty_sheet_writes_one_row() {
        let sheet = sheet(TestSheetState::empty(WS));
        let mut gateway = gateway(&sheet);
        gateway.append(&groceries()).await.unwrap();
        let rows = gateway.read_all().await.unwrap();
        assert_eq!(
            rows,
            vec![vec![
                "15-03-2024".to_string(),
                "Groceries".to_string(),
                "Food".to_string(),
                "54.3".to_string()
            ]]
        );
        assert_eq!(sheet.get_state().calls, 2);
    }

    #[tokio::test]
    async fn test_append_goes_after_existing_rows() {
        let sheet = sheet(TestSheetState::seeded(WS).unwrap());
        let before = sheet.get_state().rows(WS).to_vec();
        gateway(&sheet).append(&groceries()).await.unwrap();
        let after = sheet.get_state().rows(WS).to_vec();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after[0], ExpenseColumn::headers());
        assert_eq!(&after[..before.len()], before.as_slice());
        assert_eq!(after[before.len()], groceries().to_row());
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_without_duplicates() {
        let sheet = sheet(TestSheetState::empty(WS));
        sheet.fail_next(ErrorType::Transient);
        sheet.fail_next(ErrorType::Transient);
        gateway(&sheet).append(&groceries()).await.unwrap();
        let state = sheet.get_state();
        assert_eq!(state.rows(WS).len(), 1);
        assert_eq!(state.calls, 3);
    }

    #[tokio::test]
    async fn test_transient_failure_gives_up() {
        let sheet = sheet(TestSheetState::empty(WS));
        for _ in 0..3 {
            sheet.fail_next(ErrorType::Transient);
        }
        let e = gateway(&sheet).append(&groceries()).await.err().unwrap();
        assert_eq!(error_type(&e), Some(ErrorType::Transient));
        let state = sheet.get_state();
        assert!(state.rows(WS).is_empty());
        assert_eq!(state.calls, 3);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let sheet = sheet(TestSheetState::empty(WS));
        sheet.fail_next(ErrorType::Auth);
        let e = gateway(&sheet).read_all().await.err().unwrap();
        assert_eq!(error_type(&e), Some(ErrorType::Auth));
        assert_eq!(sheet.get_state().calls, 1);
    }
}
