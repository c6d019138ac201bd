//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets (see `EXPENSES_IN_TEST_MODE`).
//!
//! The data lives in a process-wide map keyed by spreadsheet so that a test can hand a `TestSheet`
//! to the app and afterward inspect what the app wrote.

use crate::api::Sheet;
use crate::error::{typed, ErrorType};
use crate::model::ExpenseColumn;
use crate::Result;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tracing::trace;

static STATE: OnceLock<Mutex<HashMap<String, TestSheetState>>> = OnceLock::new();

fn lock() -> MutexGuard<'static, HashMap<String, TestSheetState>> {
    let mutex = STATE.get_or_init(|| Mutex::new(HashMap::new()));
    // A test that panicked while holding the lock must not break the others.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The contents of one in-memory spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSheetState {
    /// Worksheet name to rows.
    pub worksheets: BTreeMap<String, Vec<Vec<String>>>,
    /// Failures to return, one per call, before calls start succeeding again.
    pub failures: VecDeque<ErrorType>,
    /// The number of `get` and `append` calls received, including failed ones.
    pub calls: usize,
}

impl TestSheetState {
    /// A spreadsheet with one empty worksheet.
    #[cfg(test)]
    pub fn empty(worksheet: &str) -> Self {
        let mut state = Self::default();
        state.worksheets.insert(worksheet.to_string(), Vec::new());
        state
    }

    /// A spreadsheet with one worksheet containing the header row and a few expenses.
    pub fn seeded(worksheet: &str) -> Result<Self> {
        let mut state = Self::default();
        state
            .worksheets
            .insert(worksheet.to_string(), load_csv(SEED_DATA)?);
        Ok(state)
    }

    /// The rows of `worksheet`, or nothing if it does not exist.
    #[cfg(test)]
    pub fn rows(&self, worksheet: &str) -> &[Vec<String>] {
        self.worksheets
            .get(worksheet)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// An implementation of the `Sheet` trait that does not use Google sheets.
#[derive(Debug, Clone)]
pub struct TestSheet {
    key: String,
}

impl TestSheet {
    /// Connects to the in-memory spreadsheet stored under `key`, creating an empty one (with no
    /// worksheets) if none exists.
    #[cfg(test)]
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        lock().entry(key.clone()).or_default();
        Self { key }
    }

    /// Like `new` but, if nothing is stored under `key` yet, seeds `worksheet` with sample data.
    pub fn seeded(key: impl Into<String>, worksheet: &str) -> Result<Self> {
        let key = key.into();
        let mut map = lock();
        if !map.contains_key(&key) {
            map.insert(key.clone(), TestSheetState::seeded(worksheet)?);
        }
        Ok(Self { key })
    }

    /// A copy of the current contents.
    #[cfg(test)]
    pub fn get_state(&self) -> TestSheetState {
        lock().get(&self.key).cloned().unwrap_or_default()
    }

    /// Replaces the contents.
    #[cfg(test)]
    pub fn set_state(&self, state: TestSheetState) {
        lock().insert(self.key.clone(), state);
    }

    /// Queues a failure for the next call.
    #[cfg(test)]
    pub fn fail_next(&self, error_type: ErrorType) {
        lock()
            .entry(self.key.clone())
            .or_default()
            .failures
            .push_back(error_type);
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TestSheetState) -> Result<T>) -> Result<T> {
        let mut map = lock();
        let state = map.entry(self.key.clone()).or_default();
        state.calls += 1;
        if let Some(error_type) = state.failures.pop_front() {
            return Err(typed(
                error_type,
                format!("Injected {error_type} failure for '{}'", self.key),
            ));
        }
        f(state)
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self, worksheet: &str) -> Result<Vec<Vec<String>>> {
        trace!("get for {worksheet} in test sheet {}", self.key);
        self.with_state(|state| {
            state
                .worksheets
                .get(worksheet)
                .cloned()
                .ok_or_else(|| missing_worksheet(worksheet))
        })
    }

    async fn append(&mut self, worksheet: &str, rows: &[Vec<String>]) -> Result<()> {
        trace!("append {} rows to {worksheet} in test sheet {}", rows.len(), self.key);
        self.with_state(|state| {
            state
                .worksheets
                .get_mut(worksheet)
                .ok_or_else(|| missing_worksheet(worksheet))?
                .extend_from_slice(rows);
            Ok(())
        })
    }
}

fn missing_worksheet(worksheet: &str) -> crate::Error {
    typed(
        ErrorType::Config,
        format!("Worksheet '{worksheet}' not found"),
    )
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // The header row is part of the sheet data
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    debug_assert_eq!(rows.first(), Some(&ExpenseColumn::headers()));
    Ok(rows)
}

/// Seed expense data.
const SEED_DATA: &str = r##"Date,Description,Category,Amount
02-01-2024,Rent January,Housing,950
05-01-2024,Weekly groceries,Food,84.2
09-01-2024,Bus pass,Transportation,45
14-01-2024,Cinema,Entertainment,12.5
20-01-2024,Pharmacy,Healthcare,18.75
"##;
