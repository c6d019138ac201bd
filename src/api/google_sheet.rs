//! Implements the `Sheet` trait using the `sheets:Client` to interact with a Google sheet.

use crate::api::{Sheet, TokenProvider};
use crate::error::{typed, ErrorType, IntoResult, TypedError};
use crate::{Config, Result};
use anyhow::Context;
use serde::Deserialize;
use sheets::types::{
    DateTimeRenderOption, Dimension, InsertDataOption, ValueInputOption, ValueRange,
    ValueRenderOption,
};
use sheets::ClientError;
use tracing::{debug, trace, warn};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Implements the `Sheet` trait using the `sheets:Client` to interact with a Google sheet. It takes
/// a `TokenProvider`, from which it gets a fresh token before each request.
pub(super) struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    client: sheets::Client,
}

impl GoogleSheet {
    /// Connects to the spreadsheet named in `config`. When the config has no URL, the spreadsheet
    /// is looked up by title among the files the service account can see.
    pub(super) async fn new(config: &Config, mut token_provider: TokenProvider) -> Result<Self> {
        let spreadsheet_id = match config.spreadsheet_id() {
            Some(id) => id.to_string(),
            None => find_spreadsheet(&mut token_provider, config.spreadsheet_name()).await?,
        };
        debug!("Using spreadsheet {spreadsheet_id}");
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            spreadsheet_id,
            token_provider,
            client,
        })
    }

    /// Refreshes the sheets client with a new access token if needed
    async fn refresh_client(&mut self) -> Result<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn get(&mut self, worksheet: &str) -> Result<Vec<Vec<String>>> {
        trace!("get for {worksheet}");
        self.refresh_client().await?;
        let range = a1_range(worksheet);
        let response = self
            .client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                &range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch the '{worksheet}' worksheet"))?;
        Ok(response.body.values)
    }

    async fn append(&mut self, worksheet: &str, rows: &[Vec<String>]) -> Result<()> {
        trace!("append {} rows to {worksheet}", rows.len());
        self.refresh_client().await?;
        let range = a1_range(worksheet);
        let body = ValueRange {
            major_dimension: Some(Dimension::Rows),
            range: range.clone(),
            values: rows.to_vec(),
        };
        // RAW so that the sheet does not reinterpret dates or amounts typed by the user.
        self.client
            .spreadsheets()
            .values_append(
                &self.spreadsheet_id,
                &range,
                false,
                InsertDataOption::InsertRows,
                DateTimeRenderOption::FormattedString,
                ValueRenderOption::FormattedValue,
                ValueInputOption::Raw,
                &body,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to append to the '{worksheet}' worksheet"))?;
        Ok(())
    }
}

/// Every column of `worksheet` in A1 notation. The name is always quoted since worksheet names may
/// contain spaces; embedded quotes are doubled.
fn a1_range(worksheet: &str) -> String {
    format!("'{}'!A:ZZ", worksheet.replace('\'', "''"))
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Result<sheets::Client> {
    let access_token = token_provider.token().await?;

    // The sheets crate wants client_id, client_secret, redirect_uri and a refresh token, but only
    // the access token is used for API calls.
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token,
        String::new(),
    ))
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

/// Looks up a spreadsheet by its title using the Google Drive API.
async fn find_spreadsheet(token_provider: &mut TokenProvider, title: &str) -> Result<String> {
    debug!("Looking up spreadsheet '{title}' on Google Drive");
    let token = token_provider.token().await?;
    let query = format!(
        "name = '{}' and mimeType = '{SPREADSHEET_MIME_TYPE}' and trashed = false",
        title.replace('\\', "\\\\").replace('\'', "\\'")
    );

    let response = reqwest::Client::new()
        .get(DRIVE_FILES_URL)
        .bearer_auth(token)
        .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
        .send()
        .await
        .context("Failed to send the file search request to the Google Drive API")
        .pub_result(ErrorType::Transient)?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        return Err(typed(
            classify_status(status.as_u16()),
            format!("Google Drive file search failed with status {status}: {body}"),
        ));
    }

    let list: FileList = response
        .json()
        .await
        .context("Failed to parse the Google Drive API response")
        .pub_result(ErrorType::Service)?;

    choose_file(list.files, title, token_provider.client_email())
}

fn choose_file(files: Vec<DriveFile>, title: &str, client_email: &str) -> Result<String> {
    let mut files = files.into_iter();
    let first = files.next().ok_or_else(|| {
        typed(
            ErrorType::Config,
            format!(
                "No spreadsheet named '{title}' was found. Create it and share it with \
                {client_email}, or put its URL in the config file"
            ),
        )
    })?;
    let others = files.count();
    if others > 0 {
        warn!(
            "Found {} spreadsheets named '{title}', using {} ({})",
            others + 1,
            first.id,
            first.name
        );
    }
    Ok(first.id)
}

/// Decides whether a failed HTTP call is worth retrying.
fn classify_status(status: u16) -> ErrorType {
    match status {
        401 | 403 => ErrorType::Auth,
        400 | 404 => ErrorType::Config,
        408 | 429 | 500..=599 => ErrorType::Transient,
        _ => ErrorType::Service,
    }
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let (error_type, error_name) = match &e {
        ClientError::EmptyRefreshToken => (ErrorType::Auth, "EmptyRefreshToken".to_string()),
        ClientError::FromUtf8Error(inner) => (ErrorType::Service, format!("FromUtf8Error {inner}")),
        ClientError::UrlParserError(inner) => {
            (ErrorType::Config, format!("UrlParserError {inner}"))
        }
        ClientError::SerdeJsonError(inner) => {
            (ErrorType::Service, format!("SerdeJsonError {inner}"))
        }
        ClientError::ReqwestError(inner) => (ErrorType::Transient, format!("ReqwestError {inner}")),
        ClientError::InvalidHeaderValue(inner) => {
            (ErrorType::Auth, format!("InvalidHeaderValue {inner}"))
        }
        ClientError::ReqwestMiddleWareError(inner) => (
            ErrorType::Transient,
            format!("ReqwestMiddleWareError {inner}"),
        ),
        ClientError::HttpError { status, error, .. } => (
            classify_status(status.as_u16()),
            format!("HttpError {status}: {error}"),
        ),
        ClientError::Other(_) => (ErrorType::Service, "Other".to_string()),
    };
    TypedError::new(error_type, anyhow::Error::new(e).context(error_name)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(401), ErrorType::Auth);
        assert_eq!(classify_status(403), ErrorType::Auth);
        assert_eq!(classify_status(404), ErrorType::Config);
        assert_eq!(classify_status(400), ErrorType::Config);
        assert_eq!(classify_status(429), ErrorType::Transient);
        assert_eq!(classify_status(503), ErrorType::Transient);
        assert_eq!(classify_status(302), ErrorType::Service);
    }

    #[test]
    fn test_a1_range_quotes_names() {
        assert_eq!(a1_range("expenses"), "'expenses'!A:ZZ");
        assert_eq!(a1_range("Bob's Sheet"), "'Bob''s Sheet'!A:ZZ");
    }

    #[test]
    fn test_choose_file_none_is_config_error() {
        let e = choose_file(Vec::new(), "expense_tracker", "a@b.iam.gserviceaccount.com")
            .err()
            .unwrap();
        assert_eq!(error_type(&e), Some(ErrorType::Config));
        assert!(format!("{e}").contains("a@b.iam.gserviceaccount.com"));
    }

    #[test]
    fn test_choose_file_takes_first() {
        let files = vec![
            DriveFile {
                id: "first".to_string(),
                name: "expense_tracker".to_string(),
            },
            DriveFile {
                id: "second".to_string(),
                name: "expense_tracker".to_string(),
            },
        ];
        assert_eq!(choose_file(files, "expense_tracker", "x").unwrap(), "first");
    }

    #[test]
    fn test_file_list_parses_drive_response() {
        let json = r#"{"files": [{"id": "1AbC", "name": "expense_tracker"}]}"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 1);
        assert_eq!(list.files[0].id, "1AbC");
        let empty: FileList = serde_json::from_str("{}").unwrap();
        assert!(empty.files.is_empty());
    }
}
