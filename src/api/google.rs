//! Implements the `Sheet` trait using the `sheets::Client` to interact with a Google sheet.

use crate::api::token::TokenProvider;
use crate::api::Sheet;
use crate::credentials::ServiceAccountCredentials;
use crate::error::{Error, ErrorType};
use crate::Result;
use sheets::types::{
    BatchClearValuesRequest, BatchUpdateValuesRequest, DateTimeRenderOption, Dimension,
    ValueInputOption, ValueRange, ValueRenderOption,
};
use sheets::ClientError;
use tracing::trace;

/// Implements the `Sheet` trait using the `sheets::Client`. It takes a `TokenProvider`, which it
/// asks for a fresh access token before each request.
pub(crate) struct GoogleSheet {
    spreadsheet_id: String,
    client_email: String,
    token_provider: TokenProvider,
    client: sheets::Client,
}

impl GoogleSheet {
    pub(crate) async fn new(
        spreadsheet_id: String,
        credentials: &ServiceAccountCredentials,
    ) -> Result<Self> {
        let token_provider = TokenProvider::new(credentials).await?;
        let client = create_sheets_client(&token_provider).await?;
        Ok(Self {
            spreadsheet_id,
            client_email: credentials.client_email.clone(),
            token_provider,
            client,
        })
    }

    /// Refreshes the sheets client with a new access token if needed
    async fn refresh_client(&mut self) -> Result<()> {
        self.client = create_sheets_client(&self.token_provider).await?;
        Ok(())
    }

    fn map_error(&self, e: ClientError, what: String) -> Error {
        let error_type = classify(&e);
        let error = Error::new(error_type, e).context(what);
        if error_type == ErrorType::Authentication {
            error.context(format!(
                "Is the sheet shared with the service account '{}'?",
                self.client_email
            ))
        } else {
            error
        }
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn get(&mut self, table: &str) -> Result<Vec<Vec<String>>> {
        trace!("get for {table}");
        self.refresh_client().await?;
        let range = format!("{table}!A:ZZ"); // Get all columns
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
            .map_err(|e| self.map_error(e, format!("Failed to fetch {table} sheet data")))?;
        Ok(response.body.values)
    }

    /// Clears the tab and writes `rows` starting at `A1`.
    async fn put(&mut self, table: &str, rows: &[Vec<String>]) -> Result<()> {
        trace!("put {} rows to {table}", rows.len());
        self.refresh_client().await?;
        let range = format!("{table}!A:ZZ");
        let request = BatchClearValuesRequest {
            ranges: vec![range.clone()],
        };
        self.client
            .spreadsheets()
            .values_batch_clear(&self.spreadsheet_id, &request)
            .await
            .map_err(|e| self.map_error(e, format!("Failed to clear range {range}")))?;

        if rows.is_empty() {
            return Ok(());
        }
        self.write_range(format!("{table}!A1"), rows.to_vec())
            .await
    }

    /// Writes `row` to the first row after the data, without rewriting the rest of the tab.
    async fn append(&mut self, table: &str, row: &[String]) -> Result<()> {
        let existing = self.get(table).await?;
        let next_row = existing.len() + 1;
        self.write_range(format!("{table}!A{next_row}"), vec![row.to_vec()])
            .await
    }

    fn describe(&self) -> String {
        format!("the Google sheet '{}'", self.spreadsheet_id)
    }
}

impl GoogleSheet {
    async fn write_range(&mut self, range: String, values: Vec<Vec<String>>) -> Result<()> {
        self.refresh_client().await?;
        let request = BatchUpdateValuesRequest {
            data: vec![ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: range.clone(),
                values,
            }],
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };
        self.client
            .spreadsheets()
            .values_batch_update(&self.spreadsheet_id, &request)
            .await
            .map_err(|e| self.map_error(e, format!("Failed to write range {range}")))?;
        Ok(())
    }
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &TokenProvider) -> Result<sheets::Client> {
    let access_token = token_provider.token().await?;

    // The sheets crate wants OAuth client settings, but API calls only use the access token.
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token,
        String::new(),
    ))
}

/// Sorts a client error into an `ErrorType`. The Sheets API reports a missing tab as a range that
/// cannot be parsed.
fn classify(e: &ClientError) -> ErrorType {
    match e {
        ClientError::ReqwestError(_) | ClientError::ReqwestMiddleWareError(_) => {
            ErrorType::SourceUnreachable
        }
        ClientError::SerdeJsonError(_) | ClientError::FromUtf8Error(_) => ErrorType::MalformedData,
        ClientError::HttpError { .. } => classify_message(&e.to_string()),
        _ => ErrorType::Internal,
    }
}

fn classify_message(message: &str) -> ErrorType {
    if message.contains("Unable to parse range") || message.contains("404") {
        ErrorType::TableNotFound
    } else if message.contains("401")
        || message.contains("403")
        || message.contains("PERMISSION_DENIED")
        || message.contains("UNAUTHENTICATED")
    {
        ErrorType::Authentication
    } else if message.contains("429") || message.contains("503") {
        ErrorType::SourceUnreachable
    } else {
        ErrorType::Internal
    }
}
