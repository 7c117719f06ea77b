//! Implements the `Sheet` trait for a Google sheet shared as "Anyone with the link". Reads go
//! through the CSV export, which needs no credentials. Writes are not possible.

use crate::api::local::parse_csv;
use crate::api::Sheet;
use crate::error::{Error, ErrorType, IntoResult};
use crate::Result;
use reqwest::StatusCode;
use tracing::trace;
use url::Url;

const DOCS_URL: &str = "https://docs.google.com/spreadsheets/d";

pub(crate) struct PublicSheet {
    spreadsheet_id: String,
    client: reqwest::Client,
}

impl PublicSheet {
    pub(crate) fn new(spreadsheet_id: String) -> Self {
        Self {
            spreadsheet_id,
            client: reqwest::Client::new(),
        }
    }

    fn export_url(&self, table: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{DOCS_URL}/{}/gviz/tq", self.spreadsheet_id),
            &[("tqx", "out:csv"), ("sheet", table)],
        )
        .pub_result(ErrorType::Config)
    }

    fn read_only(&self, table: &str) -> Error {
        Error::msg(
            ErrorType::Authentication,
            format!(
                "Cannot write to the {table} tab: a public sheet is read-only. Configure a \
                'google' source with service account credentials to make changes"
            ),
        )
    }
}

#[async_trait::async_trait]
impl Sheet for PublicSheet {
    async fn get(&mut self, table: &str) -> Result<Vec<Vec<String>>> {
        let url = self.export_url(table)?;
        trace!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .pub_result(ErrorType::SourceUnreachable)
            .map_err(|e| e.context(format!("Unable to download the {table} tab")))?;

        let status = response.status();
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));

        if let Some(error_type) = classify(status, is_html) {
            return Err(Error::msg(
                error_type,
                format!("Downloading the {table} tab failed with status {status}"),
            ));
        }

        let body = response
            .text()
            .await
            .pub_result(ErrorType::SourceUnreachable)?;
        parse_csv(&body)
            .pub_result(ErrorType::MalformedData)
            .map_err(|e| e.context(format!("The {table} tab did not download as CSV")))
    }

    async fn put(&mut self, table: &str, _rows: &[Vec<String>]) -> Result<()> {
        Err(self.read_only(table))
    }

    async fn append(&mut self, table: &str, _row: &[String]) -> Result<()> {
        Err(self.read_only(table))
    }

    fn describe(&self) -> String {
        format!("the public Google sheet '{}'", self.spreadsheet_id)
    }
}

/// Decides whether a response is an error. A sheet that is not shared publicly answers with a
/// sign-in page instead of CSV.
fn classify(status: StatusCode, is_html: bool) -> Option<ErrorType> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Some(ErrorType::Authentication),
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Some(ErrorType::TableNotFound),
        s if s.is_success() && is_html => Some(ErrorType::Authentication),
        s if s.is_success() => None,
        _ => Some(ErrorType::SourceUnreachable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_url_encodes_tab_name() {
        let sheet = PublicSheet::new("abc123".to_string());
        let url = sheet.export_url("Goals & Stuff").unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.google.com/spreadsheets/d/abc123/gviz/tq?tqx=out%3Acsv&sheet=Goals+%26+Stuff"
        );
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(StatusCode::OK, false), None);
        assert_eq!(
            classify(StatusCode::OK, true),
            Some(ErrorType::Authentication)
        );
        assert_eq!(
            classify(StatusCode::FORBIDDEN, false),
            Some(ErrorType::Authentication)
        );
        assert_eq!(
            classify(StatusCode::NOT_FOUND, true),
            Some(ErrorType::TableNotFound)
        );
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS, false),
            Some(ErrorType::SourceUnreachable)
        );
    }

    #[tokio::test]
    async fn test_writes_are_rejected() {
        let mut sheet = PublicSheet::new("abc123".to_string());
        let e = sheet.put("Goals", &[]).await.unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Authentication);
        assert!(e.to_string().contains("read-only"));
        let e = sheet.append("Goals", &[]).await.unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Authentication);
    }
}
