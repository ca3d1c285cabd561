use std::fmt::Debug;
use std::path::Path;

use google_sheets4::api::{Scope, SpreadsheetValueGetCall};
use google_sheets4::{hyper_rustls, hyper_util, yup_oauth2, Sheets};
use serde_json::Value;
use tokio::runtime::Runtime;

use super::{CriteriaError, Grid, GridSource};

#[derive(Debug, thiserror::Error)]
pub enum SheetOperationError {
    #[error("unable to load service account credentials: {0}")]
    Credentials(String),
    #[error("sheets request failed: {0}")]
    Backend(String),
    #[error("sheets runtime unavailable: {0}")]
    Runtime(String),
}

pub trait SheetGateway: Debug {
    /// Returns every populated row of the worksheet, header included.
    fn fetch_grid(&self, spreadsheet_id: &str, worksheet: &str)
        -> Result<Grid, SheetOperationError>;
}

/// Criteria are only ever read, never written back.
const READ_SCOPE: Scope = Scope::SpreadsheetReadonly;

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;

/// Thin wrapper around the generated google-sheets4 client allowing the
/// synchronous batch run to read a worksheet without exposing async details.
pub struct GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    hub: Sheets<C>,
    runtime: Runtime,
}

impl<C> GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    pub fn new(hub: Sheets<C>, runtime: Runtime) -> Self {
        Self { hub, runtime }
    }

    fn map_error<E: std::fmt::Display>(err: E) -> SheetOperationError {
        SheetOperationError::Backend(err.to_string())
    }
}

impl GoogleSheetsClient<HttpsConnector> {
    /// Authenticates with a service account key file (the JSON downloaded from
    /// the Google Cloud console). The sheet must be shared with that account.
    pub fn from_service_account<P: AsRef<Path>>(
        credentials_path: P,
    ) -> Result<Self, SheetOperationError> {
        let credentials_path = credentials_path.as_ref();
        if !credentials_path.exists() {
            return Err(SheetOperationError::Credentials(format!(
                "credentials file not found: {}",
                credentials_path.display()
            )));
        }

        let runtime =
            Runtime::new().map_err(|err| SheetOperationError::Runtime(err.to_string()))?;

        let hub = runtime.block_on(async {
            let key = yup_oauth2::read_service_account_key(credentials_path)
                .await
                .map_err(|err| SheetOperationError::Credentials(err.to_string()))?;
            let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
                .build()
                .await
                .map_err(|err| SheetOperationError::Credentials(err.to_string()))?;

            let connector = hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|err| SheetOperationError::Runtime(err.to_string()))?
                .https_only()
                .enable_http1()
                .build();
            let client = hyper_util::client::legacy::Client::builder(
                hyper_util::rt::TokioExecutor::new(),
            )
            .build(connector);

            Ok::<_, SheetOperationError>(Sheets::new(client, auth))
        })?;

        Ok(Self::new(hub, runtime))
    }
}

impl<C> std::fmt::Debug for GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsClient").finish_non_exhaustive()
    }
}

impl<C> SheetGateway for GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    fn fetch_grid(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
    ) -> Result<Grid, SheetOperationError> {
        let range = worksheet_range(worksheet);
        let result = self
            .runtime
            .block_on(values_request(&self.hub, spreadsheet_id, &range).doit());

        let (_, value_range) = result.map_err(GoogleSheetsClient::<C>::map_error)?;
        Ok(value_range
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

fn values_request<'a, C>(
    hub: &'a Sheets<C>,
    spreadsheet_id: &str,
    range: &str,
) -> SpreadsheetValueGetCall<'a, C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    hub.spreadsheets()
        .values_get(spreadsheet_id, range)
        .add_scope(READ_SCOPE)
}

/// A1 range covering the whole worksheet; names with spaces must be quoted.
fn worksheet_range(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Reads the configured worksheet through a [`SheetGateway`].
#[derive(Debug)]
pub struct SheetGridSource {
    gateway: Box<dyn SheetGateway>,
    spreadsheet_id: String,
    worksheet: String,
}

impl SheetGridSource {
    pub fn new(
        gateway: Box<dyn SheetGateway>,
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
        }
    }
}

impl GridSource for SheetGridSource {
    fn describe(&self) -> String {
        format!(
            "worksheet '{}' of spreadsheet {}",
            self.worksheet, self.spreadsheet_id
        )
    }

    fn read_grid(&self) -> Result<Grid, CriteriaError> {
        Ok(self
            .gateway
            .fetch_grid(&self.spreadsheet_id, &self.worksheet)?)
    }
}
