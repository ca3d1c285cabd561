use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use property_alerts::config::{AppConfig, CriteriaOrigin};
use property_alerts::error::AppError;
use property_alerts::telemetry;
use property_alerts::workflows::alerts::{AlertRun, DeliveryMode};
use property_alerts::workflows::criteria::{
    CriteriaLoader, CsvGridSource, GoogleSheetsClient, SheetGridSource, UnavailableSource,
};
use property_alerts::workflows::digest::SmtpMailer;
use property_alerts::workflows::listings::provider_for;
use tracing::info;

use crate::console::{self, ConsoleObserver};

/// Exit status used with `--fail-on-error` when at least one row failed.
const ROW_FAILURE_EXIT: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "property-alerts",
    about = "Email property listings matching each row of the search spreadsheet",
    version
)]
struct Cli {
    /// Settings file to load before reading the environment (defaults to ./.env)
    #[arg(long)]
    env_file: Option<PathBuf>,
    /// Read search criteria from a CSV export instead of Google Sheets
    #[arg(long)]
    criteria_csv: Option<PathBuf>,
    /// Render each digest and print it instead of sending email
    #[arg(long)]
    dry_run: bool,
    /// With --dry-run, also print each rendered HTML body
    #[arg(long, requires = "dry_run")]
    show_html: bool,
    /// Exit with status 2 when any criteria row fails
    #[arg(long)]
    fail_on_error: bool,
}

pub(crate) fn run() -> Result<ExitCode, AppError> {
    let cli = Cli::parse();
    let origin = if cli.criteria_csv.is_some() {
        CriteriaOrigin::LocalFile
    } else {
        CriteriaOrigin::Spreadsheet
    };

    let mode = if cli.dry_run {
        DeliveryMode::DryRun
    } else {
        DeliveryMode::Send
    };

    let config = match &cli.env_file {
        Some(path) => AppConfig::load_with_env_file(path, origin, mode)?,
        None => AppConfig::load(origin, mode)?,
    };
    telemetry::init(&config.telemetry)?;
    info!(environment = ?config.environment, "configuration loaded");

    let batch = criteria_loader(&config, cli.criteria_csv.as_deref()).load();
    console::print_batch(&batch);

    let provider = provider_for(&config.listings);
    let mailer = SmtpMailer::from_config(&config.smtp);

    let mut observer = ConsoleObserver::new(cli.show_html);
    let summary = AlertRun::new(&config.smtp, provider.as_ref(), &mailer, mode)
        .execute(batch.rows(), &mut observer);
    console::print_summary(&summary);

    if cli.fail_on_error && summary.has_failures() {
        return Ok(ExitCode::from(ROW_FAILURE_EXIT));
    }
    Ok(ExitCode::SUCCESS)
}

fn criteria_loader(config: &AppConfig, criteria_csv: Option<&Path>) -> CriteriaLoader {
    if let Some(path) = criteria_csv {
        return CriteriaLoader::new(Box::new(CsvGridSource::new(path)));
    }

    let Some(sheets) = &config.sheets else {
        return CriteriaLoader::new(Box::new(UnavailableSource::new(
            "spreadsheet",
            "Google Sheets settings are not configured",
        )));
    };

    match GoogleSheetsClient::from_service_account(&sheets.credentials_path) {
        Ok(client) => CriteriaLoader::new(Box::new(SheetGridSource::new(
            Box::new(client),
            &sheets.spreadsheet_id,
            &sheets.worksheet_name,
        ))),
        Err(err) => CriteriaLoader::new(Box::new(UnavailableSource::new(
            format!(
                "worksheet '{}' of spreadsheet {}",
                sheets.worksheet_name, sheets.spreadsheet_id
            ),
            err,
        ))),
    }
}
