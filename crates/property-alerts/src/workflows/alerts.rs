//! Drives one batch run: every criteria row is searched, rendered and mailed in
//! turn. Rows are independent, so a failure is recorded against its row and
//! the loop moves on.

use chrono::Local;
use tracing::{error, info, info_span, warn};

use crate::config::SmtpConfig;
use crate::workflows::digest::{DigestEmail, MailTransport};
use crate::workflows::listings::{ListingError, ListingProvider};
use crate::workflows::search::{PropertyListing, SearchCriteria};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Send,
    /// Render the digest but hand it to the observer instead of the relay.
    DryRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStage {
    Search,
    Delivery,
}

impl RowStage {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Search => "listing search",
            Self::Delivery => "email delivery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Sent { listings: usize },
    Previewed { listings: usize },
    NoResults,
    Failed {
        stage: RowStage,
        error: String,
        not_implemented: bool,
    },
}

impl RowOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "Sent",
            Self::Previewed { .. } => "Previewed",
            Self::NoResults => "No results",
            Self::Failed { .. } => "Failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RowReport {
    pub criteria: SearchCriteria,
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub rows: Vec<RowReport>,
}

impl RunSummary {
    pub fn sent(&self) -> usize {
        self.count(|outcome| matches!(outcome, RowOutcome::Sent { .. }))
    }

    pub fn previewed(&self) -> usize {
        self.count(|outcome| matches!(outcome, RowOutcome::Previewed { .. }))
    }

    pub fn without_results(&self) -> usize {
        self.count(|outcome| matches!(outcome, RowOutcome::NoResults))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, RowOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count<F: Fn(&RowOutcome) -> bool>(&self, predicate: F) -> usize {
        self.rows
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

/// Hooks for console progress. Every method defaults to doing nothing.
pub trait RunObserver {
    fn row_started(&mut self, _position: usize, _criteria: &SearchCriteria) {}
    fn listings_found(&mut self, _criteria: &SearchCriteria, _listings: &[PropertyListing]) {}
    fn digest_ready(&mut self, _email: &DigestEmail, _mode: DeliveryMode) {}
    fn row_finished(&mut self, _report: &RowReport) {}
}

#[derive(Debug, Default)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}

#[derive(Debug)]
pub struct AlertRun<'a> {
    smtp: &'a SmtpConfig,
    provider: &'a dyn ListingProvider,
    mailer: &'a dyn MailTransport,
    mode: DeliveryMode,
}

impl<'a> AlertRun<'a> {
    pub fn new(
        smtp: &'a SmtpConfig,
        provider: &'a dyn ListingProvider,
        mailer: &'a dyn MailTransport,
        mode: DeliveryMode,
    ) -> Self {
        Self {
            smtp,
            provider,
            mailer,
            mode,
        }
    }

    pub fn execute(
        &self,
        criteria: &[SearchCriteria],
        observer: &mut dyn RunObserver,
    ) -> RunSummary {
        info!(
            rows = criteria.len(),
            provider = self.provider.name(),
            mode = ?self.mode,
            "starting alert run"
        );

        let mut summary = RunSummary::default();
        for (index, row) in criteria.iter().enumerate() {
            let position = index + 1;
            let span = info_span!("criteria_row", row = position, location = %row.location);
            let _entered = span.enter();

            observer.row_started(position, row);
            let outcome = self.process_row(row, observer);
            if let RowOutcome::Failed { stage, error, .. } = &outcome {
                error!(stage = stage.label(), %error, "criteria row failed, continuing");
            }

            let report = RowReport {
                criteria: row.clone(),
                outcome,
            };
            observer.row_finished(&report);
            summary.rows.push(report);
        }

        info!(
            sent = summary.sent(),
            previewed = summary.previewed(),
            no_results = summary.without_results(),
            failed = summary.failed(),
            "alert run finished"
        );
        summary
    }

    fn process_row(&self, row: &SearchCriteria, observer: &mut dyn RunObserver) -> RowOutcome {
        let listings = match self.provider.search(row) {
            Ok(listings) => listings,
            Err(err) => {
                return RowOutcome::Failed {
                    stage: RowStage::Search,
                    not_implemented: matches!(err, ListingError::NotImplemented),
                    error: err.to_string(),
                }
            }
        };

        info!(found = listings.len(), "listings retrieved");
        observer.listings_found(row, &listings);

        if listings.is_empty() {
            warn!("no listings found, skipping email");
            return RowOutcome::NoResults;
        }

        let email = DigestEmail::compose(self.smtp, row, &listings, Local::now().naive_local());
        observer.digest_ready(&email, self.mode);

        match self.mode {
            DeliveryMode::DryRun => RowOutcome::Previewed {
                listings: listings.len(),
            },
            DeliveryMode::Send => match self.mailer.send(&email) {
                Ok(()) => RowOutcome::Sent {
                    listings: listings.len(),
                },
                Err(err) => RowOutcome::Failed {
                    stage: RowStage::Delivery,
                    error: err.to_string(),
                    not_implemented: false,
                },
            },
        }
    }
}
