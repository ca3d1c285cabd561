use std::sync::Mutex;

use property_alerts::config::SmtpConfig;
use property_alerts::workflows::alerts::{
    AlertRun, DeliveryMode, RowOutcome, RowReport, RowStage, RunObserver, SilentObserver,
};
use property_alerts::workflows::digest::{build_message, DigestEmail, MailError, MailTransport};
use property_alerts::workflows::listings::{
    ListingError, ListingProvider, MockListingProvider, PropertyDataClient,
};
use property_alerts::workflows::search::{
    PropertyListing, PropertyType, PropertyTypeFilter, SearchCriteria,
};

#[derive(Debug, Default)]
struct RecordingMailer {
    sent: Mutex<Vec<DigestEmail>>,
    reject_location: Option<String>,
}

impl RecordingMailer {
    fn rejecting(location: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject_location: Some(location.to_string()),
        }
    }

    fn sent(&self) -> Vec<DigestEmail> {
        self.sent.lock().expect("mailer mutex").clone()
    }
}

impl MailTransport for RecordingMailer {
    fn send(&self, email: &DigestEmail) -> Result<(), MailError> {
        if let Some(location) = &self.reject_location {
            if email.subject.contains(location.as_str()) {
                let broken = DigestEmail {
                    from: "not-an-address".to_string(),
                    ..email.clone()
                };
                return Err(build_message(&broken).expect_err("address rejected"));
            }
        }
        self.sent.lock().expect("mailer mutex").push(email.clone());
        Ok(())
    }
}

/// Delegates to the mock generator except for one location, which fails.
#[derive(Debug)]
struct FlakyProvider {
    failing_location: &'static str,
}

impl ListingProvider for FlakyProvider {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn search(&self, criteria: &SearchCriteria) -> Result<Vec<PropertyListing>, ListingError> {
        if criteria.location == self.failing_location {
            return Err(ListingError::InvalidCriteria(format!(
                "no coverage for {}",
                criteria.location
            )));
        }
        MockListingProvider::new().search(criteria)
    }
}

#[derive(Debug)]
struct EmptyProvider;

impl ListingProvider for EmptyProvider {
    fn name(&self) -> &'static str {
        "empty"
    }

    fn search(&self, _criteria: &SearchCriteria) -> Result<Vec<PropertyListing>, ListingError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct CapturingObserver {
    started: Vec<usize>,
    listings: Vec<Vec<PropertyListing>>,
    previews: Vec<DigestEmail>,
    finished: Vec<String>,
}

impl RunObserver for CapturingObserver {
    fn row_started(&mut self, position: usize, _criteria: &SearchCriteria) {
        self.started.push(position);
    }

    fn listings_found(&mut self, _criteria: &SearchCriteria, listings: &[PropertyListing]) {
        self.listings.push(listings.to_vec());
    }

    fn digest_ready(&mut self, email: &DigestEmail, mode: DeliveryMode) {
        if mode == DeliveryMode::DryRun {
            self.previews.push(email.clone());
        }
    }

    fn row_finished(&mut self, report: &RowReport) {
        self.finished.push(report.outcome.label().to_string());
    }
}

fn smtp_config() -> SmtpConfig {
    SmtpConfig {
        host: "smtp.example.com".to_string(),
        port: 587,
        username: "mailer".to_string(),
        password: "secret".to_string(),
        email_from: "alerts@example.com".to_string(),
        email_to: "buyer@example.com".to_string(),
    }
}

fn criteria(location: &str, kind: PropertyTypeFilter) -> SearchCriteria {
    SearchCriteria {
        location: location.to_string(),
        min_price: 150_000,
        max_price: 300_000,
        min_bedrooms: 1,
        max_bedrooms: 3,
        property_type: kind,
        radius_miles: 10.0,
    }
}

#[test]
fn manchester_flats_are_found_and_mailed_once() {
    let smtp = smtp_config();
    let provider = MockListingProvider::new();
    let mailer = RecordingMailer::default();
    let mut observer = CapturingObserver::default();
    let search = criteria("Manchester", PropertyTypeFilter::Only(PropertyType::Flat));

    let summary = AlertRun::new(&smtp, &provider, &mailer, DeliveryMode::Send)
        .execute(std::slice::from_ref(&search), &mut observer);

    let listings = &observer.listings[0];
    assert!((3..=8).contains(&listings.len()));
    for listing in listings {
        assert_eq!(listing.property_type, PropertyType::Flat);
        assert!((150_000..=300_000).contains(&listing.price));
        assert!((1..=3).contains(&listing.bedrooms));
    }

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("Manchester"));
    assert_eq!(sent[0].to, "buyer@example.com");
    assert_eq!(sent[0].from, "alerts@example.com");
    for listing in listings {
        assert!(sent[0].html_body.contains(&listing.address));
    }

    assert_eq!(
        summary.rows[0].outcome,
        RowOutcome::Sent {
            listings: listings.len()
        }
    );
    assert!(!summary.has_failures());
}

#[test]
fn failing_row_does_not_stop_the_others() {
    let smtp = smtp_config();
    let provider = FlakyProvider {
        failing_location: "Leeds",
    };
    let mailer = RecordingMailer::default();
    let mut observer = CapturingObserver::default();
    let rows = vec![
        criteria("Bristol", PropertyTypeFilter::Any),
        criteria("Leeds", PropertyTypeFilter::Any),
        criteria("Birmingham", PropertyTypeFilter::Any),
    ];

    let summary =
        AlertRun::new(&smtp, &provider, &mailer, DeliveryMode::Send).execute(&rows, &mut observer);

    assert_eq!(observer.started, vec![1, 2, 3]);
    assert_eq!(observer.finished, vec!["Sent", "Failed", "Sent"]);
    assert_eq!(summary.sent(), 2);
    assert_eq!(summary.failed(), 1);
    assert!(summary.has_failures());
    assert!(matches!(
        summary.rows[1].outcome,
        RowOutcome::Failed {
            stage: RowStage::Search,
            not_implemented: false,
            ..
        }
    ));

    let subjects: Vec<String> = mailer.sent().into_iter().map(|email| email.subject).collect();
    assert_eq!(subjects.len(), 2);
    assert!(subjects[0].contains("Bristol"));
    assert!(subjects[1].contains("Birmingham"));
}

#[test]
fn empty_results_skip_the_email() {
    let smtp = smtp_config();
    let mailer = RecordingMailer::default();

    let summary = AlertRun::new(&smtp, &EmptyProvider, &mailer, DeliveryMode::Send).execute(
        &[criteria("Truro", PropertyTypeFilter::Any)],
        &mut SilentObserver,
    );

    assert_eq!(summary.rows[0].outcome, RowOutcome::NoResults);
    assert_eq!(summary.without_results(), 1);
    assert!(mailer.sent().is_empty());
    assert!(!summary.has_failures());
}

#[test]
fn delivery_failure_is_reported_per_row() {
    let smtp = smtp_config();
    let provider = MockListingProvider::new();
    let mailer = RecordingMailer::rejecting("Leeds");
    let rows = vec![
        criteria("Leeds", PropertyTypeFilter::Any),
        criteria("York", PropertyTypeFilter::Any),
    ];

    let summary = AlertRun::new(&smtp, &provider, &mailer, DeliveryMode::Send)
        .execute(&rows, &mut SilentObserver);

    assert!(matches!(
        summary.rows[0].outcome,
        RowOutcome::Failed {
            stage: RowStage::Delivery,
            ..
        }
    ));
    assert!(matches!(summary.rows[1].outcome, RowOutcome::Sent { .. }));
    assert_eq!(mailer.sent().len(), 1);
}

#[test]
fn unimplemented_provider_is_flagged_distinctly() {
    let smtp = smtp_config();
    let provider = PropertyDataClient::new("pd-key");
    let mailer = RecordingMailer::default();

    let summary = AlertRun::new(&smtp, &provider, &mailer, DeliveryMode::Send).execute(
        &[SearchCriteria::fallback()],
        &mut SilentObserver,
    );

    assert!(matches!(
        summary.rows[0].outcome,
        RowOutcome::Failed {
            stage: RowStage::Search,
            not_implemented: true,
            ..
        }
    ));
    assert!(mailer.sent().is_empty());
}

#[test]
fn dry_run_renders_without_sending() {
    let smtp = smtp_config();
    let provider = MockListingProvider::new();
    let mailer = RecordingMailer::default();
    let mut observer = CapturingObserver::default();

    let summary = AlertRun::new(&smtp, &provider, &mailer, DeliveryMode::DryRun).execute(
        &[criteria("London", PropertyTypeFilter::Any)],
        &mut observer,
    );

    assert!(mailer.sent().is_empty());
    assert_eq!(observer.previews.len(), 1);
    assert!(observer.previews[0].subject.contains("London"));
    assert_eq!(summary.previewed(), 1);
}
