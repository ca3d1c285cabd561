use property_alerts::workflows::alerts::{
    DeliveryMode, RowOutcome, RowReport, RunObserver, RunSummary,
};
use property_alerts::workflows::criteria::CriteriaBatch;
use property_alerts::workflows::digest::DigestEmail;
use property_alerts::workflows::search::{PropertyListing, SearchCriteria};

const PREVIEW_LISTINGS: usize = 3;

pub(crate) fn print_batch(batch: &CriteriaBatch) {
    println!("Property alert run");
    match batch {
        CriteriaBatch::Loaded(rows) => println!("Loaded {} search(es) from the sheet", rows.len()),
        CriteriaBatch::Fallback { reason, .. } => {
            println!("Could not read search criteria ({reason})");
            println!("Using the default search instead");
        }
    }
}

pub(crate) fn print_summary(summary: &RunSummary) {
    println!("\nRun summary");
    println!("- Emails sent: {}", summary.sent());
    if summary.previewed() > 0 {
        println!("- Digests previewed: {}", summary.previewed());
    }
    println!("- Searches with no results: {}", summary.without_results());
    println!("- Failed searches: {}", summary.failed());
}

/// Prints per-row progress as the run advances.
#[derive(Debug)]
pub(crate) struct ConsoleObserver {
    show_html: bool,
}

impl ConsoleObserver {
    pub(crate) fn new(show_html: bool) -> Self {
        Self { show_html }
    }
}

impl RunObserver for ConsoleObserver {
    fn row_started(&mut self, position: usize, criteria: &SearchCriteria) {
        println!("\n[{position}] {criteria}");
    }

    fn listings_found(&mut self, _criteria: &SearchCriteria, listings: &[PropertyListing]) {
        println!("Found {} listing(s)", listings.len());
        for listing in listings.iter().take(PREVIEW_LISTINGS) {
            println!(
                "- {} | {} | {} bed {}",
                listing.address,
                listing.formatted_price(),
                listing.bedrooms,
                listing.property_type.label().to_lowercase()
            );
        }
        if listings.len() > PREVIEW_LISTINGS {
            println!("  ...and {} more", listings.len() - PREVIEW_LISTINGS);
        }
    }

    fn digest_ready(&mut self, email: &DigestEmail, mode: DeliveryMode) {
        if mode != DeliveryMode::DryRun {
            return;
        }
        println!("Dry run: would send '{}' to {}", email.subject, email.to);
        if self.show_html {
            println!("{}", email.html_body);
        }
    }

    fn row_finished(&mut self, report: &RowReport) {
        match &report.outcome {
            RowOutcome::Sent { listings } => println!("Emailed {listings} listing(s)"),
            RowOutcome::Previewed { .. } => {}
            RowOutcome::NoResults => println!("No listings found, skipping email"),
            RowOutcome::Failed {
                stage,
                error,
                not_implemented,
            } => {
                println!("Failed during {}: {error}", stage.label());
                if *not_implemented {
                    println!("Hint: set USE_MOCK_API=true until the listings API is wired up");
                }
            }
        }
    }
}
