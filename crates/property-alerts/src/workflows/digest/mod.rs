mod mailer;
mod render;

use chrono::NaiveDateTime;

use crate::config::SmtpConfig;
use crate::workflows::search::{PropertyListing, SearchCriteria};

pub use mailer::{build_message, MailError, MailTransport, SmtpMailer};
pub use render::{digest_subject, render_digest};

/// Fully formed message content, ready for any [`MailTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestEmail {
    pub subject: String,
    pub html_body: String,
    pub from: String,
    pub to: String,
}

impl DigestEmail {
    pub fn compose(
        smtp: &SmtpConfig,
        criteria: &SearchCriteria,
        listings: &[PropertyListing],
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            subject: digest_subject(criteria, listings.len()),
            html_body: render_digest(criteria, listings, generated_at),
            from: smtp.email_from.clone(),
            to: smtp.email_to.clone(),
        }
    }
}
