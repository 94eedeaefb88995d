//! Delivering new jobs to a recipient.
//!
//! The coordinator only depends on the [`Notifier`] trait and never calls it
//! with an empty list. Implementations:
//! - [`SmtpNotifier`] - emails the rendered message through an SMTP server
//! - [`WebhookNotifier`] - posts the rendered message to a mail relay
//! - [`ConsoleNotifier`] - prints the message to stdout

pub mod console;
pub mod smtp;
pub mod webhook;

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::error::NotifyResult;
use crate::fetcher::parse_canonical;
use crate::record::Record;

pub use console::ConsoleNotifier;
pub use smtp::{SmtpConfig, SmtpNotifier, DEFAULT_SMTP_PORT};
pub use webhook::{WebhookConfig, WebhookNotifier};

/// Sink for newly detected jobs.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message describing `records`.
    ///
    /// Must not fail just because `records` is empty.
    async fn notify(&self, records: &[Record]) -> NotifyResult<()>;

    /// Notifier name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

/// A rendered new-jobs message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub html: String,
}

/// Subject line, e.g. `3 new jobs from Red Hat`.
pub fn subject_line(count: usize, source_name: &str) -> String {
    if count == 1 {
        format!("1 new job from {}", source_name)
    } else {
        format!("{} new jobs from {}", count, source_name)
    }
}

/// Records ordered newest first by posting date.
///
/// Records whose date cannot be parsed go last, keeping their relative order.
pub fn newest_first(records: &[Record]) -> Vec<&Record> {
    let mut sorted: Vec<(&Record, _)> = records
        .iter()
        .map(|r| (r, parse_canonical(&r.date)))
        .collect();

    sorted.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    sorted.into_iter().map(|(r, _)| r).collect()
}

/// Render the HTML message for a batch of new jobs.
pub fn render_message(records: &[Record], source_name: &str) -> Message {
    let mut body = String::new();
    for record in newest_first(records) {
        body.push_str(&format!(
            "<b><a href=\"{}\">{}</a></b> in {}<br>Posted on {}<br>Category: {}<br>Job ID: {}<br><br>",
            escape_html(&record.url),
            escape_html(&record.title),
            escape_html(&record.location),
            escape_html(&record.date),
            escape_html(&record.category),
            escape_html(&record.id),
        ));
    }

    Message {
        subject: subject_line(records.len(), source_name),
        html: format!("<html><body>{}</body></html>", body),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
