//! Notifier that prints new jobs to stdout.

use std::io::Write;

use async_trait::async_trait;

use super::{newest_first, subject_line, Notifier};
use crate::error::{NotifyError, NotifyResult};
use crate::record::Record;

/// Prints the subject and one line per job.
///
/// Fails only when stdout cannot be written, e.g. a closed pipe.
pub struct ConsoleNotifier {
    source_name: String,
}

impl ConsoleNotifier {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
        }
    }

    /// Plain-text rendering of the message.
    pub fn render(&self, records: &[Record]) -> String {
        let mut out = subject_line(records.len(), &self.source_name);
        for record in newest_first(records) {
            out.push_str(&format!(
                "\n  [{}] {} ({}, {}) posted {}\n      {}",
                record.id, record.title, record.location, record.category, record.date, record.url
            ));
        }
        out
    }

    fn write_to(&self, mut out: impl Write, records: &[Record]) -> NotifyResult<()> {
        writeln!(out, "{}", self.render(records))
            .and_then(|_| out.flush())
            .map_err(NotifyError::Output)
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, records: &[Record]) -> NotifyResult<()> {
        self.write_to(std::io::stdout().lock(), records)
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_every_job() {
        let notifier = ConsoleNotifier::new("Red Hat");
        let records = vec![
            Record::new("1", "Engineer", "Brisbane", "Eng", "01 Dec 2017, 9:00 AM", "https://e.com/1"),
            Record::new("2", "Manager", "Sydney", "Mgmt", "21 Dec 2017, 9:00 AM", "https://e.com/2"),
        ];

        let text = notifier.render(&records);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "2 new jobs from Red Hat");
        assert!(lines[1].contains("[2] Manager"));
        assert!(lines[3].contains("[1] Engineer"));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_rendered_message() {
        let notifier = ConsoleNotifier::new("Red Hat");
        let record = Record::new("1", "Engineer", "Brisbane", "Eng", "d", "https://e.com/1");
        let mut out = Vec::new();

        notifier.write_to(&mut out, &[record]).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("1 new job from Red Hat\n"));
        assert!(text.ends_with("https://e.com/1\n"));
    }

    #[test]
    fn test_closed_stdout_is_notify_error() {
        let notifier = ConsoleNotifier::new("Red Hat");
        let record = Record::new("1", "Engineer", "Brisbane", "Eng", "d", "https://e.com/1");

        let err = notifier.write_to(ClosedPipe, &[record]).unwrap_err();
        assert!(matches!(err, NotifyError::Output(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    }

    #[tokio::test]
    async fn test_empty_list_is_fine() {
        let notifier = ConsoleNotifier::new("Red Hat");
        assert!(notifier.notify(&[]).await.is_ok());
    }
}
