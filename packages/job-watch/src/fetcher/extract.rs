//! Listing page extraction.
//!
//! Each job row of the listing table becomes one fully-formed [`Record`].
//! Fields are read relative to their own row, so a row with a missing field
//! is dropped on its own instead of shifting values between jobs.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::date::normalize_date;
use crate::error::{FetchError, FetchResult};
use crate::record::{Record, Snapshot};

struct Selectors {
    table: Selector,
    row: Selector,
    title_link: Selector,
    span: Selector,
    location: Selector,
    posted: Selector,
    fields: Selector,
}

impl Selectors {
    fn new() -> FetchResult<Self> {
        Ok(Self {
            table: parse_selector(".iCIMS_JobsTable")?,
            row: parse_selector("div.row")?,
            title_link: parse_selector("div.title a[href]")?,
            span: parse_selector("span")?,
            location: parse_selector("div.header.left span")?,
            posted: parse_selector("div.header.right span[title]")?,
            fields: parse_selector("div.additionalFields dd span")?,
        })
    }
}

fn parse_selector(css: &str) -> FetchResult<Selector> {
    Selector::parse(css).map_err(|e| FetchError::Parse {
        reason: format!("invalid selector {:?}: {}", css, e),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extract every job on a listing page.
///
/// `page_url` is used to resolve relative posting links. Fails if the page
/// has no listing table at all; individual incomplete rows are skipped.
pub fn extract_records(html: &str, page_url: &Url) -> FetchResult<Snapshot> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(html);

    let table = document
        .select(&selectors.table)
        .next()
        .ok_or_else(|| FetchError::Parse {
            reason: "no job listing table found".to_string(),
        })?;

    let mut snapshot = Snapshot::new();
    let mut skipped = 0usize;

    for row in table.select(&selectors.row) {
        // Wrapper rows contain several listings; only leaf job rows count.
        if row.select(&selectors.title_link).count() != 1 {
            continue;
        }

        match extract_row(row, &selectors, page_url) {
            Some(record) => snapshot.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped incomplete job rows");
    }
    debug!(records = snapshot.len(), "Extracted job records");

    Ok(snapshot)
}

fn extract_row(row: ElementRef<'_>, selectors: &Selectors, page_url: &Url) -> Option<Record> {
    let link = row.select(&selectors.title_link).next()?;

    // The first span of a labelled field is a screen-reader label.
    let title = link.select(&selectors.span).last().map(text_of)?;
    let href = link.value().attr("href")?;
    let url = page_url.join(href.trim()).ok()?;

    let location = row.select(&selectors.location).last().map(text_of)?;
    let date = row
        .select(&selectors.posted)
        .next()
        .and_then(|el| el.value().attr("title"))
        .map(normalize_date)?;

    let mut fields = row.select(&selectors.fields).map(text_of);
    let category = fields.next()?;
    let id = fields.next()?;

    if id.is_empty() || title.is_empty() {
        return None;
    }

    Some(Record::new(id, title, location, category, date, url.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://careers.example.com/jobs/search?ss=1").unwrap()
    }

    fn job_row(id: &str, title: &str, href: &str, posted: &str) -> String {
        format!(
            r#"<div class="row">
                <div class="col-xs-12 title">
                    <a href="{href}"><span class="sr-only field-label">Title</span><span> {title} </span></a>
                </div>
                <div class="col-xs-6 header left">
                    <span class="sr-only field-label">Job Locations</span>
                    <span> AU-VIC-Melbourne </span>
                </div>
                <div class="col-xs-6 header right">
                    <span class="sr-only field-label">Posted Date</span>
                    <span title="{posted}">3 days ago</span>
                </div>
                <div class="col-xs-12 additionalFields">
                    <div><dl>
                        <dt>Category</dt><dd><span>Engineering</span></dd>
                        <dt>ID</dt><dd><span>{id}</span></dd>
                    </dl></div>
                </div>
            </div>"#
        )
    }

    fn listing(rows: &[String]) -> String {
        format!(
            r#"<html><body><div class="container-fluid iCIMS_JobsTable">{}</div></body></html>"#,
            rows.join("\n")
        )
    }

    #[test]
    fn test_extracts_complete_rows() {
        let html = listing(&[
            job_row("1001", "Software Engineer", "/jobs/1001/software-engineer/job", "12/21/2017 9:05 AM"),
            job_row("1002", "Support Engineer", "https://careers.example.com/jobs/1002/job", "2017-12-20 16:00"),
        ]);

        let snapshot = extract_records(&html, &page_url()).unwrap();
        assert_eq!(snapshot.len(), 2);

        let first = &snapshot.records()[0];
        assert_eq!(first.id, "1001");
        assert_eq!(first.title, "Software Engineer");
        assert_eq!(first.location, "AU-VIC-Melbourne");
        assert_eq!(first.category, "Engineering");
        assert_eq!(first.date, "21 Dec 2017, 9:05 AM");
        assert_eq!(first.url, "https://careers.example.com/jobs/1001/software-engineer/job");

        assert_eq!(snapshot.records()[1].date, "20 Dec 2017, 4:00 PM");
    }

    #[test]
    fn test_incomplete_row_does_not_shift_neighbours() {
        let broken = r#"<div class="row">
                <div class="col-xs-12 title"><a href="/jobs/2/job"><span>Title</span><span>No Fields</span></a></div>
                <div class="col-xs-6 header left"><span>Label</span><span>Sydney</span></div>
                <div class="col-xs-6 header right"><span title="2017-12-19">x</span></div>
            </div>"#
            .to_string();
        let html = listing(&[
            job_row("1", "First", "/jobs/1/job", "2017-12-21"),
            broken,
            job_row("3", "Third", "/jobs/3/job", "2017-12-18"),
        ]);

        let snapshot = extract_records(&html, &page_url()).unwrap();
        let ids: Vec<_> = snapshot.ids().collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(snapshot.records()[1].title, "Third");
    }

    #[test]
    fn test_wrapper_rows_are_ignored() {
        let html = listing(&[format!(
            r#"<div class="row">{}{}</div>"#,
            job_row("1", "First", "/jobs/1/job", "2017-12-21"),
            job_row("2", "Second", "/jobs/2/job", "2017-12-21"),
        )]);

        let snapshot = extract_records(&html, &page_url()).unwrap();
        assert_eq!(snapshot.ids().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_empty_table_is_empty_snapshot() {
        let snapshot = extract_records(&listing(&[]), &page_url()).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_missing_table_is_parse_error() {
        let err = extract_records("<html><body><p>Maintenance</p></body></html>", &page_url())
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }
}
