use std::fmt::{self, Write};

use jiff::{SignedDuration, Timestamp};

use crate::{dates, feed::escape_xml, models::FeedRecord, slug::slugify};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: Timestamp,
    pub change_frequency: ChangeFrequency,
    pub priority: f64,
}

const STATIC_PAGES: [(&str, ChangeFrequency, f64); 5] = [
    ("", ChangeFrequency::Daily, 1.0),
    ("/reviews", ChangeFrequency::Daily, 0.9),
    ("/lists", ChangeFrequency::Weekly, 0.7),
    ("/articles", ChangeFrequency::Weekly, 0.7),
    ("/feed.xml", ChangeFrequency::Daily, 0.4),
];

/// Priority and change frequency for a page last touched at `updated`.
pub fn recency_band(updated: Timestamp, now: Timestamp) -> (f64, ChangeFrequency) {
    let age = now.duration_since(updated);
    if age < SignedDuration::from_hours(7 * 24) {
        (0.9, ChangeFrequency::Weekly)
    } else if age < SignedDuration::from_hours(30 * 24) {
        (0.8, ChangeFrequency::Monthly)
    } else {
        (0.7, ChangeFrequency::Monthly)
    }
}

/// One entry per review page followed by the static pages.
pub fn entries(site_url: &str, records: &[FeedRecord], now: Timestamp) -> Vec<SitemapEntry> {
    let site = site_url.trim_end_matches('/');

    let reviews = records.iter().map(|record| {
        let updated = dates::or_now(record.updated_at.as_deref(), now);
        let (priority, change_frequency) = recency_band(updated, now);
        SitemapEntry {
            url: format!("{site}/reviews/{}", slugify(&record.title)),
            last_modified: updated,
            change_frequency,
            priority,
        }
    });

    let pages = STATIC_PAGES.iter().map(|&(path, change_frequency, priority)| SitemapEntry {
        url: format!("{site}{path}"),
        last_modified: now,
        change_frequency,
        priority,
    });

    reviews.chain(pages).collect()
}

pub fn render_xml(entries: &[SitemapEntry]) -> String {
    let mut urls = String::new();
    for entry in entries {
        let _ = write!(
            urls,
            "\n  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{:.1}</priority>\n  </url>",
            escape_xml(&entry.url),
            entry.last_modified,
            entry.change_frequency,
            entry.priority,
        );
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{urls}
</urlset>
"#
    )
}
