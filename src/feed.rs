//! RSS 2.0 feed of reviewed films.

use std::fmt::Write;

use jiff::Timestamp;

use crate::{dates, models::FeedRecord, slug::slugify};

const CHANNEL_TITLE: &str = "Slow Cinema Club";
const CHANNEL_DESCRIPTION: &str = "Deep analysis of arthouse and experimental cinema";

pub fn render_rss(site_url: &str, records: &[FeedRecord], now: Timestamp) -> String {
    let site = site_url.trim_end_matches('/');
    let mut items = String::new();

    for record in records {
        let link = format!("{site}/reviews/{}", slugify(&record.title));
        let title = match record.year {
            Some(year) => format!("{} Review ({year})", record.title),
            None => format!("{} Review", record.title),
        };
        let pub_date = dates::rfc2822(dates::or_now(record.updated_at.as_deref(), now));

        let _ = write!(
            items,
            "\n    <item>\n      <title>{}</title>\n      <link>{link}</link>\n      <guid>{link}</guid>\n      <description>{}</description>\n      <pubDate>{pub_date}</pubDate>\n    </item>",
            escape_xml(&title),
            escape_xml(&record.description),
        );
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{}</title>
    <link>{site}</link>
    <description>{}</description>
    <language>en</language>
    <lastBuildDate>{}</lastBuildDate>
    <atom:link href="{site}/feed.xml" rel="self" type="application/rss+xml"/>{items}
  </channel>
</rss>
"#,
        escape_xml(CHANNEL_TITLE),
        escape_xml(CHANNEL_DESCRIPTION),
        dates::rfc2822(now),
    )
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
