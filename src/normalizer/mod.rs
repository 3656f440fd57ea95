use feed_rs::model::{Entry, Link, Text};
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{InformantError, Result};
use crate::config::FeedConfig;
use crate::domain::NewsItem;

/// Block-level tags that become line breaks when markup is stripped.
const BREAKING_TAGS: [&str; 8] = ["br", "p", "div", "li", "ul", "ol", "h1", "h2"];

#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse a raw feed body into items, picking body and date fields
    /// according to the feed's configured keys. Entries without an id or a
    /// usable date are dropped.
    pub fn normalize(&self, feed: &FeedConfig, body: &[u8]) -> Result<Vec<NewsItem>> {
        let parsed = parser::Builder::new()
            .id_generator(link_id)
            .build()
            .parse(body)
            .map_err(|e| InformantError::FeedParse(format!("{}: {}", feed.url, e)))?;

        let items: Vec<NewsItem> = parsed
            .entries
            .into_iter()
            .filter_map(|entry| to_item(feed, entry))
            .collect();

        tracing::debug!(feed = %feed.name, items = items.len(), "Normalized feed");
        Ok(items)
    }
}

/// Id for entries the feed gives none: the first link, if any.
fn link_id(links: &[Link], _title: &Option<Text>, _uri: Option<&str>) -> String {
    links.first().map(|l| l.href.clone()).unwrap_or_default()
}

fn to_item(feed: &FeedConfig, entry: Entry) -> Option<NewsItem> {
    let link = entry.links.first().map(|l| l.href.clone());
    let id = if entry.id.is_empty() {
        link.clone()?
    } else {
        entry.id
    };

    let published = match feed.timestamp_key.as_str() {
        "updated" => entry.updated.or(entry.published),
        _ => entry.published.or(entry.updated),
    };
    let Some(published) = published else {
        tracing::debug!(id = %id, "Skipping entry without a date");
        return None;
    };

    let summary = entry.summary.map(|s| s.content);
    let content = entry.content.and_then(|c| c.body);
    let body = match feed.body_key.as_str() {
        "content" => content.or(summary),
        _ => summary.or(content),
    };

    Some(NewsItem {
        id,
        title: entry
            .title
            .map(|t| t.content)
            .map(|t| decode_html_entities(t.trim()).into_owned())
            .unwrap_or_default(),
        content: body.map(|b| clean_html(&b)).unwrap_or_default(),
        published,
        link,
        feed_name: feed.name.clone(),
    })
}

/// Turn an HTML fragment into readable plain text: tags are removed (block
/// tags leave a line break), entities decoded, and runs of blank lines
/// collapsed to one.
pub fn clean_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut chars = html.chars();

    while let Some(c) = chars.next() {
        if c != '<' {
            text.push(c);
            continue;
        }

        let tag: String = chars.by_ref().take_while(|&c| c != '>').collect();
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if BREAKING_TAGS.contains(&name.as_str()) {
            text.push('\n');
        }
    }

    let decoded = decode_html_entities(&text);
    let lines: Vec<&str> = decoded.lines().map(str::trim_end).collect();

    let mut out = String::with_capacity(decoded.len());
    let mut blank_run = 0;
    for line in lines {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
