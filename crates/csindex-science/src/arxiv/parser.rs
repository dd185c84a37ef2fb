use quick_xml::de::from_str;
use serde::Deserialize;

use crate::arxiv::types::{ArxivEntry, ArxivFeed};
use crate::error::{Result, ScienceError};

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "opensearch:totalResults", alias = "totalResults")]
    total_results: Option<TextNode>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    #[serde(default)]
    title: String,
}

pub fn parse_atom_response(xml: &str) -> Result<ArxivFeed> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| ScienceError::Parse(format!("invalid atom xml: {e}")))?;

    let entries: Vec<ArxivEntry> = feed
        .entries
        .into_iter()
        .map(|entry| ArxivEntry {
            id: entry.id.trim().to_string(),
            title: clean_text(&entry.title),
        })
        .collect();

    // Older mirrors omit the opensearch header; fall back to the entry count.
    let total_results = match feed.total_results {
        Some(node) => node.value.trim().parse::<u32>().map_err(|e| {
            ScienceError::Parse(format!("invalid totalResults {:?}: {e}", node.value))
        })?,
        None => entries.len() as u32,
    };

    Ok(ArxivFeed {
        total_results,
        entries,
    })
}

pub(crate) fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_HIT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <link href="http://arxiv.org/api/query" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query: search_query=all:"Attention Is All You Need"</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2024-01-01T00:00:00-05:00</updated>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">1</opensearch:totalResults>
  <opensearch:startIndex xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">0</opensearch:startIndex>
  <opensearch:itemsPerPage xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">1</opensearch:itemsPerPage>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <updated>2023-08-02T17:54:37Z</updated>
    <published>2017-06-12T17:57:40Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>The dominant sequence transduction models.</summary>
    <author><name>Ashish Vaswani</name></author>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.CL"/>
  </entry>
</feed>
"#;

    #[test]
    fn parses_single_hit() {
        let feed = parse_atom_response(SINGLE_HIT_XML).unwrap();
        assert_eq!(feed.total_results, 1);
        let entry = feed.unique_entry().unwrap();
        assert_eq!(entry.id, "http://arxiv.org/abs/1706.03762v7");
        assert_eq!(entry.title, "Attention Is All You Need");
    }

    #[test]
    fn empty_feed_has_no_unique_entry() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">0</opensearch:totalResults>
</feed>"#;
        let feed = parse_atom_response(xml).unwrap();
        assert_eq!(feed.total_results, 0);
        assert!(feed.entries.is_empty());
        assert!(feed.unique_entry().is_none());
    }

    #[test]
    fn many_hits_are_ambiguous() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">12</opensearch:totalResults>
  <entry><id>http://arxiv.org/abs/1</id><title>A</title></entry>
</feed>"#;
        let feed = parse_atom_response(xml).unwrap();
        assert_eq!(feed.total_results, 12);
        assert!(feed.unique_entry().is_none());
    }

    #[test]
    fn entry_without_id_is_an_error() {
        let xml = r#"<feed><entry><title>No Id</title></entry></feed>"#;
        assert!(parse_atom_response(xml).is_err());
    }
}
