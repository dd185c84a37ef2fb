use std::borrow::Cow;
use std::collections::BTreeMap;

use csindex_core::{RawField, RawRecord};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, ScienceError};

/// Field being collected inside a record element.
struct FieldBuilder {
    name: String,
    text: String,
    attributes: BTreeMap<String, String>,
    nested: bool,
}

impl FieldBuilder {
    fn build(self) -> RawField {
        if self.attributes.is_empty() && !self.nested {
            RawField::Text(self.text)
        } else {
            RawField::Structured {
                text: self.text,
                attributes: self.attributes,
            }
        }
    }
}

/// Parses a DBLP person document (`<dblpperson>`) into its publication
/// records, one per `<r>` child, in document order.
///
/// Each child element of a record becomes a field; markup nested inside a
/// field (`<i>`, `<sub>`, ...) is flattened into its text. Record attributes
/// are kept as `@name` fields.
pub fn parse_person_records(xml: &str) -> Result<Vec<RawRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut record: Option<RawRecord> = None;
    let mut field: Option<FieldBuilder> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ScienceError::Parse(format!(
                "invalid dblp xml at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;
        match event {
            Event::Start(e) => {
                let name = element_name(&e);
                if in_record_slot(&stack) {
                    record = Some(start_record(&name, &e)?);
                } else if stack.len() == 3 && record.is_some() {
                    field = Some(FieldBuilder {
                        name: name.clone(),
                        text: String::new(),
                        attributes: attributes(&e)?,
                        nested: false,
                    });
                } else if let Some(f) = field.as_mut() {
                    f.nested = true;
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = element_name(&e);
                if in_record_slot(&stack) {
                    records.push(start_record(&name, &e)?);
                } else if stack.len() == 3 {
                    if let Some(r) = record.as_mut() {
                        let builder = FieldBuilder {
                            name,
                            text: String::new(),
                            attributes: attributes(&e)?,
                            nested: false,
                        };
                        r.insert(builder.name.clone(), builder.build());
                    }
                }
            }
            Event::Text(t) => {
                if let Some(f) = field.as_mut() {
                    let text = t
                        .unescape()
                        .unwrap_or_else(|_| Cow::Owned(String::from_utf8_lossy(&t).into_owned()));
                    f.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(f) = field.as_mut() {
                    f.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                stack.pop();
                match stack.len() {
                    3 => {
                        if let (Some(f), Some(r)) = (field.take(), record.as_mut()) {
                            r.insert(f.name.clone(), f.build());
                        }
                    }
                    2 => {
                        if let Some(r) = record.take() {
                            records.push(r);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ScienceError::Parse(format!(
            "dblp xml ended inside <{}>",
            stack.join("/")
        )));
    }
    Ok(records)
}

/// Direct child of an `<r>` wrapper under the document root.
fn in_record_slot(stack: &[String]) -> bool {
    stack.len() == 2 && stack[1] == "r"
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn start_record(kind: &str, e: &BytesStart<'_>) -> Result<RawRecord> {
    let mut record = RawRecord::new(kind);
    for (key, value) in attributes(e)? {
        record.insert(format!("@{key}"), RawField::Text(value));
    }
    Ok(record)
}

fn attributes(e: &BytesStart<'_>) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ScienceError::Parse(format!("bad attribute: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| ScienceError::Parse(format!("bad attribute value: {err}")))?;
        out.insert(key, value.into_owned());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON_XML: &str = r#"<?xml version="1.0" encoding="US-ASCII"?>
<dblpperson name="Ana Silva" pid="12/345" n="3">
<person key="homepages/12/345" mdate="2023-01-01">
<author pid="12/345">Ana Silva</author>
<url>https://example.org/ana</url>
</person>
<r><inproceedings key="conf/icse/Silva23" mdate="2023-05-01">
<author pid="12/345">Ana Silva</author>
<author pid="67/890">Bruno Costa</author>
<title>Testing <i>Flaky</i> Builds.</title>
<pages>1-12</pages>
<year>2023</year>
<booktitle>ICSE</booktitle>
<ee type="oa">https://doi.org/10.1109/ICSE.2023.1</ee>
<url>db/conf/icse/icse2023.html#Silva23</url>
</inproceedings>
</r>
<r><article key="journals/tse/Silva22" mdate="2022-02-02" publtype="informal">
<author pid="12/345">Ana Silva</author>
<title>A Journal Paper &amp; More.</title>
<journal>IEEE Trans. Software Eng.</journal>
<volume>48</volume>
<number>3</number>
<year>2022</year>
<url>db/journals/tse/tse48.html#Silva22</url>
</article>
</r>
<r><proceedings key="conf/x/2021"/></r>
<coauthors n="1" nc="1">
<co c="0"><na f="c/Costa:Bruno" pid="67/890">Bruno Costa</na></co>
</coauthors>
</dblpperson>
"#;

    #[test]
    fn parses_records_in_order() {
        let records = parse_person_records(PERSON_XML).unwrap();
        let kinds: Vec<&str> = records.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["inproceedings", "article", "proceedings"]);
    }

    #[test]
    fn repeated_and_attributed_fields() {
        let records = parse_person_records(PERSON_XML).unwrap();
        let paper = &records[0];

        let authors = paper.get("author").unwrap();
        assert_eq!(authors.texts(), vec!["Ana Silva", "Bruno Costa"]);
        assert!(matches!(authors, RawField::List(items) if items.len() == 2));

        match paper.get("ee").unwrap() {
            RawField::Structured { text, attributes } => {
                assert_eq!(text, "https://doi.org/10.1109/ICSE.2023.1");
                assert_eq!(attributes.get("type").map(String::as_str), Some("oa"));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
        assert_eq!(
            paper.get("@key").and_then(RawField::as_text),
            Some("conf/icse/Silva23")
        );
    }

    #[test]
    fn nested_markup_is_flattened() {
        let records = parse_person_records(PERSON_XML).unwrap();
        let title = records[0].get("title").unwrap();
        assert!(matches!(title, RawField::Structured { .. }));
        assert_eq!(title.as_text(), Some("Testing Flaky Builds."));
        assert_eq!(
            records[1].get("title").and_then(RawField::as_text),
            Some("A Journal Paper & More.")
        );
        assert_eq!(records[1].get("number").and_then(RawField::as_text), Some("3"));
    }

    #[test]
    fn person_and_coauthor_blocks_are_ignored() {
        let records = parse_person_records(PERSON_XML).unwrap();
        assert!(records.iter().all(|r| r.kind != "person" && r.kind != "co"));
        assert!(records[2].get("title").is_none());
    }

    #[test]
    fn empty_person_has_no_records() {
        let xml = r#"<dblpperson name="Nobody" pid="0/0" n="0"><person key="x"/></dblpperson>"#;
        assert!(parse_person_records(xml).unwrap().is_empty());
    }

    #[test]
    fn truncated_document_is_an_error() {
        let xml = "<dblpperson><r><article><title>Cut";
        assert!(parse_person_records(xml).is_err());
    }
}
