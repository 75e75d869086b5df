//! Decoder for the portal's SDMX v1.0 interchange responses.
//!
//! A response is one XML document with a `CodeLists` section (code ->
//! description dictionaries, one per dimension) and a `DataSet` section
//! (one `Series` per observation, with dimension values given as codes).
//! Decoding resolves every coded dimension through the code lists and
//! flattens each series into a [`DataRecord`].

use std::collections::{BTreeMap, HashMap};

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::{Error, Result};
use crate::models::{CodeList, DataRecord};

/// Fixed namespace bindings used by every traversal. The portal emits
/// SDMX v1.0; documents from other schema versions are out of scope.
const XML_NS: &[(&str, &str)] = &[
    ("message", "http://www.SDMX.org/resources/SDMXML/schemas/v1_0/message"),
    ("common", "http://www.SDMX.org/resources/SDMXML/schemas/v1_0/common"),
    ("compact", "http://www.SDMX.org/resources/SDMXML/schemas/v1_0/compact"),
    ("cross", "http://www.SDMX.org/resources/SDMXML/schemas/v1_0/cross"),
    ("generic", "http://www.SDMX.org/resources/SDMXML/schemas/v1_0/generic"),
    ("query", "http://www.SDMX.org/resources/SDMXML/schemas/v1_0/query"),
    ("structure", "http://www.SDMX.org/resources/SDMXML/schemas/v1_0/structure"),
    ("utility", "http://www.SDMX.org/resources/SDMXML/schemas/v1_0/utility"),
    ("xsi", "http://www.w3.org/2001/XMLSchema-instance"),
];

/// One element of the parsed document: resolved namespace URI, local
/// name, attributes, text and children.
#[derive(Debug, Clone)]
pub struct Element {
    ns: String,
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child matching a `prefix:local` tag (prefix resolved through
    /// the fixed bindings; a prefixless tag matches no-namespace
    /// elements).
    fn find(&self, tag: &str) -> Option<&Element> {
        self.find_all(tag).next()
    }

    fn find_all<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a Element> {
        let (ns, local) = split_tag(tag);
        self.children
            .iter()
            .filter(move |c| c.ns == ns && c.name == local)
    }

    fn find_path(&self, path: &[&str]) -> Option<&Element> {
        let mut node = self;
        for tag in path {
            node = node.find(tag)?;
        }
        Some(node)
    }
}

/// Resolve a `prefix:local` tag to `(namespace uri, local name)`.
fn split_tag(tag: &str) -> (&'static str, &str) {
    match tag.split_once(':') {
        Some((prefix, local)) => {
            let ns = XML_NS
                .iter()
                .find(|(p, _)| *p == prefix)
                .map(|(_, uri)| *uri)
                .unwrap_or("");
            (ns, local)
        }
        None => ("", tag),
    }
}

/// Descendant text at `path`, trimmed, or `default` if any step of the
/// path is missing.
fn text_at<'a>(node: &'a Element, path: &[&str], default: &'a str) -> &'a str {
    match node.find_path(path) {
        Some(n) => n.text.trim(),
        None => default,
    }
}

/// Descendant attribute at `path`, trimmed, or `default` if the path or
/// the attribute is missing.
fn attr_at<'a>(node: &'a Element, attr: &str, path: &[&str], default: &'a str) -> &'a str {
    match node.find_path(path) {
        Some(n) => n.attr(attr).map(str::trim).unwrap_or(default),
        None => default,
    }
}

/// Parse XML text into an element tree.
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        match reader.read_resolved_event() {
            Err(e) => return Err(Error::Parse(format!("invalid xml: {e}"))),
            Ok((ns, Event::Start(start))) => {
                let element = open_element(&ns, &start)?;
                stack.push(element);
            }
            Ok((ns, Event::Empty(start))) => {
                let element = open_element(&ns, &start)?;
                close_element(&mut stack, &mut root, element);
            }
            Ok((_, Event::End(_))) => {
                // the reader rejects unbalanced tags before we get here
                if let Some(element) = stack.pop() {
                    close_element(&mut stack, &mut root, element);
                }
            }
            Ok((_, Event::Text(text))) => {
                let text = text
                    .unescape()
                    .map_err(|e| Error::Parse(format!("invalid xml: {e}")))?;
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text);
                }
            }
            Ok((_, Event::CData(data))) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
        }
    }
    root.ok_or_else(|| Error::Parse("empty xml document".into()))
}

fn open_element(ns: &ResolveResult, start: &BytesStart) -> Result<Element> {
    let ns = match ns {
        ResolveResult::Bound(uri) => String::from_utf8_lossy(uri.0).into_owned(),
        _ => String::new(),
    };
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Parse(format!("invalid xml: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Parse(format!("invalid xml: {e}")))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        ns,
        name,
        attrs,
        text: String::new(),
        children: Vec::new(),
    })
}

fn close_element(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Collect the `CodeLists` section into per-concept dictionaries.
pub fn parse_code_lists(root: &Element) -> Result<HashMap<String, CodeList>> {
    let section = root
        .find("message:CodeLists")
        .ok_or_else(|| Error::Parse("response has no CodeLists section".into()))?;
    let mut codes = HashMap::new();
    for item in section.find_all("structure:CodeList") {
        let concept = attr_at(item, "id", &[], "").to_string();
        let values = item
            .find_all("structure:Code")
            .map(|code| {
                (
                    attr_at(code, "value", &[], "").to_string(),
                    text_at(code, &["structure:Description"], "").to_string(),
                )
            })
            .collect();
        codes.insert(
            concept,
            CodeList {
                name: text_at(item, &["structure:Name"], "").to_string(),
                values,
            },
        );
    }
    Ok(codes)
}

/// Flatten the `DataSet` section into records, resolving every coded
/// dimension through `codes`.
///
/// A document without a `DataSet` yields an empty vec; empty datasets
/// are legitimate. A series whose coding cannot be resolved is dropped
/// with a warning and the scan continues.
pub fn parse_data_set(root: &Element, codes: &HashMap<String, CodeList>) -> Vec<DataRecord> {
    let Some(dataset) = root.find("message:DataSet") else {
        return Vec::new();
    };
    let mut records = Vec::new();
    for series in dataset.find_all("generic:Series") {
        // unit and period; a series without an Attributes node keeps both
        // empty
        let mut unit = String::new();
        let mut period = String::new();
        if let Some(attributes) = series.find("generic:Attributes") {
            for value in attributes.find_all("generic:Value") {
                match attr_at(value, "concept", &[], "") {
                    "EI" => unit = attr_at(value, "value", &[], "").to_string(),
                    "PERIOD" => period = attr_at(value, "value", &[], "").to_string(),
                    _ => {}
                }
            }
        }

        let year = text_at(series, &["generic:Obs", "generic:Time"], "0")
            .parse::<i32>()
            .unwrap_or(0);
        let value = parse_decimal(attr_at(
            series,
            "value",
            &["generic:Obs", "generic:ObsValue"],
            "0.0",
        ));

        // A series with unresolvable coding is skipped; a series with no
        // SeriesKey at all aborts the remaining scan instead. The second
        // behavior is kept as the portal client has always worked.
        // TODO: confirm with upstream whether a missing SeriesKey should
        // skip the one series like an unknown code does.
        let Some(series_key) = series.find("generic:SeriesKey") else {
            log::error!("series without SeriesKey, aborting dataset scan");
            break;
        };
        let mut dimensions = BTreeMap::new();
        let mut resolved = true;
        for key in series_key.find_all("generic:Value") {
            let concept = attr_at(key, "concept", &[], "");
            let code = attr_at(key, "value", &[], "");
            match codes.get(concept).and_then(|list| {
                list.values
                    .get(code)
                    .map(|description| (list.name.clone(), description.clone()))
            }) {
                Some((label, description)) => {
                    dimensions.insert(label, description);
                }
                None => {
                    log::warn!(
                        "series dropped: no code list entry for concept `{concept}` code `{code}`"
                    );
                    resolved = false;
                    break;
                }
            }
        }
        if !resolved {
            continue;
        }

        records.push(DataRecord {
            dimensions,
            value,
            period,
            unit,
            year,
        });
    }
    records
}

/// Portal numbers use decimal commas and spaces (plain or no-break) as
/// group separators. Anything unparseable is 0.0.
fn parse_decimal(raw: &str) -> f64 {
    raw.replace(',', ".")
        .replace([' ', '\u{a0}'], "")
        .parse()
        .unwrap_or(0.0)
}
