//! Facet discovery from an indicator's configuration page.
//!
//! The portal renders every indicator page with one inline script that
//! sets up the data grid. That script carries two object literals this
//! module cares about: the filter definitions (`filters:`) and the
//! default axis assignment (`left_columns:` through the grid init call).

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::jslit::{self, Value};
use crate::models::{AxisDefaults, Facet, FacetValue, classify_axis};

/// Script body marker identifying the grid-initialization block.
const GRID_MARKER: &str = "new FGrid";
const FILTERS_MARKER: &str = "filters:";
const LEFT_COLUMNS_MARKER: &str = "left_columns:";
const GRID_INIT_MARKER: &str = "grid.init()";

/// Extract the facet list from an indicator page.
///
/// Pure text transformation; [`crate::Client::fetch_facets`] pairs it
/// with the HTTP fetch.
pub fn parse_indicator_page(html: &str) -> Result<Vec<Facet>> {
    let script = find_grid_script(html)?;
    let filters = extract_filters(script)?;
    let defaults = extract_axis_defaults(script)?;
    build_facets(&filters, &defaults)
}

/// Locate the single script block containing the grid-init marker.
fn find_grid_script(html: &str) -> Result<&str> {
    let mut hits = script_bodies(html)
        .into_iter()
        .filter(|body| body.contains(GRID_MARKER));
    let script = hits.next().ok_or_else(|| {
        Error::Parse("page layout changed: no grid initialization script found".into())
    })?;
    if hits.next().is_some() {
        return Err(Error::Parse(
            "page layout changed: multiple grid initialization scripts".into(),
        ));
    }
    Ok(script)
}

/// All `<script>` bodies, in document order. Tag matching is
/// ASCII-case-insensitive; lowercasing preserves byte offsets.
fn script_bodies(html: &str) -> Vec<&str> {
    let lower = html.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(open_rel) = lower[from..].find("<script") {
        let open = from + open_rel;
        let Some(gt_rel) = lower[open..].find('>') else {
            break;
        };
        let body_start = open + gt_rel + 1;
        let Some(close_rel) = lower[body_start..].find("</script") else {
            break;
        };
        out.push(&html[body_start..body_start + close_rel]);
        from = body_start + close_rel;
    }
    out
}

/// Slice of `script` from the `start` marker up to (excluding) the `end`
/// marker.
fn fragment<'a>(script: &'a str, start: &str, end: &str) -> Result<&'a str> {
    let s = script
        .find(start)
        .ok_or_else(|| Error::Parse(format!("marker `{start}` not found in grid script")))?;
    let e = script[s..]
        .find(end)
        .map(|rel| s + rel)
        .ok_or_else(|| Error::Parse(format!("marker `{end}` not found in grid script")))?;
    Ok(&script[s..e])
}

fn extract_filters(script: &str) -> Result<Value> {
    let frag = fragment(script, FILTERS_MARKER, LEFT_COLUMNS_MARKER)?;
    jslit::parse_object(frag).map_err(|e| Error::Parse(format!("malformed filters literal: {e}")))
}

fn extract_axis_defaults(script: &str) -> Result<AxisDefaults> {
    let frag = fragment(script, LEFT_COLUMNS_MARKER, GRID_INIT_MARKER)?;
    // the fragment is a run of `key: value` pairs mid-object; wrap it so
    // it parses as one literal
    let wrapped = format!("{{{frag}");
    let v = jslit::parse_object(&wrapped)
        .map_err(|e| Error::Parse(format!("malformed grid defaults literal: {e}")))?;
    Ok(AxisDefaults {
        line: id_set(&v, "left_columns")?,
        group: id_set(&v, "groups")?,
        filter: id_set(&v, "filterObjectIds")?,
    })
}

fn id_set(defaults: &Value, key: &str) -> Result<HashSet<i64>> {
    let items = defaults
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Parse(format!("grid defaults missing `{key}` list")))?;
    Ok(items.iter().filter_map(Value::as_i64).collect())
}

fn build_facets(filters: &Value, defaults: &AxisDefaults) -> Result<Vec<Facet>> {
    let mut out = Vec::new();
    for (key, body) in filters.entries() {
        let id = key
            .parse::<i64>()
            .map_err(|_| Error::Parse(format!("facet id `{key}` is not an integer")))?;
        let title = body
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Parse(format!("facet {id} has no title")))?
            .to_string();
        out.push(Facet {
            id,
            title,
            axis: classify_axis(id, defaults),
            values: parse_values(id, body.get("values"))?,
        });
    }
    Ok(out)
}

fn parse_values(facet_id: i64, values: Option<&Value>) -> Result<Vec<FacetValue>> {
    let entries = match values {
        Some(v @ Value::Object(_)) => v.entries(),
        _ => {
            return Err(Error::Parse(format!("facet {facet_id} has no values map")));
        }
    };
    let mut out = Vec::new();
    for (key, body) in entries {
        let id = key.parse::<i64>().map_err(|_| {
            Error::Parse(format!("facet {facet_id}: value id `{key}` is not an integer"))
        })?;
        let title = body
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Parse(format!("facet {facet_id}: value {id} has no title")))?
            .to_string();
        let order = body.get("order").and_then(Value::as_i64).ok_or_else(|| {
            Error::Parse(format!("facet {facet_id}: value {id} has no order"))
        })?;
        let checked = body.get("checked").and_then(Value::as_bool).ok_or_else(|| {
            Error::Parse(format!("facet {facet_id}: value {id} has no checked flag"))
        })?;
        out.push(FacetValue {
            id,
            title,
            order,
            checked,
        });
    }
    Ok(out)
}
