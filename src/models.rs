use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Pivot role a facet plays in a data query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Filter,
    Line,
    Column,
    Group,
}

/// One selectable value of a facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    pub id: i64,
    pub title: String,
    /// Display ordering only; has no effect on queries.
    pub order: i64,
    /// The sole selection signal. Defaults come from the server.
    pub checked: bool,
}

/// One selectable dimension of an indicator (region, unit of measurement, …
/// the portal calls these filters).
///
/// Exactly one facet per indicator has `id == 0`: it carries the
/// indicator's own title and is always on the [`Axis::Filter`] axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub id: i64,
    pub title: String,
    pub axis: Axis,
    pub values: Vec<FacetValue>,
}

impl Facet {
    /// Whether the facet is worth presenting to a human. Single-value
    /// facets are implicitly included in every query with the
    /// server-supplied checked state.
    pub fn is_selectable(&self) -> bool {
        self.values.len() > 1
    }
}

/// Server-declared default axis membership, as found on the indicator
/// page. [`Axis::Column`] is the fallback and has no explicit id set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisDefaults {
    pub line: HashSet<i64>,
    pub group: HashSet<i64>,
    pub filter: HashSet<i64>,
}

/// Classify a facet id against the server defaults.
///
/// The facet with id 0 is the indicator title and always a filter. After
/// that, membership is checked in the order line, group, filter; anything
/// unlisted lands on the column axis.
pub fn classify_axis(id: i64, defaults: &AxisDefaults) -> Axis {
    if id == 0 {
        return Axis::Filter;
    }
    if defaults.line.contains(&id) {
        return Axis::Line;
    }
    if defaults.group.contains(&id) {
        return Axis::Group;
    }
    if defaults.filter.contains(&id) {
        return Axis::Filter;
    }
    Axis::Column
}

/// Dictionary translating one coded dimension into readable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeList {
    /// Display label of the dimension.
    pub name: String,
    /// Opaque code -> human-readable description.
    pub values: HashMap<String, String>,
}

/// One decoded observation (one row = one SDMX Series).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Resolved dimension label -> description pairs.
    #[serde(flatten)]
    pub dimensions: BTreeMap<String, String>,
    pub value: f64,
    pub period: String,
    /// Unit of measurement; the portal calls this field "ei".
    #[serde(rename = "ei")]
    pub unit: String,
    pub year: i32,
}
