//! Form payload construction for the data endpoint.
//!
//! The portal accepts repeated form keys, so the payload is an ordered
//! list of pairs rather than a map. Building it is pure data work and
//! needs no I/O.

use crate::error::{Error, Result};
use crate::models::{Axis, Facet};

/// Build the form pairs for a data request.
///
/// Emits `id` and `title` first, then per checked value one
/// `selectedFilterIds` pair plus one axis-keyed pair carrying the facet
/// id. A facet with three checked values therefore produces three
/// identical axis pairs; the portal expects that duplication.
pub fn build_request(indicator_id: i64, facets: &[Facet]) -> Result<Vec<(String, String)>> {
    // facet 0 carries the indicator's own title as its value 0
    let title = facets
        .iter()
        .find(|f| f.id == 0)
        .and_then(|f| f.values.iter().find(|v| v.id == 0))
        .map(|v| v.title.clone())
        .ok_or_else(|| {
            Error::Contract("no facet with id 0 carrying the indicator title".into())
        })?;

    let mut params = vec![
        ("id".to_string(), indicator_id.to_string()),
        ("title".to_string(), title),
    ];
    for facet in facets {
        let axis_key = match facet.axis {
            Axis::Filter => "filterObjectIds",
            Axis::Line => "lineObjectIds",
            Axis::Column => "columnObjectIds",
            Axis::Group => "groupObjectIds",
        };
        for value in facet.values.iter().filter(|v| v.checked) {
            params.push((
                "selectedFilterIds".to_string(),
                format!("{}_{}", facet.id, value.id),
            ));
            params.push((axis_key.to_string(), facet.id.to_string()));
        }
    }
    Ok(params)
}
