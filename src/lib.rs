//! fedstat-rs
//!
//! A lightweight Rust library for discovering indicator facets and
//! retrieving data from the EMISS (fedstat.ru) statistics portal. Pairs
//! with the `fedstat` CLI.
//!
//! ### Features
//! - Discover an indicator's selectable facets from its configuration page
//! - Toggle facet values and build the portal's repeated-key form payload
//! - Decode the SDMX v1.0 response into flat, code-resolved records
//! - Save as CSV or JSON in a tidy, analysis-friendly schema
//!
//! ### Example
//! ```no_run
//! use fedstat_rs::Client;
//!
//! let client = Client::default();
//! let mut facets = client.fetch_facets(57796)?;
//! // keep the server defaults, or toggle `checked` to narrow the query
//! for facet in facets.iter_mut().filter(|f| f.is_selectable()) {
//!     for value in &mut facet.values {
//!         value.checked = true;
//!     }
//! }
//! let records = client.fetch_records(57796, &facets)?;
//! fedstat_rs::storage::save_csv(&records, "result.csv")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod jslit;
pub mod models;
pub mod query;
pub mod sdmx;
pub mod storage;

pub use api::Client;
pub use error::{Error, Result};
pub use models::{Axis, CodeList, DataRecord, Facet, FacetValue};
