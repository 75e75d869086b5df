//! Synchronous client for the EMISS (fedstat.ru) statistics portal.
//!
//! Two endpoints matter: the indicator page (facet discovery) and the
//! `data.do` form POST (the SDMX dataset). All parsing lives in
//! [`crate::config`] and [`crate::sdmx`]; this module only moves bytes.
//!
//! ### Notes
//! - The portal mis-declares its response charset, so bodies are always
//!   force-decoded as UTF-8 regardless of headers.
//! - Large selections can take the portal minutes to answer; the total
//!   request timeout is sized accordingly.
//! - Transient statuses (5xx, 429) are retried a bounded number of times
//!   with a fixed backoff schedule.

use crate::config;
use crate::error::{Error, Result};
use crate::models::{DataRecord, Facet};
use crate::query;
use crate::sdmx;
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(180)) // the portal is slow on large selections
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("fedstat_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client build");
        Self {
            base_url: "https://www.fedstat.ru".into(),
            http,
        }
    }
}

impl Client {
    /// Discover the facets of an indicator from its configuration page.
    ///
    /// ### Example
    /// ```no_run
    /// # use fedstat_rs::Client;
    /// let client = Client::default();
    /// let facets = client.fetch_facets(57796)?;
    /// # Ok::<(), fedstat_rs::Error>(())
    /// ```
    pub fn fetch_facets(&self, indicator_id: i64) -> Result<Vec<Facet>> {
        let url = format!("{}/indicator/{}", self.base_url, indicator_id);
        let html = self.send_with_retry(|| self.http.get(&url).send())?;
        config::parse_indicator_page(&html)
    }

    /// Fetch the dataset for the checked facet values and decode it into
    /// flat records.
    ///
    /// The facet list is consumed as-is: toggle `checked` flags before
    /// calling to narrow or widen the selection.
    pub fn fetch_records(&self, indicator_id: i64, facets: &[Facet]) -> Result<Vec<DataRecord>> {
        let params = query::build_request(indicator_id, facets)?;
        let url = format!("{}/indicator/data.do?format=sdmx", self.base_url);
        let xml = self.send_with_retry(|| self.http.post(&url).form(&params).send())?;
        let root = sdmx::parse_document(&xml)?;
        let codes = sdmx::parse_code_lists(&root)?;
        Ok(sdmx::parse_data_set(&root, &codes))
    }

    /// Bounded retry on transient failures (5xx / 429 / transport
    /// errors); anything else fails fast. The body is force-decoded as
    /// UTF-8 because the portal mis-declares its charset.
    fn send_with_retry(
        &self,
        send: impl Fn() -> reqwest::Result<reqwest::blocking::Response>,
    ) -> Result<String> {
        let mut last_err: Option<Error> = None;
        for backoff_ms in [100u64, 300, 700] {
            match send() {
                Ok(r) if r.status().is_success() => {
                    let bytes = r.bytes().map_err(Error::Network)?;
                    return Ok(String::from_utf8_lossy(&bytes).into_owned());
                }
                Ok(r)
                    if r.status().is_server_error()
                        || r.status() == StatusCode::TOO_MANY_REQUESTS =>
                {
                    last_err = Some(Error::Http(r.status()));
                }
                Ok(r) => return Err(Error::Http(r.status())),
                Err(e) => last_err = Some(Error::Network(e)),
            }
            std::thread::sleep(Duration::from_millis(backoff_ms));
        }
        Err(last_err.unwrap_or_else(|| Error::Http(StatusCode::SERVICE_UNAVAILABLE)))
    }
}
