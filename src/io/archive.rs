use crate::types::{FciError, FciResult, ProcessingLevel};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

/// Fixed time format used by all archive-facing interfaces
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const TOKEN_URL: &str = "https://api.eumetsat.int/token";
const BROWSE_URL: &str = "https://api.eumetsat.int/data/browse/collections";
const SEARCH_URL: &str = "https://api.eumetsat.int/data/search-products/os";

/// Products fetched per search page
const SEARCH_PAGE_SIZE: usize = 100;

/// Parse an archive time string ("YYYY-MM-DDTHH:MM:SS", local time).
pub fn parse_time(s: &str) -> FciResult<NaiveDateTime> {
    Ok(NaiveDateTime::parse_from_str(s, TIME_FORMAT)?)
}

/// One remote archive product: a timestamped entry list plus streaming access
/// to individual entries. Implementations are shared read-only across the
/// download workers.
pub trait RemoteProduct: Send + Sync {
    /// Archive-assigned product identifier
    fn id(&self) -> &str;

    /// File entry names contained in this product
    fn entries(&self) -> &[String];

    /// Open a streaming read on one entry.
    fn open_entry(&self, entry: &str) -> FciResult<Box<dyn Read + Send>>;
}

/// One archive collection: a named, typed grouping of products searchable by
/// sensing time window.
pub trait Collection {
    /// Archive-assigned collection identifier, eg "EO:EUM:DAT:0662"
    fn id(&self) -> &str;

    /// Product type string, eg "MTGFCIL1FD"; "L2" in the type marks a
    /// derived product collection.
    fn product_type(&self) -> &str;

    fn level(&self) -> ProcessingLevel {
        ProcessingLevel::from_product_type(self.product_type())
    }

    /// Products with sensing time inside [start, end], newest first.
    fn search(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> FciResult<Vec<Arc<dyn RemoteProduct>>>;
}

/// Archive credential pair, read from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    /// Read EUMDAC_KEY / EUMDAC_SECRET.
    pub fn from_env() -> FciResult<Self> {
        let key = std::env::var("EUMDAC_KEY")
            .map_err(|_| FciError::Archive("EUMDAC_KEY is not set".to_string()))?;
        let secret = std::env::var("EUMDAC_SECRET")
            .map_err(|_| FciError::Archive("EUMDAC_SECRET is not set".to_string()))?;
        Ok(Self { key, secret })
    }
}

/// Blocking client for the EUMETSAT Data Store REST API: token authentication,
/// collection metadata, OpenSearch product queries and entry streaming.
pub struct DataStore {
    client: reqwest::blocking::Client,
    token: Arc<String>,
}

impl DataStore {
    /// Authenticate against the token endpoint with the given credential pair.
    pub fn new(credentials: &Credentials) -> FciResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()?;

        log::debug!("Requesting access token from {}", TOKEN_URL);
        let response = client
            .post(TOKEN_URL)
            .basic_auth(&credentials.key, Some(&credentials.secret))
            .form(&[("grant_type", "client_credentials")])
            .send()?;

        if !response.status().is_success() {
            return Err(FciError::Archive(format!(
                "token request failed: {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json()?;
        let token = body
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                FciError::InvalidFormat("token response carries no access_token".to_string())
            })?
            .to_string();

        log::info!("Data Store access token obtained");
        Ok(Self { client, token: Arc::new(token) })
    }

    /// Look up a collection and its product type.
    pub fn collection(&self, collection_id: &str) -> FciResult<DataStoreCollection> {
        let url = format!("{}/{}", BROWSE_URL, collection_id);
        log::debug!("Fetching collection metadata: {}", url);

        let response = self.client.get(&url).query(&[("format", "json")]).send()?;
        if !response.status().is_success() {
            return Err(FciError::Archive(format!(
                "collection lookup for '{}' failed: {}",
                collection_id,
                response.status()
            )));
        }

        let body: serde_json::Value = response.json()?;
        let product_type = body
            .pointer("/collection/properties/productInformation/productType")
            .or_else(|| body.pointer("/collection/properties/title"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                FciError::InvalidFormat(format!(
                    "collection '{}' metadata carries no product type",
                    collection_id
                ))
            })?
            .to_string();

        Ok(DataStoreCollection {
            client: self.client.clone(),
            token: self.token.clone(),
            id: collection_id.to_string(),
            product_type,
        })
    }
}

/// One Data Store collection bound to an authenticated client
pub struct DataStoreCollection {
    client: reqwest::blocking::Client,
    token: Arc<String>,
    id: String,
    product_type: String,
}

impl Collection for DataStoreCollection {
    fn id(&self) -> &str {
        &self.id
    }

    fn product_type(&self) -> &str {
        &self.product_type
    }

    fn search(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> FciResult<Vec<Arc<dyn RemoteProduct>>> {
        let mut products: Vec<Arc<dyn RemoteProduct>> = Vec::new();
        let mut start_index = 0usize;

        loop {
            log::debug!(
                "Searching {} products {}..{} (offset {})",
                self.id,
                start,
                end,
                start_index
            );
            let params = [
                ("format", "json".to_string()),
                ("pi", self.id.clone()),
                ("dtstart", start.format(TIME_FORMAT).to_string()),
                ("dtend", end.format(TIME_FORMAT).to_string()),
                ("si", start_index.to_string()),
                ("c", SEARCH_PAGE_SIZE.to_string()),
            ];
            let response = self.client.get(SEARCH_URL).query(&params).send()?;

            if !response.status().is_success() {
                return Err(FciError::Archive(format!(
                    "product search on '{}' failed: {}",
                    self.id,
                    response.status()
                )));
            }

            let body: serde_json::Value = response.json()?;
            let features = match body.get("features").and_then(|f| f.as_array()) {
                Some(features) if !features.is_empty() => features,
                _ => break,
            };

            for feature in features {
                let (id, entry_links) = parse_feature(feature)?;
                products.push(Arc::new(DataStoreProduct {
                    client: self.client.clone(),
                    token: self.token.clone(),
                    entries: entry_links.iter().map(|(name, _)| name.clone()).collect(),
                    hrefs: entry_links.into_iter().collect(),
                    id,
                }));
            }

            let total = body
                .pointer("/properties/totalResults")
                .and_then(|t| t.as_u64())
                .unwrap_or(0) as usize;
            start_index += SEARCH_PAGE_SIZE;
            if products.len() >= total || start_index >= total {
                break;
            }
        }

        Ok(products)
    }
}

/// Extract product id and (entry name, download href) pairs from one
/// OpenSearch feature.
fn parse_feature(feature: &serde_json::Value) -> FciResult<(String, Vec<(String, String)>)> {
    let id = feature
        .pointer("/properties/identifier")
        .or_else(|| feature.get("id"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| FciError::InvalidFormat("search feature carries no identifier".to_string()))?
        .to_string();

    let mut entries = Vec::new();
    if let Some(links) = feature
        .pointer("/properties/links/sip-entries")
        .and_then(|l| l.as_array())
    {
        for link in links {
            let name = link.get("title").and_then(|t| t.as_str());
            let href = link.get("href").and_then(|h| h.as_str());
            if let (Some(name), Some(href)) = (name, href) {
                entries.push((name.to_string(), href.to_string()));
            }
        }
    }

    Ok((id, entries))
}

/// One remote product as returned by the OpenSearch endpoint
pub struct DataStoreProduct {
    client: reqwest::blocking::Client,
    token: Arc<String>,
    id: String,
    entries: Vec<String>,
    hrefs: HashMap<String, String>,
}

impl RemoteProduct for DataStoreProduct {
    fn id(&self) -> &str {
        &self.id
    }

    fn entries(&self) -> &[String] {
        &self.entries
    }

    fn open_entry(&self, entry: &str) -> FciResult<Box<dyn Read + Send>> {
        let href = self.hrefs.get(entry).ok_or_else(|| {
            FciError::Archive(format!("product {} has no entry '{}'", self.id, entry))
        })?;

        let response = self
            .client
            .get(href)
            .bearer_auth(self.token.as_str())
            .send()?;

        if !response.status().is_success() {
            return Err(FciError::Archive(format!(
                "opening entry '{}' of product {} failed: {}",
                entry,
                self.id,
                response.status()
            )));
        }
        Ok(Box::new(response))
    }
}
