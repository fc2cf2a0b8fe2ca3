//! Watchlist search against sanctions, PEP and criminal-record databases.

use serde::{Deserialize, Serialize};

use crate::config::{require_api_key, ClientOptions, DecodeMode, CLIENT_ID};
use crate::endpoint::{Endpoint, Region};
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, HttpResponse};
use crate::response::{normalize, RemoteError};
use crate::transport::{Transport, UreqTransport};

pub const WATCHLIST_PATH: &str = "aml";

/// Restrict matches to one kind of entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityFilter {
    #[default]
    Any,
    Person,
    LegalEntity,
}

impl EntityFilter {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "" => Ok(EntityFilter::Any),
            "person" => Ok(EntityFilter::Person),
            "legalentity" => Ok(EntityFilter::LegalEntity),
            _ => Err(ApiError::validation(
                r#"entity type should be either empty, "person" or "legalentity""#,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityFilter::Any => "",
            EntityFilter::Person => "person",
            EntityFilter::LegalEntity => "legalentity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchlistConfig {
    /// Comma-separated source database codes; empty searches all of them.
    pub database: String,
    pub entity: EntityFilter,
    pub decode_mode: DecodeMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistResponse {
    pub error: Option<RemoteError>,
    pub items: Vec<WatchlistEntry>,
}

/// One matched entity. List-valued because sources disagree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistEntry {
    pub entity: Option<String>,
    pub fullname: Vec<String>,
    pub firstname: Vec<String>,
    pub middlename: Vec<String>,
    pub lastname: Vec<String>,
    pub alias: Vec<String>,
    pub dob: Vec<String>,
    pub address: Vec<String>,
    pub nationality: Vec<String>,
    pub birthplace: Vec<String>,
    pub gender: Vec<String>,
    pub documentnumber: Vec<WatchlistDocument>,
    pub program: Vec<String>,
    pub note: Vec<String>,
    pub status: Vec<String>,
    pub time: Option<String>,
    pub source: Vec<String>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistDocument {
    pub id: Option<String>,
    pub id_formatted: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    apikey: &'a str,
    database: &'a str,
    entity: &'a str,
    client: &'a str,
    name: &'a str,
    documentnumber: &'a str,
    country: &'a str,
    dob: &'a str,
}

/// Client for the watchlist endpoint.
#[derive(Debug, Clone)]
pub struct WatchlistApi<T = UreqTransport> {
    api_key: String,
    endpoint: Endpoint,
    config: WatchlistConfig,
    transport: T,
}

impl WatchlistApi<UreqTransport> {
    pub fn new(api_key: &str, region: impl Into<Region>) -> ApiResult<Self> {
        Self::with_transport(api_key, region, UreqTransport::new())
    }

    pub fn from_options(options: &ClientOptions) -> ApiResult<Self> {
        Self::new(&options.api_key, options.region.clone())
    }
}

impl<T: Transport> WatchlistApi<T> {
    pub fn with_transport(api_key: &str, region: impl Into<Region>, transport: T) -> ApiResult<Self> {
        require_api_key(api_key)?;
        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: Endpoint::new(&region.into(), WATCHLIST_PATH),
            config: WatchlistConfig::default(),
            transport,
        })
    }

    pub fn config(&self) -> &WatchlistConfig {
        &self.config
    }

    pub fn reset_config(&mut self) {
        self.config = WatchlistConfig::default();
    }

    /// Comma-separated database codes, e.g. `un_sc,us_ofac`.
    pub fn set_aml_database(&mut self, databases: &str) {
        self.config.database = databases.to_string();
    }

    /// `""` (both), `"person"` or `"legalentity"`.
    pub fn set_entity_type(&mut self, entity_type: &str) -> ApiResult<()> {
        self.config.entity = EntityFilter::parse(entity_type)?;
        Ok(())
    }

    pub fn set_decode_mode(&mut self, mode: DecodeMode) {
        self.config.decode_mode = mode;
    }

    pub fn build_search_by_name(&self, name: &str, country: &str, dob: &str) -> ApiResult<HttpRequest> {
        self.build_search(name, "", country, dob)
    }

    pub fn build_search_by_id_number(
        &self,
        document_number: &str,
        country: &str,
        dob: &str,
    ) -> ApiResult<HttpRequest> {
        self.build_search("", document_number, country, dob)
    }

    fn build_search(
        &self,
        name: &str,
        document_number: &str,
        country: &str,
        dob: &str,
    ) -> ApiResult<HttpRequest> {
        let payload = SearchRequest {
            apikey: &self.api_key,
            database: &self.config.database,
            entity: self.config.entity.as_str(),
            client: CLIENT_ID,
            name,
            documentnumber: document_number,
            country,
            dob,
        };
        HttpRequest::post_json(self.endpoint.url().to_string(), &payload)
    }

    pub fn parse_search(&self, response: HttpResponse) -> ApiResult<WatchlistResponse> {
        normalize(response, self.config.decode_mode)
    }

    /// Search by a person's or company's name or alias.
    pub fn search_by_name(&self, name: &str, country: &str, dob: &str) -> ApiResult<WatchlistResponse> {
        let request = self.build_search_by_name(name, country, dob)?;
        self.parse_search(self.transport.execute(&request)?)
    }

    /// Search by passport, ID card or other document number.
    pub fn search_by_id_number(
        &self,
        document_number: &str,
        country: &str,
        dob: &str,
    ) -> ApiResult<WatchlistResponse> {
        let request = self.build_search_by_id_number(document_number, country, dob)?;
        self.parse_search(self.transport.execute(&request)?)
    }
}
