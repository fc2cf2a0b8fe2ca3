//! Vault: the service-side store of verified identities and their images.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{require_api_key, ClientOptions, DecodeMode, CLIENT_ID};
use crate::endpoint::{Endpoint, Region};
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, HttpResponse};
use crate::media::{resolve, MediaArgument};
use crate::response::{normalize, RemoteError};
use crate::transport::{Transport, UreqTransport};

pub const VAULT_PATH: &str = "vault";

/// Most filter statements a list query may carry.
pub const MAX_LIST_FILTERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VaultConfig {
    pub decode_mode: DecodeMode,
}

/// A vault entry. Kept as a JSON object so fields the service adds survive
/// a get/update round-trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultRecord(Map<String, Value>);

impl VaultRecord {
    pub fn new(id: &str) -> Self {
        let mut record = Self::default();
        record.set("id", id);
        record
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Images attached to the entry; malformed entries are skipped.
    pub fn images(&self) -> Vec<VaultImage> {
        self.0
            .get("image")
            .and_then(Value::as_array)
            .map(|images| {
                images
                    .iter()
                    .filter_map(|image| serde_json::from_value(image.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for VaultRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultImage {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub hash: Option<String>,
    pub url: Option<String>,
    pub createtime: Option<String>,
}

/// What an added image shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultImageKind {
    Document = 0,
    Person = 1,
}

/// Filtering, sorting and paging for [`VaultApi::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    /// Statements such as `createtime>=2024/01/01`, at most five.
    pub filter: Vec<String>,
    pub orderby: String,
    pub sort: String,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultItemResponse {
    pub error: Option<RemoteError>,
    #[serde(deserialize_with = "flag")]
    pub success: Option<bool>,
    pub data: Option<VaultRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultListResponse {
    pub error: Option<RemoteError>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub nextoffset: Option<u32>,
    pub total: Option<u32>,
    pub items: Vec<VaultRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSuccessResponse {
    pub error: Option<RemoteError>,
    #[serde(deserialize_with = "flag")]
    pub success: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultImageResponse {
    pub error: Option<RemoteError>,
    #[serde(deserialize_with = "flag")]
    pub success: Option<bool>,
    pub image: Option<VaultImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultFaceSearchResponse {
    pub error: Option<RemoteError>,
    pub items: Vec<VaultRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingStatusResponse {
    pub error: Option<RemoteError>,
    pub status: Option<String>,
    #[serde(rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(rename = "statusChangeTime")]
    pub status_change_time: Option<String>,
    #[serde(rename = "lastSuccessTime")]
    pub last_success_time: Option<String>,
}

/// `success` arrives as a boolean from some actions and as 0/1 from others.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => Some(n.as_f64().is_some_and(|n| n != 0.0)),
        Some(Value::String(s)) => Some(s == "1" || s.eq_ignore_ascii_case("true")),
        _ => None,
    })
}

#[derive(Debug, Serialize)]
struct ItemRequest<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct AddImageRequest<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    imageurl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteImageRequest<'a> {
    id: &'a str,
    imageid: &'a str,
}

#[derive(Debug, Serialize)]
struct FaceSearchRequest {
    maxentry: u32,
    threshold: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    imageurl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

#[derive(Debug, Serialize)]
struct Empty {}

/// Client for the vault endpoint.
#[derive(Debug, Clone)]
pub struct VaultApi<T = UreqTransport> {
    api_key: String,
    endpoint: Endpoint,
    config: VaultConfig,
    transport: T,
}

impl VaultApi<UreqTransport> {
    pub fn new(api_key: &str, region: impl Into<Region>) -> ApiResult<Self> {
        Self::with_transport(api_key, region, UreqTransport::new())
    }

    pub fn from_options(options: &ClientOptions) -> ApiResult<Self> {
        Self::new(&options.api_key, options.region.clone())
    }
}

impl<T: Transport> VaultApi<T> {
    pub fn with_transport(api_key: &str, region: impl Into<Region>, transport: T) -> ApiResult<Self> {
        require_api_key(api_key)?;
        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: Endpoint::new(&region.into(), VAULT_PATH),
            config: VaultConfig::default(),
            transport,
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn reset_config(&mut self) {
        self.config = VaultConfig::default();
    }

    pub fn set_decode_mode(&mut self, mode: DecodeMode) {
        self.config.decode_mode = mode;
    }

    /// Every vault payload carries the credentials next to the action's own
    /// fields. They are inserted last so a record can never override them.
    fn build<P: Serialize>(&self, action: &str, payload: P) -> ApiResult<HttpRequest> {
        let mut body = match serde_json::to_value(payload)
            .map_err(|e| ApiError::Serialization(e.to_string()))?
        {
            Value::Object(map) => map,
            _ => {
                return Err(ApiError::Serialization(
                    "vault payload is not a JSON object".to_string(),
                ))
            }
        };
        body.insert("apikey".to_string(), Value::from(self.api_key.as_str()));
        body.insert("client".to_string(), Value::from(CLIENT_ID));
        HttpRequest::post_json(self.endpoint.action(action), &body)
    }

    fn call<R>(&self, request: HttpRequest) -> ApiResult<R>
    where
        R: serde::de::DeserializeOwned + Default,
    {
        debug!(url = %request.url, "vault request");
        self.parse(self.transport.execute(&request)?)
    }

    /// Decode any vault response.
    pub fn parse<R>(&self, response: HttpResponse) -> ApiResult<R>
    where
        R: serde::de::DeserializeOwned + Default,
    {
        normalize(response, self.config.decode_mode)
    }

    pub fn build_get(&self, id: &str) -> ApiResult<HttpRequest> {
        require_id(id)?;
        self.build("get", ItemRequest { id })
    }

    /// Fetch one entry.
    pub fn get(&self, id: &str) -> ApiResult<VaultItemResponse> {
        self.call(self.build_get(id)?)
    }

    pub fn build_list(&self, query: &ListQuery) -> ApiResult<HttpRequest> {
        if query.filter.len() > MAX_LIST_FILTERS {
            return Err(ApiError::validation(
                "filter should be an array containing maximum of 5 filter statements",
            ));
        }
        self.build("list", query)
    }

    /// List entries matching `query`.
    pub fn list(&self, query: &ListQuery) -> ApiResult<VaultListResponse> {
        self.call(self.build_list(query)?)
    }

    pub fn build_update(&self, record: &VaultRecord) -> ApiResult<HttpRequest> {
        require_id(record.id().unwrap_or_default())?;
        self.build("update", record)
    }

    /// Overwrite the fields present in `record` on the entry named by its `id`.
    pub fn update(&self, record: &VaultRecord) -> ApiResult<VaultSuccessResponse> {
        self.call(self.build_update(record)?)
    }

    pub fn build_delete(&self, id: &str) -> ApiResult<HttpRequest> {
        require_id(id)?;
        self.build("delete", ItemRequest { id })
    }

    pub fn delete(&self, id: &str) -> ApiResult<VaultSuccessResponse> {
        self.call(self.build_delete(id)?)
    }

    pub fn build_add_image(&self, id: &str, image: &str, kind: VaultImageKind) -> ApiResult<HttpRequest> {
        require_id(id)?;
        let (imageurl, image) = resolve(MediaArgument::VaultImage, image)?.into_pair();
        self.build(
            "addimage",
            AddImageRequest {
                id,
                kind: kind as u8,
                imageurl,
                image,
            },
        )
    }

    /// Attach a document or face image to an existing entry.
    pub fn add_image(&self, id: &str, image: &str, kind: VaultImageKind) -> ApiResult<VaultImageResponse> {
        self.call(self.build_add_image(id, image, kind)?)
    }

    pub fn build_delete_image(&self, id: &str, image_id: &str) -> ApiResult<HttpRequest> {
        require_id(id)?;
        if image_id.is_empty() {
            return Err(ApiError::validation("image ID required"));
        }
        self.build("deleteimage", DeleteImageRequest { id, imageid: image_id })
    }

    pub fn delete_image(&self, id: &str, image_id: &str) -> ApiResult<VaultSuccessResponse> {
        self.call(self.build_delete_image(id, image_id)?)
    }

    pub fn build_search_face(&self, image: &str, max_entry: u32, threshold: f32) -> ApiResult<HttpRequest> {
        let (imageurl, image) = resolve(MediaArgument::VaultImage, image)?.into_pair();
        self.build(
            "searchface",
            FaceSearchRequest {
                maxentry: max_entry,
                threshold,
                imageurl,
                image,
            },
        )
    }

    /// Find entries whose face matches `image`. Requires a trained vault.
    pub fn search_face(&self, image: &str, max_entry: u32, threshold: f32) -> ApiResult<VaultFaceSearchResponse> {
        self.call(self.build_search_face(image, max_entry, threshold)?)
    }

    pub fn build_train_face(&self) -> ApiResult<HttpRequest> {
        self.build("train", Empty {})
    }

    /// Start training the face index used by [`search_face`](Self::search_face).
    pub fn train_face(&self) -> ApiResult<VaultSuccessResponse> {
        self.call(self.build_train_face()?)
    }

    pub fn build_training_status(&self) -> ApiResult<HttpRequest> {
        self.build("trainstatus", Empty {})
    }

    pub fn training_status(&self) -> ApiResult<TrainingStatusResponse> {
        self.call(self.build_training_status()?)
    }
}

fn require_id(id: &str) -> ApiResult<()> {
    if id.is_empty() {
        Err(ApiError::validation("vault entry ID required"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::testing::RecordingTransport;

    fn api(reply: &str) -> VaultApi<RecordingTransport> {
        VaultApi::with_transport("key", "US", RecordingTransport::replying(reply)).unwrap()
    }

    #[test]
    fn get_stamps_credentials() {
        let api = api(r#"{"success":true,"data":{"id":"v1","firstName":"ANN","custom":"x"}}"#);
        let resp = api.get("v1").unwrap();
        let record = resp.data.unwrap();
        assert_eq!(record.id(), Some("v1"));
        assert_eq!(record.get_str("custom"), Some("x"));

        let req = api.transport.last();
        assert_eq!(req.url, "https://api.example.com/vault/get");
        assert_eq!(req.json(), json!({"id":"v1","apikey":"key","client":"rust-sdk"}));
    }

    #[test]
    fn missing_ids_make_no_call() {
        let api = api("{}");
        assert_eq!(api.get("").unwrap_err().to_string(), "vault entry ID required");
        assert!(api.delete("").is_err());
        assert!(api.update(&VaultRecord::default()).is_err());
        assert_eq!(
            api.delete_image("v1", "").unwrap_err().to_string(),
            "image ID required"
        );
        assert_eq!(api.transport.calls(), 0);
    }

    #[test]
    fn list_limits_filters() {
        let api = api(r#"{"total":0,"items":[]}"#);
        let query = ListQuery {
            filter: vec!["a=1".into(); 6],
            ..Default::default()
        };
        let err = api.list(&query).unwrap_err();
        assert_eq!(
            err.to_string(),
            "filter should be an array containing maximum of 5 filter statements"
        );
        assert_eq!(api.transport.calls(), 0);

        let query = ListQuery {
            filter: vec!["firstName=ANN".into()],
            orderby: "createtime".into(),
            sort: "DESC".into(),
            limit: 10,
            offset: 20,
        };
        let resp = api.list(&query).unwrap();
        assert_eq!(resp.total, Some(0));
        let body = api.transport.last().json();
        assert_eq!(body["filter"], json!(["firstName=ANN"]));
        assert_eq!(body["orderby"], "createtime");
        assert_eq!(body["limit"], 10);
        assert_eq!(body["offset"], 20);
    }

    #[test]
    fn update_preserves_unknown_keys() {
        let api = api(r#"{"success":1}"#);
        let mut record: VaultRecord =
            serde_json::from_str(r#"{"id":"v1","trustlevel":"1","futureField":{"a":[1]}}"#).unwrap();
        record.set("customdata1", "vip");
        let resp = api.update(&record).unwrap();
        assert_eq!(resp.success, Some(true));

        let body = api.transport.last().json();
        assert_eq!(body["futureField"], json!({"a":[1]}));
        assert_eq!(body["customdata1"], "vip");
        assert_eq!(body["apikey"], "key");
    }

    #[test]
    fn record_cannot_override_credentials() {
        let api = api(r#"{"success":true}"#);
        let mut record = VaultRecord::new("v1");
        record.set("apikey", "other-key");
        record.set("client", "other-client");
        api.update(&record).unwrap();

        let req = api.transport.last();
        assert_eq!(req.body.matches("\"apikey\"").count(), 1);
        assert_eq!(req.body.matches("\"client\"").count(), 1);
        let body = req.json();
        assert_eq!(body["apikey"], "key");
        assert_eq!(body["client"], "rust-sdk");
        assert_eq!(body["id"], "v1");
    }

    #[test]
    fn add_image_uses_media_pair() {
        let api = api(r#"{"success":1,"image":{"id":"img1","type":"1"}}"#);
        let resp = api
            .add_image("v1", "https://img.example.com/face.jpg", VaultImageKind::Person)
            .unwrap();
        assert_eq!(resp.image.unwrap().id.as_deref(), Some("img1"));
        let body = api.transport.last().json();
        assert_eq!(body["imageurl"], "https://img.example.com/face.jpg");
        assert!(body.get("image").is_none());
        assert_eq!(body["type"], 1);

        let err = api.add_image("v1", "nope", VaultImageKind::Document).unwrap_err();
        assert!(matches!(err, ApiError::Classification(MediaArgument::VaultImage)));
        assert_eq!(err.to_string(), "invalid image, file not found or malformed URL");
    }

    #[test]
    fn search_face_payload() {
        let api = api(r#"{"items":[{"id":"v9"}]}"#);
        let inline = "A".repeat(200);
        let resp = api.search_face(&inline, 10, 0.5).unwrap();
        assert_eq!(resp.items[0].id(), Some("v9"));
        let body = api.transport.last().json();
        assert_eq!(body["image"], inline);
        assert_eq!(body["maxentry"], 10);
        assert_eq!(body["threshold"], 0.5);
    }

    #[test]
    fn training_actions() {
        let api = api(r#"{"status":"ok","startTime":"2024-01-01 00:00:00"}"#);
        let status = api.training_status().unwrap();
        assert_eq!(status.status.as_deref(), Some("ok"));
        assert_eq!(status.start_time.as_deref(), Some("2024-01-01 00:00:00"));
        assert_eq!(api.transport.last().url, "https://api.example.com/vault/trainstatus");
        assert_eq!(
            api.transport.last().json(),
            json!({"apikey":"key","client":"rust-sdk"})
        );

        api.train_face().unwrap();
        assert_eq!(api.transport.last().url, "https://api.example.com/vault/train");
    }

    #[test]
    fn errors_are_reported() {
        let api = api(r#"{"error":{"code":21,"message":"vault entry not found"}}"#);
        let err = api.get("v404").unwrap_err();
        assert_eq!(err.code(), Some(21));
    }

    #[test]
    fn record_images() {
        let record: VaultRecord = serde_json::from_value(json!({
            "id": "v1",
            "image": [{"id": "i1", "type": "0", "url": "https://i/1"}, "junk"]
        }))
        .unwrap();
        let images = record.images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url.as_deref(), Some("https://i/1"));
    }
}
