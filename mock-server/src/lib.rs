//! In-memory emulation of the identity-verification service.
//!
//! Every endpoint accepts a JSON POST and answers 200 with a JSON body;
//! failures are reported the way the real service does, as an embedded
//! `error` object. Scans return a fixed identity so tests can assert on it.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// Document number of the identity every scan returns.
pub const SAMPLE_DOCUMENT_NUMBER: &str = "X1234567";
pub const SAMPLE_FIRST_NAME: &str = "JOHN";
pub const SAMPLE_LAST_NAME: &str = "SMITH";
pub const SAMPLE_DOB: &str = "1990/01/31";

/// Name fragment that produces a watchlist hit.
pub const WATCHLIST_HIT: &str = "bloggs";

#[derive(Debug, Default)]
pub struct Store {
    pub vault: HashMap<String, Map<String, Value>>,
    pub sessions: HashMap<String, String>,
    pub trained: bool,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/", post(scan))
        .route("/aml", post(watchlist))
        .route("/docupass/{action}", post(session))
        .route("/vault/{action}", post(vault))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Hash the service hands out with a session's callback.
pub fn callback_hash(reference: &str) -> String {
    format!("hash-{reference}")
}

fn error(code: u32, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message } })
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn bool_field(body: &Value, key: &str) -> bool {
    body.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn has_media(body: &Value, url_key: &str, base64_key: &str) -> bool {
    !str_field(body, url_key).is_empty() || !str_field(body, base64_key).is_empty()
}

fn authorized(body: &Value) -> Result<(), Value> {
    if str_field(body, "apikey").is_empty() {
        Err(error(1, "invalid API key"))
    } else {
        Ok(())
    }
}

fn sample_identity() -> Value {
    json!({
        "documentNumber": SAMPLE_DOCUMENT_NUMBER,
        "firstName": SAMPLE_FIRST_NAME,
        "lastName": SAMPLE_LAST_NAME,
        "fullName": format!("{SAMPLE_FIRST_NAME} {SAMPLE_LAST_NAME}"),
        "dob": SAMPLE_DOB,
        "dob_day": 31,
        "dob_month": 1,
        "dob_year": 1990,
        "expiry": "2031/05/01",
        "daysToExipry": 1800,
        "age": 34,
        "sex": "M",
        "documentType": "P",
        "issuerOrg_iso2": "US",
        "nationality_iso2": "US"
    })
}

/// Per-field checks requested through the `verify_*` options.
fn verification(body: &Value) -> Option<Value> {
    let mut checks = Map::new();
    let name = str_field(body, "verify_name");
    if !name.is_empty() {
        let expected = format!("{SAMPLE_FIRST_NAME} {SAMPLE_LAST_NAME}");
        checks.insert("name".into(), name.eq_ignore_ascii_case(&expected).into());
    }
    let number = str_field(body, "verify_documentno");
    if !number.is_empty() {
        checks.insert("documentNumber".into(), (number == SAMPLE_DOCUMENT_NUMBER).into());
    }
    let dob = str_field(body, "verify_dob");
    if !dob.is_empty() {
        checks.insert("dob".into(), (dob == SAMPLE_DOB).into());
    }
    let age = str_field(body, "verify_age");
    if !age.is_empty() {
        let within = age
            .split_once('-')
            .and_then(|(min, max)| Some((min.parse::<u32>().ok()?, max.parse::<u32>().ok()?)))
            .is_some_and(|(min, max)| (min..=max).contains(&34));
        checks.insert("age".into(), within.into());
    }
    if bool_field(body, "verify_expiry") {
        checks.insert("notexpired".into(), true.into());
    }
    if checks.is_empty() {
        return None;
    }
    let passed = checks.values().all(|v| v.as_bool() == Some(true));
    Some(json!({ "passed": passed, "result": checks }))
}

async fn scan(State(db): State<Db>, Json(body): Json<Value>) -> Json<Value> {
    if let Err(e) = authorized(&body) {
        return Json(e);
    }
    if !has_media(&body, "url", "file_base64") {
        return Json(error(2, "no document image supplied"));
    }

    let mut out = Map::new();
    out.insert("result".into(), sample_identity());
    out.insert("matchrate".into(), json!(0.95));
    out.insert("executionTime".into(), json!(0.5));
    out.insert("responseID".into(), Uuid::new_v4().simple().to_string().into());
    out.insert("quota".into(), json!(100));
    out.insert("credit".into(), json!(0));

    let has_face = has_media(&body, "faceurl", "face_base64");
    let has_video = has_media(&body, "videourl", "video_base64");
    if has_face || has_video {
        let threshold = body.get("biometric_threshold").and_then(Value::as_f64).unwrap_or(0.4);
        let confidence = 0.9;
        out.insert(
            "face".into(),
            json!({ "isIdentical": confidence >= threshold, "confidence": confidence }),
        );
    }
    if let Some(verification) = verification(&body) {
        out.insert("verification".into(), verification);
    }
    if bool_field(&body, "authenticate") {
        out.insert("authentication".into(), json!({ "score": 0.8, "warning": [] }));
    }
    if bool_field(&body, "aml_check") {
        out.insert("aml".into(), json!([]));
    }
    let template = str_field(&body, "contract_generate");
    if !template.is_empty() {
        out.insert(
            "contract".into(),
            json!({ "document_url": format!("https://contracts.example.com/{template}") }),
        );
    }
    if bool_field(&body, "vault_save") {
        let id = Uuid::new_v4().simple().to_string();
        let mut record = sample_identity().as_object().cloned().unwrap_or_default();
        record.insert("id".into(), id.clone().into());
        for n in 1..=5 {
            let key = format!("customdata{n}");
            let value = str_field(&body, &format!("vault_customdata{n}"));
            record.insert(key, value.into());
        }
        record.insert("image".into(), json!([]));
        db.write().await.vault.insert(id.clone(), record);
        out.insert("vaultid".into(), id.into());
    }

    let two_sided = has_media(&body, "url_back", "file_back_base64");
    if bool_field(&body, "dualsidecheck") && two_sided {
        out.insert(
            "error".into(),
            json!({ "code": 14, "message": "document front and back do not match" }),
        );
    }

    debug!(face = has_face, video = has_video, two_sided, "scan");
    Json(Value::Object(out))
}

async fn watchlist(Json(body): Json<Value>) -> Json<Value> {
    if let Err(e) = authorized(&body) {
        return Json(e);
    }
    let name = str_field(&body, "name").to_ascii_lowercase();
    let number = str_field(&body, "documentnumber");
    let entity = str_field(&body, "entity");

    let hit = (!name.is_empty() && name.contains(WATCHLIST_HIT)) || number == SAMPLE_DOCUMENT_NUMBER;
    let items = if hit && (entity.is_empty() || entity == "person") {
        json!([{
            "entity": "person",
            "fullname": ["JOE BLOGGS"],
            "dob": ["1970/01/01"],
            "nationality": ["US"],
            "documentnumber": [{ "id": SAMPLE_DOCUMENT_NUMBER, "country": "US", "type": "P" }],
            "program": ["SDGT"],
            "source": ["https://sanctions.example.com"],
            "database": "us_ofac",
            "time": "2024-01-01 00:00:00"
        }])
    } else {
        json!([])
    };
    debug!(hit, "watchlist search");
    Json(json!({ "items": items }))
}

async fn session(
    State(db): State<Db>,
    Path(action): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    if let Err(e) = authorized(&body) {
        return Json(e);
    }
    let reply = match action.as_str() {
        "create" => create_session(&db, &body).await,
        "sign" => create_signature(&db, &body).await,
        "validate" => {
            let reference = str_field(&body, "reference");
            let hash = str_field(&body, "hash");
            let store = db.read().await;
            let valid = store.sessions.get(reference).is_some_and(|h| h == hash);
            json!({ "success": valid, "reference": reference })
        }
        _ => error(404, "unknown action"),
    };
    debug!(%action, "session");
    Json(reply)
}

async fn new_reference(db: &Db) -> String {
    let reference = Uuid::new_v4().simple().to_string()[..10].to_ascii_uppercase();
    db.write()
        .await
        .sessions
        .insert(reference.clone(), callback_hash(&reference));
    reference
}

async fn create_session(db: &Db, body: &Value) -> Value {
    if str_field(body, "companyname").is_empty() {
        return error(2, "company name required");
    }
    let kind = body.get("type").and_then(Value::as_u64).unwrap_or(0);
    if kind > 3 {
        return error(3, "invalid session type");
    }
    let reference = new_reference(db).await;
    let url = format!("https://docupass.example.com/{reference}");
    json!({
        "reference": reference,
        "type": kind,
        "customid": str_field(body, "customid"),
        "url": url,
        "qrcode": format!("https://docupass.example.com/qr/{reference}.png"),
        "base_url": "https://docupass.example.com/",
        "html": format!("<iframe src=\"{url}\"></iframe>"),
        "smssent": "",
        "expiry": "2099-01-01 00:00:00"
    })
}

async fn create_signature(db: &Db, body: &Value) -> Value {
    if str_field(body, "template_id").is_empty() {
        return error(4, "template ID required");
    }
    let reference = new_reference(db).await;
    let url = format!("https://docupass.example.com/sign/{reference}");
    json!({
        "reference": reference,
        "customid": str_field(body, "customid"),
        "url": url,
        "qrcode": format!("https://docupass.example.com/qr/{reference}.png"),
        "base_url": "https://docupass.example.com/",
        "html_qrcode": format!("<img src=\"https://docupass.example.com/qr/{reference}.png\">"),
        "html_iframe": format!("<iframe src=\"{url}\"></iframe>"),
        "smssent": "",
        "expiry": "2099-01-01 00:00:00"
    })
}

fn not_found() -> Value {
    error(21, "vault entry not found")
}

/// `key=value` equality; other operators never match.
fn matches_filter(record: &Map<String, Value>, filter: &str) -> bool {
    match filter.split_once('=') {
        Some((key, value)) => record.get(key).and_then(Value::as_str) == Some(value),
        None => false,
    }
}

async fn vault(
    State(db): State<Db>,
    Path(action): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    if let Err(e) = authorized(&body) {
        return Json(e);
    }
    let id = str_field(&body, "id").to_string();
    let mut store = db.write().await;
    let reply = match action.as_str() {
        "get" => match store.vault.get(&id) {
            Some(record) => json!({ "success": true, "data": record }),
            None => not_found(),
        },
        "list" => {
            let filters: Vec<&str> = body
                .get("filter")
                .and_then(Value::as_array)
                .map(|f| f.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let mut items: Vec<&Map<String, Value>> = store
                .vault
                .values()
                .filter(|r| filters.iter().all(|f| matches_filter(r, f)))
                .collect();
            items.sort_by(|a, b| {
                a.get("id").and_then(Value::as_str).cmp(&b.get("id").and_then(Value::as_str))
            });
            let total = items.len();
            let offset = body.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
            let limit = match body.get("limit").and_then(Value::as_u64).unwrap_or(0) as usize {
                0 => 10,
                n => n,
            };
            let page: Vec<_> = items.into_iter().skip(offset).take(limit).collect();
            let next = if offset + page.len() < total { offset + page.len() } else { 0 };
            json!({
                "limit": limit,
                "offset": offset,
                "nextoffset": next,
                "total": total,
                "items": page
            })
        }
        "update" => match store.vault.get_mut(&id) {
            Some(record) => {
                for (key, value) in body.as_object().into_iter().flatten() {
                    if key != "apikey" && key != "client" {
                        record.insert(key.clone(), value.clone());
                    }
                }
                json!({ "success": 1 })
            }
            None => not_found(),
        },
        "delete" => match store.vault.remove(&id) {
            Some(_) => json!({ "success": 1 }),
            None => not_found(),
        },
        "addimage" => {
            let has_image = has_media(&body, "imageurl", "image");
            match store.vault.get_mut(&id) {
                Some(_) if !has_image => error(5, "image required"),
                Some(record) => {
                    let image = json!({
                        "id": Uuid::new_v4().simple().to_string(),
                        "type": body.get("type").and_then(Value::as_u64).unwrap_or(0).to_string(),
                        "hash": "",
                        "url": str_field(&body, "imageurl"),
                        "createtime": "2024-01-01 00:00:00"
                    });
                    if let Some(images) = record
                        .entry("image")
                        .or_insert_with(|| json!([]))
                        .as_array_mut()
                    {
                        images.push(image.clone());
                    }
                    json!({ "success": 1, "image": image })
                }
                None => not_found(),
            }
        }
        "deleteimage" => {
            let image_id = str_field(&body, "imageid");
            match store.vault.get_mut(&id) {
                Some(record) => {
                    let images = record.get_mut("image").and_then(Value::as_array_mut);
                    let removed = images.is_some_and(|images| {
                        let before = images.len();
                        images.retain(|i| i.get("id").and_then(Value::as_str) != Some(image_id));
                        images.len() != before
                    });
                    if removed {
                        json!({ "success": 1 })
                    } else {
                        error(22, "image not found")
                    }
                }
                None => not_found(),
            }
        }
        "searchface" if !store.trained => error(23, "vault has not been trained"),
        "searchface" => {
            let max = body.get("maxentry").and_then(Value::as_u64).unwrap_or(10) as usize;
            let items: Vec<_> = store
                .vault
                .values()
                .filter(|r| r.get("image").and_then(Value::as_array).is_some_and(|i| !i.is_empty()))
                .take(max)
                .cloned()
                .collect();
            json!({ "items": items })
        }
        "train" => {
            store.trained = true;
            json!({ "success": 1 })
        }
        "trainstatus" => json!({
            "status": if store.trained { "ok" } else { "untrained" },
            "startTime": "2024-01-01 00:00:00",
            "statusChangeTime": "2024-01-01 00:00:00",
            "lastSuccessTime": if store.trained { "2024-01-01 00:00:00" } else { "" }
        }),
        _ => error(404, "unknown action"),
    };
    debug!(%action, "vault");
    Json(reply)
}
