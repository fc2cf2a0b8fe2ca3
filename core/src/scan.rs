//! Document scanning: OCR, face matching and verification of an ID document.
//!
//! # Design
//! `DocumentScanApi` owns a [`ScanConfig`] that setters validate and mutate
//! in place. Actions borrow the façade immutably: each call copies the current
//! configuration into a fresh request payload, resolves the media arguments
//! and hands the serialized payload to the transport. Everything that can be
//! rejected locally is rejected before the transport is touched.

use serde::{Deserialize, Serialize};

use crate::config::{
    contract_format_str, require_api_key, AuthModule, ClientOptions, ContractFormat, DecodeMode,
    PrefillData, CLIENT_ID,
};
use crate::endpoint::{Endpoint, Region};
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, HttpResponse};
use crate::media::{resolve, resolve_optional, MediaArgument, MediaValue};
use crate::response::{normalize, RemoteError};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    AuthenticationData, Confidence, ContractData, FaceData, IdentityData, VerificationData,
};
use crate::validate;
use crate::watchlist::{WatchlistEntry, WatchlistResponse};

/// The scan endpoint sits at the service root.
pub const SCAN_PATH: &str = "";

/// OCR accuracy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    Fast = 0,
    Balanced = 1,
    #[default]
    Accurate = 2,
}

/// How cropped images are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Url,
    Base64,
}

impl OutputMode {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "url" => Ok(OutputMode::Url),
            "base64" => Ok(OutputMode::Base64),
            _ => Err(ApiError::validation(
                r#"invalid output format; "url" or "base64" accepted"#,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Url => "url",
            OutputMode::Base64 => "base64",
        }
    }
}

/// Every tunable option of the scan façade.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub accuracy: Accuracy,
    pub authenticate: bool,
    pub authenticate_module: AuthModule,
    /// Longest edge the image is scaled down to before OCR; 0 disables.
    pub ocr_scaledown: u32,
    pub output_image: bool,
    pub output_face: bool,
    pub output_mode: OutputMode,
    pub dual_side_check: bool,
    pub verify_expiry: bool,
    pub verify_document_no: String,
    pub verify_name: String,
    pub verify_dob: String,
    pub verify_age: String,
    pub verify_address: String,
    pub verify_postcode: String,
    pub country: String,
    pub region: String,
    pub document_type: String,
    pub check_blocklist: bool,
    pub vault_save: bool,
    pub vault_save_unrecognized: bool,
    pub vault_no_duplicate: bool,
    pub vault_auto_merge: bool,
    pub vault_custom_data: [String; 5],
    pub barcode_mode: bool,
    pub biometric_threshold: f32,
    pub aml_check: bool,
    pub aml_strict_match: bool,
    pub aml_database: String,
    pub contract_generate: String,
    pub contract_format: Option<ContractFormat>,
    pub contract_prefill_data: PrefillData,
    pub decode_mode: DecodeMode,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::Accurate,
            authenticate: false,
            authenticate_module: AuthModule::One,
            ocr_scaledown: 2000,
            output_image: false,
            output_face: false,
            output_mode: OutputMode::Url,
            dual_side_check: false,
            verify_expiry: true,
            verify_document_no: String::new(),
            verify_name: String::new(),
            verify_dob: String::new(),
            verify_age: String::new(),
            verify_address: String::new(),
            verify_postcode: String::new(),
            country: String::new(),
            region: String::new(),
            document_type: String::new(),
            check_blocklist: false,
            vault_save: true,
            vault_save_unrecognized: false,
            vault_no_duplicate: false,
            vault_auto_merge: false,
            vault_custom_data: Default::default(),
            barcode_mode: false,
            biometric_threshold: 0.4,
            aml_check: false,
            aml_strict_match: false,
            aml_database: String::new(),
            contract_generate: String::new(),
            contract_format: None,
            contract_prefill_data: PrefillData::new(),
            decode_mode: DecodeMode::Permissive,
        }
    }
}

/// Face evidence supplied alongside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaceInput<'a> {
    #[default]
    None,
    Photo(&'a str),
    Video { video: &'a str, passcode: &'a str },
}

/// Media arguments of one scan call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanInput<'a> {
    pub primary: &'a str,
    /// `Some` for two-sided scans, where it must not be empty.
    pub secondary: Option<&'a str>,
    pub face: FaceInput<'a>,
}

/// Wire payload of a scan call.
#[derive(Debug, Serialize)]
struct ScanRequest<'a> {
    apikey: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_back: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_back_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    faceurl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    face_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    videourl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    passcode: Option<&'a str>,
    accuracy: u8,
    authenticate: bool,
    authenticate_module: &'static str,
    ocr_scaledown: u32,
    outputimage: bool,
    outputface: bool,
    outputmode: &'static str,
    dualsidecheck: bool,
    verify_expiry: bool,
    verify_documentno: &'a str,
    verify_name: &'a str,
    verify_dob: &'a str,
    verify_age: &'a str,
    verify_address: &'a str,
    verify_postcode: &'a str,
    country: &'a str,
    region: &'a str,
    #[serde(rename = "type")]
    document_type: &'a str,
    checkblocklist: bool,
    vault_save: bool,
    vault_saveunrecognized: bool,
    vault_noduplicate: bool,
    vault_automerge: bool,
    vault_customdata1: &'a str,
    vault_customdata2: &'a str,
    vault_customdata3: &'a str,
    vault_customdata4: &'a str,
    vault_customdata5: &'a str,
    barcodemode: bool,
    biometric_threshold: f32,
    aml_check: bool,
    aml_strict_match: bool,
    aml_database: &'a str,
    contract_generate: &'a str,
    contract_format: &'static str,
    contract_prefill_data: &'a PrefillData,
    client: &'static str,
}

impl<'a> ScanRequest<'a> {
    fn from_config(api_key: &'a str, config: &'a ScanConfig) -> Self {
        let [d1, d2, d3, d4, d5] = &config.vault_custom_data;
        Self {
            apikey: api_key,
            url: None,
            file_base64: None,
            url_back: None,
            file_back_base64: None,
            faceurl: None,
            face_base64: None,
            videourl: None,
            video_base64: None,
            passcode: None,
            accuracy: config.accuracy as u8,
            authenticate: config.authenticate,
            authenticate_module: config.authenticate_module.as_str(),
            ocr_scaledown: config.ocr_scaledown,
            outputimage: config.output_image,
            outputface: config.output_face,
            outputmode: config.output_mode.as_str(),
            dualsidecheck: config.dual_side_check,
            verify_expiry: config.verify_expiry,
            verify_documentno: &config.verify_document_no,
            verify_name: &config.verify_name,
            verify_dob: &config.verify_dob,
            verify_age: &config.verify_age,
            verify_address: &config.verify_address,
            verify_postcode: &config.verify_postcode,
            country: &config.country,
            region: &config.region,
            document_type: &config.document_type,
            checkblocklist: config.check_blocklist,
            vault_save: config.vault_save,
            vault_saveunrecognized: config.vault_save_unrecognized,
            vault_noduplicate: config.vault_no_duplicate,
            vault_automerge: config.vault_auto_merge,
            vault_customdata1: d1,
            vault_customdata2: d2,
            vault_customdata3: d3,
            vault_customdata4: d4,
            vault_customdata5: d5,
            barcodemode: config.barcode_mode,
            biometric_threshold: config.biometric_threshold,
            aml_check: config.aml_check,
            aml_strict_match: config.aml_strict_match,
            aml_database: &config.aml_database,
            contract_generate: &config.contract_generate,
            contract_format: contract_format_str(config.contract_format),
            contract_prefill_data: &config.contract_prefill_data,
            client: CLIENT_ID,
        }
    }
}

/// One cropped image for a single-sided scan, front and back for two sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageOutput {
    Single(String),
    Sides(Vec<String>),
}

/// Watchlist hits embedded in a scan result, as a bare list or wrapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmlMatches {
    List(Vec<WatchlistEntry>),
    Wrapped(WatchlistResponse),
}

impl AmlMatches {
    pub fn entries(&self) -> &[WatchlistEntry] {
        match self {
            AmlMatches::List(items) => items,
            AmlMatches::Wrapped(resp) => &resp.items,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanResponse {
    pub error: Option<RemoteError>,
    pub result: Option<IdentityData>,
    pub confidence: Option<Confidence>,
    pub face: Option<FaceData>,
    pub verification: Option<VerificationData>,
    pub authentication: Option<AuthenticationData>,
    pub aml: Option<AmlMatches>,
    pub contract: Option<ContractData>,
    pub vaultid: Option<String>,
    pub matchrate: Option<f32>,
    pub output: Option<ImageOutput>,
    pub outputface: Option<String>,
    pub cropped: Option<ImageOutput>,
    pub croppedface: Option<String>,
    #[serde(rename = "executionTime")]
    pub execution_time: Option<f64>,
    #[serde(rename = "responseID")]
    pub response_id: Option<String>,
    pub quota: Option<u32>,
    pub credit: Option<u32>,
}

/// Client for the document scan endpoint.
#[derive(Debug, Clone)]
pub struct DocumentScanApi<T = UreqTransport> {
    api_key: String,
    endpoint: Endpoint,
    config: ScanConfig,
    transport: T,
}

impl DocumentScanApi<UreqTransport> {
    pub fn new(api_key: &str, region: impl Into<Region>) -> ApiResult<Self> {
        Self::with_transport(api_key, region, UreqTransport::new())
    }

    pub fn from_options(options: &ClientOptions) -> ApiResult<Self> {
        Self::new(&options.api_key, options.region.clone())
    }
}

impl<T: Transport> DocumentScanApi<T> {
    pub fn with_transport(api_key: &str, region: impl Into<Region>, transport: T) -> ApiResult<Self> {
        require_api_key(api_key)?;
        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: Endpoint::new(&region.into(), SCAN_PATH),
            config: ScanConfig::default(),
            transport,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Restore every option to its default. The API key and endpoint stay.
    pub fn reset_config(&mut self) {
        self.config = ScanConfig::default();
    }

    pub fn set_accuracy(&mut self, accuracy: Accuracy) {
        self.config.accuracy = accuracy;
    }

    /// Check whether the document is authentic, using module `"1"`, `"2"` or `"quick"`.
    pub fn enable_authentication(&mut self, enabled: bool, module: &str) -> ApiResult<()> {
        let module = AuthModule::parse(module)?;
        self.config.authenticate = enabled;
        self.config.authenticate_module = module;
        Ok(())
    }

    /// Scale large images down before OCR. 0 disables, otherwise 500 to 4000.
    pub fn set_ocr_image_resize(&mut self, max_scale: u32) -> ApiResult<()> {
        if max_scale != 0 {
            validate::in_range(
                max_scale,
                500,
                4000,
                "invalid scale value; 0, or 500 to 4000 accepted",
            )?;
        }
        self.config.ocr_scaledown = max_scale;
        Ok(())
    }

    /// Minimum face-match confidence, in `(0, 1]`.
    pub fn set_biometric_threshold(&mut self, threshold: f32) -> ApiResult<()> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ApiError::validation(
                "invalid threshold value; float between 0 to 1 accepted",
            ));
        }
        self.config.biometric_threshold = threshold;
        Ok(())
    }

    /// Return cropped document and/or face images as `"url"` or `"base64"`.
    pub fn enable_image_output(
        &mut self,
        crop_document: bool,
        crop_face: bool,
        output_format: &str,
    ) -> ApiResult<()> {
        let mode = OutputMode::parse(output_format)?;
        self.config.output_image = crop_document;
        self.config.output_face = crop_face;
        self.config.output_mode = mode;
        Ok(())
    }

    /// Cross-check names, number and type between the two sides; a mismatch
    /// is reported by the service as error 14.
    pub fn enable_dual_side_check(&mut self, enabled: bool) {
        self.config.dual_side_check = enabled;
    }

    pub fn verify_expiry(&mut self, enabled: bool) {
        self.config.verify_expiry = enabled;
    }

    pub fn verify_document_number(&mut self, document_number: &str) {
        self.config.verify_document_no = document_number.to_string();
    }

    pub fn verify_name(&mut self, name: &str) {
        self.config.verify_name = name.to_string();
    }

    /// `YYYY/MM/DD`; empty disables the check.
    pub fn verify_dob(&mut self, dob: &str) -> ApiResult<()> {
        validate::date_of_birth(dob)?;
        self.config.verify_dob = dob.to_string();
        Ok(())
    }

    /// `minAge-maxAge`, e.g. `18-99`; empty disables the check.
    pub fn verify_age(&mut self, age_range: &str) -> ApiResult<()> {
        validate::age_range(age_range)?;
        self.config.verify_age = age_range.to_string();
        Ok(())
    }

    pub fn verify_address(&mut self, address: &str) {
        self.config.verify_address = address.to_string();
    }

    pub fn verify_postcode(&mut self, postcode: &str) {
        self.config.verify_postcode = postcode.to_string();
    }

    /// Comma-separated ISO country codes, e.g. `US,CA`.
    pub fn restrict_country(&mut self, country_codes: &str) {
        self.config.country = country_codes.to_string();
    }

    /// Comma-separated states, e.g. `CA,TX`.
    pub fn restrict_state(&mut self, states: &str) {
        self.config.region = states.to_string();
    }

    /// Document type letters, e.g. `PD` for passport or driver's license.
    pub fn restrict_type(&mut self, document_types: &str) {
        self.config.document_type = document_types.to_string();
    }

    /// Read AAMVA barcodes only, skipping visual OCR.
    pub fn enable_barcode_mode(&mut self, enabled: bool) {
        self.config.barcode_mode = enabled;
    }

    pub fn check_blocklist(&mut self, enabled: bool) {
        self.config.check_blocklist = enabled;
    }

    pub fn enable_aml_check(&mut self, enabled: bool) {
        self.config.aml_check = enabled;
    }

    pub fn set_aml_database(&mut self, databases: &str) {
        self.config.aml_database = databases.to_string();
    }

    pub fn enable_aml_strict_match(&mut self, enabled: bool) {
        self.config.aml_strict_match = enabled;
    }

    pub fn enable_vault(
        &mut self,
        enabled: bool,
        save_unrecognized: bool,
        no_duplicate_image: bool,
        auto_merge_document: bool,
    ) {
        self.config.vault_save = enabled;
        self.config.vault_save_unrecognized = save_unrecognized;
        self.config.vault_no_duplicate = no_duplicate_image;
        self.config.vault_auto_merge = auto_merge_document;
    }

    /// Up to five strings stored with the vault entry for filtering.
    pub fn set_vault_data(&mut self, data: [&str; 5]) {
        self.config.vault_custom_data = data.map(str::to_string);
    }

    /// Generate a legal document from the scanned data.
    pub fn generate_contract(
        &mut self,
        template_id: &str,
        format: &str,
        prefill_data: PrefillData,
    ) -> ApiResult<()> {
        validate::template_id(template_id)?;
        let format = ContractFormat::parse(format)?;
        self.config.contract_generate = template_id.to_string();
        self.config.contract_format = Some(format);
        self.config.contract_prefill_data = prefill_data;
        Ok(())
    }

    pub fn set_decode_mode(&mut self, mode: DecodeMode) {
        self.config.decode_mode = mode;
    }

    /// Build the request for any combination of scan inputs.
    pub fn build_scan(&self, input: &ScanInput<'_>) -> ApiResult<HttpRequest> {
        if input.secondary == Some("") {
            return Err(ApiError::validation("secondary document image required"));
        }
        if input.primary.is_empty() {
            return Err(ApiError::validation("primary document image required"));
        }

        let mut payload = ScanRequest::from_config(&self.api_key, &self.config);

        (payload.url, payload.file_base64) =
            resolve(MediaArgument::PrimaryDocument, input.primary)?.into_pair();

        if let Some(secondary) = input.secondary {
            (payload.url_back, payload.file_back_base64) =
                resolve(MediaArgument::SecondaryDocument, secondary)?.into_pair();
        }

        match input.face {
            FaceInput::None => {}
            FaceInput::Photo(photo) => {
                (payload.faceurl, payload.face_base64) =
                    resolve_optional(MediaArgument::FacePhoto, photo)?
                        .map(MediaValue::into_pair)
                        .unwrap_or_default();
            }
            FaceInput::Video { video, passcode } => {
                if let Some(value) = resolve_optional(MediaArgument::FaceVideo, video)? {
                    validate::video_passcode(passcode)?;
                    (payload.videourl, payload.video_base64) = value.into_pair();
                    payload.passcode = Some(passcode);
                }
            }
        }

        HttpRequest::post_json(self.endpoint.url().to_string(), &payload)
    }

    pub fn parse_scan(&self, response: HttpResponse) -> ApiResult<ScanResponse> {
        normalize(response, self.config.decode_mode)
    }

    pub fn scan(&self, input: &ScanInput<'_>) -> ApiResult<ScanResponse> {
        let request = self.build_scan(input)?;
        self.parse_scan(self.transport.execute(&request)?)
    }

    /// Scan the front of a document.
    pub fn scan_front(&self, document: &str) -> ApiResult<ScanResponse> {
        self.scan(&ScanInput {
            primary: document,
            ..Default::default()
        })
    }

    /// Scan the front of a document and match it against a face photo.
    pub fn scan_front_face(&self, document: &str, face_photo: &str) -> ApiResult<ScanResponse> {
        self.scan(&ScanInput {
            primary: document,
            secondary: None,
            face: FaceInput::Photo(face_photo),
        })
    }

    /// Scan the front of a document and match it against a selfie video in
    /// which the user reads out `passcode`.
    pub fn scan_front_video(
        &self,
        document: &str,
        face_video: &str,
        passcode: &str,
    ) -> ApiResult<ScanResponse> {
        self.scan(&ScanInput {
            primary: document,
            secondary: None,
            face: FaceInput::Video {
                video: face_video,
                passcode,
            },
        })
    }

    /// Scan both sides of a document.
    pub fn scan_both(&self, front: &str, back: &str) -> ApiResult<ScanResponse> {
        self.scan(&ScanInput {
            primary: front,
            secondary: Some(back),
            face: FaceInput::None,
        })
    }

    pub fn scan_both_face(&self, front: &str, back: &str, face_photo: &str) -> ApiResult<ScanResponse> {
        self.scan(&ScanInput {
            primary: front,
            secondary: Some(back),
            face: FaceInput::Photo(face_photo),
        })
    }

    pub fn scan_both_video(
        &self,
        front: &str,
        back: &str,
        face_video: &str,
        passcode: &str,
    ) -> ApiResult<ScanResponse> {
        self.scan(&ScanInput {
            primary: front,
            secondary: Some(back),
            face: FaceInput::Video {
                video: face_video,
                passcode,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    use super::*;
    use crate::transport::testing::RecordingTransport;

    const FRONT: &str = "https://docs.example.com/front.jpg";
    const BACK: &str = "https://docs.example.com/back.jpg";

    fn api(reply: &str) -> DocumentScanApi<RecordingTransport> {
        DocumentScanApi::with_transport("key", "US", RecordingTransport::replying(reply)).unwrap()
    }

    #[test]
    fn default_payload_carries_documented_defaults() {
        let api = api("{}");
        let body = api
            .build_scan(&ScanInput {
                primary: FRONT,
                ..Default::default()
            })
            .unwrap()
            .json();

        assert_eq!(body["apikey"], "key");
        assert_eq!(body["client"], "rust-sdk");
        assert_eq!(body["url"], FRONT);
        assert!(body.get("file_base64").is_none());
        assert!(body.get("url_back").is_none());
        assert!(body.get("passcode").is_none());
        assert_eq!(body["accuracy"], 2);
        assert_eq!(body["authenticate"], false);
        assert_eq!(body["authenticate_module"], "1");
        assert_eq!(body["ocr_scaledown"], 2000);
        assert_eq!(body["outputmode"], "url");
        assert_eq!(body["verify_expiry"], true);
        assert_eq!(body["vault_save"], true);
        assert_eq!(body["biometric_threshold"], 0.4);
        assert_eq!(body["type"], "");
        assert_eq!(body["contract_format"], "");
        assert_eq!(body["contract_prefill_data"], serde_json::json!({}));
    }

    #[test]
    fn endpoint_is_service_root() {
        let api = api("{}");
        api.scan_front(FRONT).unwrap();
        assert_eq!(api.transport.last().url, "https://api.example.com/");
    }

    #[test]
    fn biometric_threshold_scenario() {
        let mut api = api("{}");
        assert!(api.set_biometric_threshold(0.0).is_err());
        assert_eq!(api.config().biometric_threshold, 0.4);
        api.set_biometric_threshold(0.6).unwrap();
        assert_eq!(api.config().biometric_threshold, 0.6);
        assert!(api.set_biometric_threshold(1.5).is_err());
        assert_eq!(api.config().biometric_threshold, 0.6);
    }

    #[test]
    fn age_scenario() {
        let mut api = api("{}");
        api.verify_age("18-120").unwrap();
        let err = api.verify_age("eighteen-120").unwrap_err();
        assert_eq!(err.to_string(), "invalid age range format (minAge-maxAge)");
        assert_eq!(api.config().verify_age, "18-120");
    }

    #[test]
    fn ocr_resize_bounds() {
        let mut api = api("{}");
        api.set_ocr_image_resize(0).unwrap();
        api.set_ocr_image_resize(500).unwrap();
        api.set_ocr_image_resize(4000).unwrap();
        assert!(api.set_ocr_image_resize(499).is_err());
        assert!(api.set_ocr_image_resize(4001).is_err());
        assert_eq!(api.config().ocr_scaledown, 4000);
    }

    #[test]
    fn failed_authentication_setter_is_atomic() {
        let mut api = api("{}");
        assert!(api.enable_authentication(true, "3").is_err());
        assert!(!api.config().authenticate);
        assert_eq!(api.config().authenticate_module, AuthModule::One);

        api.enable_authentication(true, "quick").unwrap();
        assert!(api.config().authenticate);
        assert_eq!(api.config().authenticate_module, AuthModule::Quick);
    }

    #[test]
    fn failed_image_output_setter_is_atomic() {
        let mut api = api("{}");
        assert!(api.enable_image_output(true, true, "png").is_err());
        assert!(!api.config().output_image);
        api.enable_image_output(true, false, "base64").unwrap();
        assert_eq!(api.config().output_mode, OutputMode::Base64);
    }

    #[test]
    fn contract_validation() {
        let mut api = api("{}");
        assert!(api.generate_contract("", "PDF", PrefillData::new()).is_err());
        assert!(api.generate_contract("tpl", "ODT", PrefillData::new()).is_err());
        assert_eq!(api.config().contract_generate, "");

        let mut prefill = PrefillData::new();
        prefill.insert("company".into(), "ACME".into());
        api.generate_contract("tpl", "PDF", prefill).unwrap();
        let body = api
            .build_scan(&ScanInput {
                primary: FRONT,
                ..Default::default()
            })
            .unwrap()
            .json();
        assert_eq!(body["contract_generate"], "tpl");
        assert_eq!(body["contract_format"], "PDF");
        assert_eq!(body["contract_prefill_data"]["company"], "ACME");
    }

    #[test]
    fn setter_is_idempotent() {
        let mut once = api("{}");
        once.verify_dob("1990/01/31").unwrap();
        once.set_vault_data(["a", "b", "", "", "e"]);

        let mut twice = api("{}");
        for _ in 0..2 {
            twice.verify_dob("1990/01/31").unwrap();
            twice.set_vault_data(["a", "b", "", "", "e"]);
        }
        assert_eq!(once.config(), twice.config());
    }

    #[test]
    fn reset_then_build_has_only_defaults() {
        let mut configured = api("{}");
        configured.set_accuracy(Accuracy::Fast);
        configured.enable_dual_side_check(true);
        configured.restrict_country("US,CA");
        configured.enable_vault(false, true, true, true);
        configured.set_vault_data(["1", "2", "3", "4", "5"]);
        configured.reset_config();

        let reset = configured
            .build_scan(&ScanInput {
                primary: FRONT,
                ..Default::default()
            })
            .unwrap()
            .json();
        let fresh = api("{}")
            .build_scan(&ScanInput {
                primary: FRONT,
                ..Default::default()
            })
            .unwrap()
            .json();
        assert_eq!(reset, fresh);
        assert_eq!(reset["apikey"], "key");
    }

    #[test]
    fn two_sided_scan_without_back_makes_no_call() {
        let api = api("{}");
        let err = api.scan_both(FRONT, "").unwrap_err();
        assert_eq!(err.to_string(), "secondary document image required");
        assert_eq!(api.transport.calls(), 0);
    }

    #[test]
    fn missing_primary_makes_no_call() {
        let api = api("{}");
        let err = api.scan_front("").unwrap_err();
        assert_eq!(err.to_string(), "primary document image required");
        assert_eq!(api.transport.calls(), 0);
    }

    #[test]
    fn unclassifiable_media_names_the_argument() {
        let api = api("{}");
        let err = api.scan_both_face(FRONT, BACK, "nope.jpg").unwrap_err();
        assert!(matches!(err, ApiError::Classification(MediaArgument::FacePhoto)));
        assert_eq!(api.transport.calls(), 0);

        let err = api.scan_front("missing.jpg").unwrap_err();
        assert!(matches!(err, ApiError::Classification(MediaArgument::PrimaryDocument)));
    }

    #[test]
    fn video_requires_passcode() {
        let api = api("{}");
        let err = api.scan_front_video(FRONT, "https://v.example.com/selfie.mp4", "12")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "please provide a 4 digit passcode for video biometric verification"
        );
        assert_eq!(api.transport.calls(), 0);

        api.scan_front_video(FRONT, "https://v.example.com/selfie.mp4", "1234")
            .unwrap();
        let body = api.transport.last().json();
        assert_eq!(body["videourl"], "https://v.example.com/selfie.mp4");
        assert_eq!(body["passcode"], "1234");
        assert!(body.get("faceurl").is_none());
    }

    #[test]
    fn media_pairs_are_exclusive() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"back side").unwrap();
        let back = file.path().to_str().unwrap().to_string();
        let face = "F".repeat(150);

        let api = api("{}");
        api.scan_both_face(FRONT, &back, &face).unwrap();
        let body = api.transport.last().json();

        assert_eq!(body["url"], FRONT);
        assert!(body.get("file_base64").is_none());
        assert_eq!(body["file_back_base64"], STANDARD.encode(b"back side"));
        assert!(body.get("url_back").is_none());
        assert_eq!(body["face_base64"], face);
        assert!(body.get("faceurl").is_none());
    }

    #[test]
    fn embedded_error_keeps_partial_result() {
        let api = api(
            r#"{"error":{"code":14,"message":"mismatch"},
                "result":{"firstName":"JOHN","lastName":"SMITH","documentNumber":"X1"}}"#,
        );
        let err = api.scan_both(FRONT, BACK).unwrap_err();
        assert_eq!(err.to_string(), "14: mismatch");
        let partial: ScanResponse = err.partial().unwrap();
        let result = partial.result.unwrap();
        assert_eq!(result.first_name.as_deref(), Some("JOHN"));
        assert_eq!(result.document_number.as_deref(), Some("X1"));
        assert_eq!(partial.error.unwrap().code, 14);
    }

    #[test]
    fn output_decodes_single_or_sides() {
        let single: ScanResponse =
            serde_json::from_str(r#"{"output":"https://o/1.jpg","quota":0}"#).unwrap();
        assert_eq!(single.output, Some(ImageOutput::Single("https://o/1.jpg".into())));
        assert_eq!(single.quota, Some(0));

        let sides: ScanResponse =
            serde_json::from_str(r#"{"cropped":["a","b"],"aml":[{"entity":"person"}]}"#).unwrap();
        assert_eq!(
            sides.cropped,
            Some(ImageOutput::Sides(vec!["a".into(), "b".into()]))
        );
        assert_eq!(sides.aml.unwrap().entries().len(), 1);
    }
}
