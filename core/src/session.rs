//! Hosted verification sessions.
//!
//! A session is a link or iframe served by the remote service in which the
//! end user uploads their document and selfie. Creating one returns a
//! reference; when the user finishes, the service POSTs the outcome to the
//! registered callback URL. The callback body can be decoded with
//! [`IdentityCallback::from_json`] or [`SignatureCallback::from_json`] and its
//! authenticity confirmed with [`HostedSessionApi::validate`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{
    contract_format_str, require_api_key, AuthModule, ClientOptions, ContractFormat, DecodeMode,
    PrefillData, CLIENT_ID,
};
use crate::endpoint::{Endpoint, Region};
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, HttpResponse};
use crate::response::{lenient, normalize, RemoteError};
use crate::transport::{Transport, UreqTransport};
use crate::types::{AuthenticationData, ContractData, FaceData, IdentityData, VerificationData};
use crate::validate;
use crate::watchlist::WatchlistEntry;

pub const SESSION_PATH: &str = "docupass";

/// Presentation of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Embedded in a web page.
    IFrame = 0,
    /// Opened on a phone or embedded in a mobile app.
    Mobile = 1,
    /// Opened in any browser, then redirected back.
    Redirection = 2,
    /// Live capture on a phone.
    LiveMobile = 3,
}

/// Face evidence required from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceVerification {
    Photo = 1,
    Video = 2,
}

/// Encoding of images attached to the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    Url = 0,
    #[default]
    Base64 = 1,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub aml_check: bool,
    pub aml_database: String,
    pub aml_strict_match: bool,
    pub authenticate_min_score: f32,
    pub authenticate_module: AuthModule,
    /// 0 disables face verification, otherwise a [`FaceVerification`] value.
    pub biometric: u8,
    pub biometric_threshold: f32,
    pub callback_url: String,
    pub contract_format: Option<ContractFormat>,
    pub contract_generate: String,
    pub contract_prefill_data: PrefillData,
    pub contract_sign: String,
    pub crop_document: bool,
    pub custom_html_url: String,
    pub custom_id: String,
    pub document_country: String,
    pub document_region: String,
    pub document_type: String,
    pub dual_side_check: bool,
    pub fail_redirect: String,
    pub language: String,
    pub logo: String,
    pub max_attempt: u32,
    pub no_branding: bool,
    pub phone_verification: bool,
    pub qr_bg_color: String,
    pub qr_color: String,
    pub qr_margin: u32,
    pub qr_size: u32,
    pub return_document_image: bool,
    pub return_face_image: bool,
    pub return_type: ImageFormat,
    pub reusable: bool,
    pub sms_contract_link: String,
    pub sms_verification_link: String,
    pub success_redirect: String,
    pub vault_save: bool,
    pub verify_address: String,
    pub verify_age: String,
    pub verify_dob: String,
    pub verify_document_no: String,
    pub verify_expiry: bool,
    pub verify_name: String,
    pub verify_phone: String,
    pub verify_postcode: String,
    pub welcome_message: String,
    pub decode_mode: DecodeMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            aml_check: false,
            aml_database: String::new(),
            aml_strict_match: false,
            authenticate_min_score: 0.0,
            authenticate_module: AuthModule::Two,
            biometric: 0,
            biometric_threshold: 0.4,
            callback_url: String::new(),
            contract_format: None,
            contract_generate: String::new(),
            contract_prefill_data: PrefillData::new(),
            contract_sign: String::new(),
            crop_document: false,
            custom_html_url: String::new(),
            custom_id: String::new(),
            document_country: String::new(),
            document_region: String::new(),
            document_type: String::new(),
            dual_side_check: false,
            fail_redirect: String::new(),
            language: String::new(),
            logo: String::new(),
            max_attempt: 1,
            no_branding: false,
            phone_verification: false,
            qr_bg_color: String::new(),
            qr_color: String::new(),
            qr_margin: 1,
            qr_size: 5,
            return_document_image: true,
            return_face_image: true,
            return_type: ImageFormat::Base64,
            reusable: false,
            sms_contract_link: String::new(),
            sms_verification_link: String::new(),
            success_redirect: String::new(),
            vault_save: true,
            verify_address: String::new(),
            verify_age: String::new(),
            verify_dob: String::new(),
            verify_document_no: String::new(),
            verify_expiry: false,
            verify_name: String::new(),
            verify_phone: String::new(),
            verify_postcode: String::new(),
            welcome_message: String::new(),
            decode_mode: DecodeMode::Permissive,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    apikey: &'a str,
    companyname: &'a str,
    aml_check: bool,
    aml_database: &'a str,
    aml_strict_match: bool,
    authenticate_minscore: f32,
    authenticate_module: &'static str,
    biometric: u8,
    biometric_threshold: f32,
    callbackurl: &'a str,
    contract_format: &'a str,
    contract_generate: &'a str,
    contract_prefill_data: &'a PrefillData,
    contract_sign: &'a str,
    crop_document: bool,
    customhtmlurl: &'a str,
    customid: &'a str,
    documentcountry: &'a str,
    documentregion: &'a str,
    documenttype: &'a str,
    dualsidecheck: bool,
    failredir: &'a str,
    language: &'a str,
    logo: &'a str,
    maxattempt: u32,
    nobranding: bool,
    phoneverification: bool,
    qr_bgcolor: &'a str,
    qr_color: &'a str,
    qr_margin: u32,
    qr_size: u32,
    return_documentimage: bool,
    return_faceimage: bool,
    return_type: u8,
    reusable: bool,
    sms_contract_link: &'a str,
    sms_verification_link: &'a str,
    successredir: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    template_id: Option<&'a str>,
    #[serde(rename = "type")]
    kind: u8,
    vault_save: bool,
    verify_address: &'a str,
    verify_age: &'a str,
    verify_dob: &'a str,
    verify_documentno: &'a str,
    verify_expiry: bool,
    verify_name: &'a str,
    verify_phone: &'a str,
    verify_postcode: &'a str,
    welcomemessage: &'a str,
    client: &'static str,
}

impl<'a> SessionRequest<'a> {
    fn from_config(api_key: &'a str, company_name: &'a str, c: &'a SessionConfig) -> Self {
        Self {
            apikey: api_key,
            companyname: company_name,
            aml_check: c.aml_check,
            aml_database: &c.aml_database,
            aml_strict_match: c.aml_strict_match,
            authenticate_minscore: c.authenticate_min_score,
            authenticate_module: c.authenticate_module.as_str(),
            biometric: c.biometric,
            biometric_threshold: c.biometric_threshold,
            callbackurl: &c.callback_url,
            contract_format: contract_format_str(c.contract_format),
            contract_generate: &c.contract_generate,
            contract_prefill_data: &c.contract_prefill_data,
            contract_sign: &c.contract_sign,
            crop_document: c.crop_document,
            customhtmlurl: &c.custom_html_url,
            customid: &c.custom_id,
            documentcountry: &c.document_country,
            documentregion: &c.document_region,
            documenttype: &c.document_type,
            dualsidecheck: c.dual_side_check,
            failredir: &c.fail_redirect,
            language: &c.language,
            logo: &c.logo,
            maxattempt: c.max_attempt,
            nobranding: c.no_branding,
            phoneverification: c.phone_verification,
            qr_bgcolor: &c.qr_bg_color,
            qr_color: &c.qr_color,
            qr_margin: c.qr_margin,
            qr_size: c.qr_size,
            return_documentimage: c.return_document_image,
            return_faceimage: c.return_face_image,
            return_type: c.return_type as u8,
            reusable: c.reusable,
            sms_contract_link: &c.sms_contract_link,
            sms_verification_link: &c.sms_verification_link,
            successredir: &c.success_redirect,
            template_id: None,
            kind: 0,
            vault_save: c.vault_save,
            verify_address: &c.verify_address,
            verify_age: &c.verify_age,
            verify_dob: &c.verify_dob,
            verify_documentno: &c.verify_document_no,
            verify_expiry: c.verify_expiry,
            verify_name: &c.verify_name,
            verify_phone: &c.verify_phone,
            verify_postcode: &c.verify_postcode,
            welcomemessage: &c.welcome_message,
            client: CLIENT_ID,
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    apikey: &'a str,
    reference: &'a str,
    hash: &'a str,
    client: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionResponse {
    pub error: Option<RemoteError>,
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<u8>,
    pub customid: Option<String>,
    pub url: Option<String>,
    pub qrcode: Option<String>,
    pub base_url: Option<String>,
    pub html: Option<String>,
    pub smssent: Option<String>,
    pub expiry: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureResponse {
    pub error: Option<RemoteError>,
    pub reference: Option<String>,
    pub customid: Option<String>,
    pub url: Option<String>,
    pub qrcode: Option<String>,
    pub base_url: Option<String>,
    pub html_qrcode: Option<String>,
    pub html_iframe: Option<String>,
    pub smssent: Option<String>,
    pub expiry: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationResponse {
    pub error: Option<RemoteError>,
    pub success: Option<bool>,
    pub reference: Option<String>,
}

/// Outcome of an identity session, as posted to the callback URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityCallback {
    pub success: Option<bool>,
    pub reference: Option<String>,
    pub hash: Option<String>,
    pub customid: Option<String>,
    pub failreason: Option<String>,
    pub failcode: Option<String>,
    pub data: Option<IdentityData>,
    pub contract: Option<ContractData>,
    pub phone: Option<CallbackPhone>,
    pub face: Option<FaceData>,
    pub verification: Option<VerificationData>,
    pub authentication: Option<AuthenticationData>,
    pub aml: Vec<WatchlistEntry>,
    pub documentimage: Vec<CallbackImage>,
    pub faceimage: Vec<CallbackImage>,
    pub vaultid: Option<String>,
}

impl IdentityCallback {
    pub fn from_json(body: &str) -> ApiResult<Self> {
        decode_callback(body)
    }
}

/// Outcome of a signature session, as posted to the callback URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureCallback {
    pub success: Option<bool>,
    pub reference: Option<String>,
    pub hash: Option<String>,
    pub customid: Option<String>,
    pub failreason: Option<String>,
    pub failcode: Option<String>,
    pub contract: Option<ContractData>,
}

impl SignatureCallback {
    pub fn from_json(body: &str) -> ApiResult<Self> {
        decode_callback(body)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackPhone {
    pub number: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackImage {
    pub side: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content: Option<String>,
}

/// Mistyped fields are dropped; only a body that is not a JSON object fails.
fn decode_callback<T: serde::de::DeserializeOwned>(body: &str) -> ApiResult<T> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))?;
    if !value.is_object() {
        return Err(ApiError::Deserialization(
            "callback body is not a JSON object".to_string(),
        ));
    }
    lenient(value).ok_or_else(|| {
        ApiError::Deserialization("callback body does not match the expected shape".to_string())
    })
}

/// Client for hosted verification and signature sessions.
#[derive(Debug, Clone)]
pub struct HostedSessionApi<T = UreqTransport> {
    api_key: String,
    company_name: String,
    endpoint: Endpoint,
    config: SessionConfig,
    transport: T,
}

impl HostedSessionApi<UreqTransport> {
    pub fn new(api_key: &str, company_name: &str, region: impl Into<Region>) -> ApiResult<Self> {
        Self::with_transport(api_key, company_name, region, UreqTransport::new())
    }

    pub fn from_options(options: &ClientOptions) -> ApiResult<Self> {
        Self::new(
            &options.api_key,
            options.company_name.as_deref().unwrap_or_default(),
            options.region.clone(),
        )
    }
}

impl<T: Transport> HostedSessionApi<T> {
    pub fn with_transport(
        api_key: &str,
        company_name: &str,
        region: impl Into<Region>,
        transport: T,
    ) -> ApiResult<Self> {
        require_api_key(api_key)?;
        if company_name.is_empty() {
            return Err(ApiError::validation("please provide your company name"));
        }
        Ok(Self {
            api_key: api_key.to_string(),
            company_name: company_name.to_string(),
            endpoint: Endpoint::new(&region.into(), SESSION_PATH),
            config: SessionConfig::default(),
            transport,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Restore every option to its default. API key, company name and
    /// endpoint stay.
    pub fn reset_config(&mut self) {
        self.config = SessionConfig::default();
    }

    /// Attempts the user gets before the session fails, 1 to 10.
    pub fn set_max_attempt(&mut self, max_attempt: u32) -> ApiResult<()> {
        validate::in_range(
            max_attempt,
            1,
            10,
            "invalid max attempt, please specify integer between 1 to 10",
        )?;
        self.config.max_attempt = max_attempt;
        Ok(())
    }

    /// Caller-side identifier echoed back in the callback.
    pub fn set_custom_id(&mut self, custom_id: &str) {
        self.config.custom_id = custom_id.to_string();
    }

    pub fn set_welcome_message(&mut self, message: &str) {
        self.config.welcome_message = message.to_string();
    }

    /// Replace the footer logo with the image at `url`.
    pub fn set_logo(&mut self, url: &str) {
        self.config.logo = url.to_string();
    }

    pub fn hide_branding_logo(&mut self, hide: bool) {
        self.config.no_branding = hide;
    }

    /// Replace the session page with a custom HTML/CSS template.
    pub fn set_custom_html(&mut self, url: &str) {
        self.config.custom_html_url = url.to_string();
    }

    /// Override the language detected from the user's device.
    pub fn set_language(&mut self, language: &str) {
        self.config.language = language.to_string();
    }

    /// Register the URL the service POSTs the outcome to. It must be an
    /// http(s) URL on a publicly reachable host.
    pub fn set_callback_url(&mut self, url: &str) -> ApiResult<()> {
        validate::callback_url(url)?;
        self.config.callback_url = url.to_string();
        Ok(())
    }

    /// Browser redirects after success or failure; either may be empty.
    pub fn set_redirect_url(&mut self, success_url: &str, fail_url: &str) -> ApiResult<()> {
        validate::optional_url(success_url, "success")?;
        validate::optional_url(fail_url, "fail")?;
        self.config.success_redirect = success_url.to_string();
        self.config.fail_redirect = fail_url.to_string();
        Ok(())
    }

    /// Check the document for tampering. Disabling resets the minimum score
    /// to 0 and leaves the module unchanged.
    pub fn enable_authentication(&mut self, enabled: bool, module: &str, min_score: f32) -> ApiResult<()> {
        if !enabled {
            self.config.authenticate_min_score = 0.0;
            return Ok(());
        }
        validate::unit_interval(min_score, "minimum score")?;
        let module = AuthModule::parse(module)?;
        self.config.authenticate_module = module;
        self.config.authenticate_min_score = min_score;
        Ok(())
    }

    /// Ask the user for a selfie photo or video. Disabling leaves the
    /// threshold unchanged.
    pub fn enable_face_verification(
        &mut self,
        enabled: bool,
        kind: FaceVerification,
        threshold: f32,
    ) -> ApiResult<()> {
        if !enabled {
            self.config.biometric = 0;
            return Ok(());
        }
        validate::unit_interval(threshold, "threshold")?;
        self.config.biometric = kind as u8;
        self.config.biometric_threshold = threshold;
        Ok(())
    }

    /// Allow many users to verify through the same link, each under a fresh reference.
    pub fn set_reusable(&mut self, enabled: bool) {
        self.config.reusable = enabled;
    }

    /// Attach the uploaded document and/or face image to the callback.
    pub fn set_callback_image(&mut self, send_document: bool, send_face: bool, format: ImageFormat) {
        self.config.return_document_image = send_document;
        self.config.return_face_image = send_face;
        self.config.return_type = format;
    }

    /// Colors are 6-digit hex without `#`; size and margin are 1 to 50.
    pub fn set_qr_code_format(&mut self, fore: &str, back: &str, size: u32, margin: u32) -> ApiResult<()> {
        validate::hex_color(fore, "foreground")?;
        validate::hex_color(back, "background")?;
        validate::in_range(size, 1, 50, "invalid image size; must be between 1 and 50")?;
        validate::in_range(margin, 1, 50, "invalid margin; must be between 1 and 50")?;
        self.config.qr_color = fore.to_string();
        self.config.qr_bg_color = back.to_string();
        self.config.qr_size = size;
        self.config.qr_margin = margin;
        Ok(())
    }

    pub fn enable_dual_side_check(&mut self, enabled: bool) {
        self.config.dual_side_check = enabled;
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

    /// Ask the user to enter a phone number for verification.
    pub fn enable_phone_verification(&mut self, enabled: bool) {
        self.config.phone_verification = enabled;
    }

    /// Text the session link to `number`. Each message costs one quota.
    pub fn sms_verification_link(&mut self, number: &str) {
        self.config.sms_verification_link = number.to_string();
    }

    pub fn sms_contract_link(&mut self, number: &str) {
        self.config.sms_contract_link = number.to_string();
    }

    /// Verify this number; the user cannot enter another one.
    pub fn verify_phone(&mut self, number: &str) {
        self.config.verify_phone = number.to_string();
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

    pub fn verify_dob(&mut self, dob: &str) -> ApiResult<()> {
        validate::date_of_birth(dob)?;
        self.config.verify_dob = dob.to_string();
        Ok(())
    }

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

    pub fn restrict_country(&mut self, country_codes: &str) {
        self.config.document_country = country_codes.to_string();
    }

    pub fn restrict_state(&mut self, states: &str) {
        self.config.document_region = states.to_string();
    }

    pub fn restrict_type(&mut self, document_types: &str) {
        self.config.document_type = document_types.to_string();
    }

    pub fn enable_vault(&mut self, enabled: bool) {
        self.config.vault_save = enabled;
    }

    /// Generate a contract from the verified data. Clears any pending
    /// [`sign_contract`](Self::sign_contract).
    pub fn generate_contract(
        &mut self,
        template_id: &str,
        format: &str,
        prefill_data: PrefillData,
    ) -> ApiResult<()> {
        let format = parse_contract(template_id, format)?;
        self.config.contract_generate = template_id.to_string();
        self.config.contract_sign.clear();
        self.config.contract_format = Some(format);
        self.config.contract_prefill_data = prefill_data;
        Ok(())
    }

    /// Have the user review and sign a contract after verification. Clears
    /// any pending [`generate_contract`](Self::generate_contract).
    pub fn sign_contract(
        &mut self,
        template_id: &str,
        format: &str,
        prefill_data: PrefillData,
    ) -> ApiResult<()> {
        let format = parse_contract(template_id, format)?;
        self.config.contract_generate.clear();
        self.config.contract_sign = template_id.to_string();
        self.config.contract_format = Some(format);
        self.config.contract_prefill_data = prefill_data;
        Ok(())
    }

    pub fn set_decode_mode(&mut self, mode: DecodeMode) {
        self.config.decode_mode = mode;
    }

    pub fn build_create(&self, kind: SessionKind) -> ApiResult<HttpRequest> {
        let mut payload = SessionRequest::from_config(&self.api_key, &self.company_name, &self.config);
        payload.kind = kind as u8;
        HttpRequest::post_json(self.endpoint.action("create"), &payload)
    }

    pub fn parse_create(&self, response: HttpResponse) -> ApiResult<SessionResponse> {
        normalize(response, self.config.decode_mode)
    }

    pub fn create(&self, kind: SessionKind) -> ApiResult<SessionResponse> {
        debug!(?kind, "creating session");
        let request = self.build_create(kind)?;
        self.parse_create(self.transport.execute(&request)?)
    }

    pub fn create_iframe(&self) -> ApiResult<SessionResponse> {
        self.create(SessionKind::IFrame)
    }

    pub fn create_mobile(&self) -> ApiResult<SessionResponse> {
        self.create(SessionKind::Mobile)
    }

    pub fn create_redirection(&self) -> ApiResult<SessionResponse> {
        self.create(SessionKind::Redirection)
    }

    pub fn create_live_mobile(&self) -> ApiResult<SessionResponse> {
        self.create(SessionKind::LiveMobile)
    }

    /// The signature request carries the current configuration with the
    /// template, format and prefill data given here. The format is sent as
    /// supplied.
    pub fn build_signature(
        &self,
        template_id: &str,
        format: &str,
        prefill_data: &PrefillData,
    ) -> ApiResult<HttpRequest> {
        let mut payload = SessionRequest::from_config(&self.api_key, &self.company_name, &self.config);
        payload.template_id = Some(template_id);
        payload.contract_format = format;
        payload.contract_prefill_data = prefill_data;
        HttpRequest::post_json(self.endpoint.action("sign"), &payload)
    }

    pub fn parse_signature(&self, response: HttpResponse) -> ApiResult<SignatureResponse> {
        normalize(response, self.config.decode_mode)
    }

    /// Start a session in which the user only reviews and signs a contract.
    pub fn create_signature(
        &self,
        template_id: &str,
        format: &str,
        prefill_data: &PrefillData,
    ) -> ApiResult<SignatureResponse> {
        let request = self.build_signature(template_id, format, prefill_data)?;
        self.parse_signature(self.transport.execute(&request)?)
    }

    pub fn build_validate(&self, reference: &str, hash: &str) -> ApiResult<HttpRequest> {
        let payload = ValidateRequest {
            apikey: &self.api_key,
            reference,
            hash,
            client: CLIENT_ID,
        };
        HttpRequest::post_json(self.endpoint.action("validate"), &payload)
    }

    pub fn parse_validate(&self, response: HttpResponse) -> ApiResult<bool> {
        let result: ValidationResponse = normalize(response, self.config.decode_mode)?;
        Ok(result.success.unwrap_or(false))
    }

    /// Ask the service whether `(reference, hash)` from a callback is genuine.
    pub fn validate(&self, reference: &str, hash: &str) -> ApiResult<bool> {
        let request = self.build_validate(reference, hash)?;
        self.parse_validate(self.transport.execute(&request)?)
    }
}

fn parse_contract(template_id: &str, format: &str) -> ApiResult<ContractFormat> {
    validate::template_id(template_id)?;
    ContractFormat::parse(format)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::testing::RecordingTransport;

    fn api(reply: &str) -> HostedSessionApi<RecordingTransport> {
        HostedSessionApi::with_transport("key", "ACME", "EU", RecordingTransport::replying(reply))
            .unwrap()
    }

    #[test]
    fn constructor_requires_key_and_company() {
        let err = HostedSessionApi::with_transport("", "ACME", "US", RecordingTransport::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "please provide an API key");
        let err = HostedSessionApi::with_transport("key", "", "US", RecordingTransport::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "please provide your company name");
    }

    #[test]
    fn create_sends_defaults_and_kind() {
        let api = api(r#"{"reference":"REF1","type":1,"url":"https://s/REF1"}"#);
        let resp = api.create_mobile().unwrap();
        assert_eq!(resp.reference.as_deref(), Some("REF1"));
        assert_eq!(resp.kind, Some(1));

        let req = api.transport.last();
        assert_eq!(req.url, "https://api.eu.example.com/docupass/create");
        let body = req.json();
        assert_eq!(body["apikey"], "key");
        assert_eq!(body["companyname"], "ACME");
        assert_eq!(body["type"], 1);
        assert_eq!(body["authenticate_module"], "2");
        assert_eq!(body["maxattempt"], 1);
        assert_eq!(body["qr_size"], 5);
        assert_eq!(body["qr_margin"], 1);
        assert_eq!(body["return_type"], 1);
        assert_eq!(body["return_documentimage"], true);
        assert_eq!(body["vault_save"], true);
        assert_eq!(body["verify_expiry"], false);
        assert_eq!(body["client"], "rust-sdk");
        assert!(body.get("template_id").is_none());
    }

    #[test]
    fn each_kind_has_its_code() {
        let api = api("{}");
        api.create_iframe().unwrap();
        assert_eq!(api.transport.last().json()["type"], 0);
        api.create_redirection().unwrap();
        assert_eq!(api.transport.last().json()["type"], 2);
        api.create_live_mobile().unwrap();
        assert_eq!(api.transport.last().json()["type"], 3);
    }

    #[test]
    fn max_attempt_bounds() {
        let mut api = api("{}");
        assert!(api.set_max_attempt(0).is_err());
        assert!(api.set_max_attempt(11).is_err());
        api.set_max_attempt(10).unwrap();
        assert_eq!(api.config().max_attempt, 10);
    }

    #[test]
    fn callback_url_guard() {
        let mut api = api("{}");
        for bad in [
            "http://localhost/cb",
            "http://127.0.0.1/cb",
            "http://10.0.0.5:8080/cb",
            "http://[::1]/cb",
        ] {
            let err = api.set_callback_url(bad).unwrap_err();
            assert_eq!(
                err.to_string(),
                "invalid URL, the host does not appear to be a remote host",
                "{bad}"
            );
        }
        assert_eq!(
            api.set_callback_url("ftp://example.com/cb").unwrap_err().to_string(),
            "invalid URL, only http and https protocols are allowed"
        );
        assert_eq!(api.config().callback_url, "");

        api.set_callback_url("https://hooks.example.com/idcheck").unwrap();
        assert_eq!(api.config().callback_url, "https://hooks.example.com/idcheck");
    }

    #[test]
    fn redirect_urls_may_be_empty() {
        let mut api = api("{}");
        api.set_redirect_url("https://example.com/ok", "").unwrap();
        let err = api.set_redirect_url("https://example.com/ok", "not a url").unwrap_err();
        assert_eq!(err.to_string(), "invalid URL format for fail URL");
        assert_eq!(api.config().success_redirect, "https://example.com/ok");
        assert_eq!(api.config().fail_redirect, "");
    }

    #[test]
    fn disabling_authentication_zeroes_min_score() {
        let mut api = api("{}");
        api.enable_authentication(true, "quick", 0.5).unwrap();
        assert_eq!(api.config().authenticate_min_score, 0.5);
        assert!(api.enable_authentication(true, "1", 1.5).is_err());
        assert!(api.enable_authentication(true, "9", 0.2).is_err());
        assert_eq!(api.config().authenticate_module, AuthModule::Quick);

        api.enable_authentication(false, "ignored", 9.0).unwrap();
        assert_eq!(api.config().authenticate_min_score, 0.0);
        assert_eq!(api.config().authenticate_module, AuthModule::Quick);
    }

    #[test]
    fn face_verification_toggles_biometric() {
        let mut api = api("{}");
        api.enable_face_verification(true, FaceVerification::Video, 0.0).unwrap();
        assert_eq!(api.config().biometric, 2);
        assert_eq!(api.config().biometric_threshold, 0.0);
        assert!(api
            .enable_face_verification(true, FaceVerification::Photo, 1.1)
            .is_err());
        assert_eq!(api.config().biometric, 2);

        api.enable_face_verification(false, FaceVerification::Photo, 0.9).unwrap();
        assert_eq!(api.config().biometric, 0);
        assert_eq!(api.config().biometric_threshold, 0.0);
    }

    #[test]
    fn qr_code_format_is_all_or_nothing() {
        let mut api = api("{}");
        assert_eq!(
            api.set_qr_code_format("00ff00", "zzzzzz", 5, 1).unwrap_err().to_string(),
            "invalid background color HEX code"
        );
        assert_eq!(
            api.set_qr_code_format("00ff00", "FFFFFF", 51, 1).unwrap_err().to_string(),
            "invalid image size; must be between 1 and 50"
        );
        assert_eq!(api.config().qr_color, "");

        api.set_qr_code_format("00ff00", "FFFFFF", 10, 2).unwrap();
        let body = api.build_create(SessionKind::Mobile).unwrap().json();
        assert_eq!(body["qr_color"], "00ff00");
        assert_eq!(body["qr_bgcolor"], "FFFFFF");
        assert_eq!(body["qr_size"], 10);
        assert_eq!(body["qr_margin"], 2);
    }

    #[test]
    fn contract_modes_are_exclusive() {
        let mut api = api("{}");
        api.generate_contract("tpl-gen", "PDF", PrefillData::new()).unwrap();
        api.sign_contract("tpl-sign", "HTML", PrefillData::new()).unwrap();
        assert_eq!(api.config().contract_generate, "");
        assert_eq!(api.config().contract_sign, "tpl-sign");

        api.generate_contract("tpl-gen", "DOCX", PrefillData::new()).unwrap();
        assert_eq!(api.config().contract_sign, "");
        let body = api.build_create(SessionKind::IFrame).unwrap().json();
        assert_eq!(body["contract_generate"], "tpl-gen");
        assert_eq!(body["contract_sign"], "");
        assert_eq!(body["contract_format"], "DOCX");
    }

    #[test]
    fn callback_image_format() {
        let mut api = api("{}");
        api.set_callback_image(false, true, ImageFormat::Url);
        let body = api.build_create(SessionKind::IFrame).unwrap().json();
        assert_eq!(body["return_documentimage"], false);
        assert_eq!(body["return_faceimage"], true);
        assert_eq!(body["return_type"], 0);
    }

    #[test]
    fn reset_keeps_identity() {
        let mut api = api("{}");
        api.set_custom_id("user-7");
        api.restrict_country("GB");
        api.reset_config();
        assert_eq!(api.config(), &SessionConfig::default());
        let body = api.build_create(SessionKind::IFrame).unwrap().json();
        assert_eq!(body["companyname"], "ACME");
        assert_eq!(body["customid"], "");
        assert_eq!(body["documentcountry"], "");
    }

    #[test]
    fn signature_overrides_contract_fields() {
        let api = api(r#"{"reference":"S1","html_iframe":"<iframe>"}"#);
        let prefill = json!({"name": "Ann"}).as_object().cloned().unwrap();
        let resp = api.create_signature("tpl-1", "PDF", &prefill).unwrap();
        assert_eq!(resp.html_iframe.as_deref(), Some("<iframe>"));

        let req = api.transport.last();
        assert_eq!(req.url, "https://api.eu.example.com/docupass/sign");
        let body = req.json();
        assert_eq!(body["template_id"], "tpl-1");
        assert_eq!(body["contract_format"], "PDF");
        assert_eq!(body["contract_prefill_data"]["name"], "Ann");
        assert_eq!(body["companyname"], "ACME");
    }

    #[test]
    fn validate_payload_and_result() {
        let accepting = api(r#"{"success":true,"reference":"REF1"}"#);
        assert!(accepting.validate("REF1", "abc").unwrap());
        let req = accepting.transport.last();
        assert_eq!(req.url, "https://api.eu.example.com/docupass/validate");
        assert_eq!(
            req.json(),
            json!({"apikey":"key","reference":"REF1","hash":"abc","client":"rust-sdk"})
        );

        let rejecting = api("{}");
        assert!(!rejecting.validate("REF1", "forged").unwrap());
    }

    #[test]
    fn identity_callback_decodes_permissively() {
        let callback = IdentityCallback::from_json(
            r#"{"success":true,"reference":"REF1","hash":"h","customid":"user-7",
                "data":{"firstName":"ANN","unknownKey":1},
                "phone":{"number":"+15550100","type":"mobile"},
                "documentimage":[{"side":"front","type":"base64","content":"AAA"}],
                "aml":[{"entity":"person","fullname":["ANN"]}]}"#,
        )
        .unwrap();
        assert_eq!(callback.success, Some(true));
        assert_eq!(callback.data.unwrap().first_name.as_deref(), Some("ANN"));
        assert_eq!(callback.phone.unwrap().kind.as_deref(), Some("mobile"));
        assert_eq!(callback.documentimage[0].side.as_deref(), Some("front"));
        assert_eq!(callback.aml.len(), 1);
        assert!(callback.faceimage.is_empty());
        assert!(callback.vaultid.is_none());
    }

    #[test]
    fn callback_with_mistyped_fields_keeps_the_rest() {
        let callback = SignatureCallback::from_json(
            r#"{"success":false,"reference":"S1","failreason":"declined","failcode":7}"#,
        )
        .unwrap();
        assert_eq!(callback.reference.as_deref(), Some("S1"));
        assert_eq!(callback.failreason.as_deref(), Some("declined"));
        assert!(callback.failcode.is_none());

        let callback = IdentityCallback::from_json(
            r#"{"success":true,"reference":"REF1","data":{"firstName":"ANN","age":"old"}}"#,
        )
        .unwrap();
        assert_eq!(callback.data.unwrap().first_name.as_deref(), Some("ANN"));

        assert!(IdentityCallback::from_json("[1]").is_err());
        assert!(IdentityCallback::from_json("not json").is_err());
    }

    #[test]
    fn signature_callback_decodes() {
        let callback = SignatureCallback::from_json(
            r#"{"success":false,"reference":"S1","failreason":"declined","failcode":"7"}"#,
        )
        .unwrap();
        assert_eq!(callback.success, Some(false));
        assert_eq!(callback.failcode.as_deref(), Some("7"));
        assert!(SignatureCallback::from_json("not json").is_err());
    }
}
