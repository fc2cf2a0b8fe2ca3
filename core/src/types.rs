//! Result shapes shared by several façades.
//!
//! Every field is optional: `None` means the service did not send the key,
//! which is different from an explicit zero, `false` or empty string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identity fields read from a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityData {
    pub document_number: Option<String>,
    pub personal_number: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    #[serde(rename = "firstName_local")]
    pub first_name_local: Option<String>,
    #[serde(rename = "middleName_local")]
    pub middle_name_local: Option<String>,
    #[serde(rename = "lastName_local")]
    pub last_name_local: Option<String>,
    #[serde(rename = "fullName_local")]
    pub full_name_local: Option<String>,
    pub dob: Option<String>,
    #[serde(rename = "dob_day")]
    pub dob_day: Option<u32>,
    #[serde(rename = "dob_month")]
    pub dob_month: Option<u32>,
    #[serde(rename = "dob_year")]
    pub dob_year: Option<u32>,
    pub expiry: Option<String>,
    #[serde(rename = "expiry_day")]
    pub expiry_day: Option<u32>,
    #[serde(rename = "expiry_month")]
    pub expiry_month: Option<u32>,
    #[serde(rename = "expiry_year")]
    pub expiry_year: Option<u32>,
    pub issued: Option<String>,
    #[serde(rename = "issued_day")]
    pub issued_day: Option<u32>,
    #[serde(rename = "issued_month")]
    pub issued_month: Option<u32>,
    #[serde(rename = "issued_year")]
    pub issued_year: Option<u32>,
    /// The service spells this key `daysToExipry`.
    #[serde(rename = "daysToExipry")]
    pub days_to_expiry: Option<i64>,
    pub days_from_issue: Option<i64>,
    pub age: Option<u32>,
    pub sex: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub hair_color: Option<String>,
    pub eye_color: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub postcode: Option<String>,
    pub place_of_birth: Option<String>,
    pub document_side: Option<String>,
    pub document_type: Option<String>,
    pub document_name: Option<String>,
    #[serde(rename = "issuerOrg_region_full")]
    pub issuer_org_region_full: Option<String>,
    #[serde(rename = "issuerOrg_region_abbr")]
    pub issuer_org_region_abbr: Option<String>,
    #[serde(rename = "issuerOrg_full")]
    pub issuer_org_full: Option<String>,
    #[serde(rename = "issuerOrg_iso2")]
    pub issuer_org_iso2: Option<String>,
    #[serde(rename = "issuerOrg_iso3")]
    pub issuer_org_iso3: Option<String>,
    #[serde(rename = "nationality_full")]
    pub nationality_full: Option<String>,
    #[serde(rename = "nationality_iso2")]
    pub nationality_iso2: Option<String>,
    #[serde(rename = "nationality_iso3")]
    pub nationality_iso3: Option<String>,
    pub vehicle_class: Option<String>,
    pub restrictions: Option<String>,
    pub endorsement: Option<String>,
    pub optional_data: Option<String>,
    pub optional_data2: Option<String>,
    pub internal_id: Option<String>,
}

/// Per-field OCR confidence, keyed like [`IdentityData`]'s wire names.
pub type Confidence = BTreeMap<String, f32>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractData {
    pub document_url: Option<String>,
    pub error: Option<String>,
}

/// Face comparison outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceData {
    #[serde(rename = "isIdentical")]
    pub is_identical: Option<bool>,
    pub confidence: Option<f32>,
    pub error: Option<u32>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationData {
    pub passed: Option<bool>,
    pub result: Option<VerificationChecks>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationChecks {
    pub checkdigit: Option<bool>,
    pub face: Option<bool>,
    pub notexpired: Option<bool>,
    #[serde(rename = "documentNumber")]
    pub document_number: Option<bool>,
    pub name: Option<bool>,
    pub age: Option<bool>,
    pub dob: Option<bool>,
    pub address: Option<bool>,
    pub postcode: Option<bool>,
    pub cccode: Option<bool>,
}

/// Document authenticity assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationData {
    pub score: Option<f32>,
    pub breakdown: Option<AuthenticationBreakdown>,
    pub warning: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationBreakdown {
    pub data_visibility: Option<BreakdownSection>,
    pub image_quality: Option<BreakdownSection>,
    pub feature_referencing: Option<BreakdownSection>,
    pub exif_check: Option<BreakdownSection>,
    pub publicity_check: Option<BreakdownSection>,
    pub text_analysis: Option<BreakdownSection>,
    pub biometric_analysis: Option<BreakdownSection>,
    pub security_feature_check: Option<BreakdownSection>,
    pub recapture_check: Option<BreakdownSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakdownSection {
    pub passed: Option<bool>,
    pub code: Option<u32>,
    pub reason: Option<String>,
    pub severity: Option<String>,
}
