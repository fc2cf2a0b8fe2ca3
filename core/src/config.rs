//! Options shared by every façade.

use std::env;

use crate::endpoint::Region;
use crate::error::ApiError;

/// Value stamped into every request's `client` field.
pub const CLIENT_ID: &str = "rust-sdk";

/// How response bodies that do not decode are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// An undecodable body yields the result type's default value.
    #[default]
    Permissive,
    /// An undecodable body is reported as [`ApiError::Deserialization`].
    Strict,
}

/// Document authentication module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthModule {
    One,
    Two,
    Quick,
}

impl AuthModule {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "1" => Ok(AuthModule::One),
            "2" => Ok(AuthModule::Two),
            "quick" => Ok(AuthModule::Quick),
            _ => Err(ApiError::validation(
                r#"invalid authentication module; "1", "2" or "quick" accepted"#,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthModule::One => "1",
            AuthModule::Two => "2",
            AuthModule::Quick => "quick",
        }
    }
}

/// Output file format of a generated contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractFormat {
    Pdf,
    Docx,
    Html,
}

impl ContractFormat {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "PDF" => Ok(ContractFormat::Pdf),
            "DOCX" => Ok(ContractFormat::Docx),
            "HTML" => Ok(ContractFormat::Html),
            _ => Err(ApiError::validation(
                r#"invalid format; must be "PDF", "DOCX", or "HTML""#,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractFormat::Pdf => "PDF",
            ContractFormat::Docx => "DOCX",
            ContractFormat::Html => "HTML",
        }
    }
}

/// Wire form of an optional contract format: empty when unset.
pub(crate) fn contract_format_str(format: Option<ContractFormat>) -> &'static str {
    format.map(|f| f.as_str()).unwrap_or("")
}

/// Data used to autofill dynamic fields in a contract template.
pub type PrefillData = serde_json::Map<String, serde_json::Value>;

/// Credentials and region, usually read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub api_key: String,
    pub region: Region,
    pub company_name: Option<String>,
}

impl ClientOptions {
    pub fn new(api_key: impl Into<String>, region: Region) -> Self {
        Self {
            api_key: api_key.into(),
            region,
            company_name: None,
        }
    }

    /// Reads `IDCHECK_API_KEY` (required), `IDCHECK_REGION` and
    /// `IDCHECK_COMPANY_NAME` (optional).
    pub fn from_env() -> Result<Self, ApiError> {
        let api_key = env::var("IDCHECK_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ApiError::validation("IDCHECK_API_KEY is not set"))?;
        let region = env::var("IDCHECK_REGION")
            .map(|r| Region::from(r.trim()))
            .unwrap_or_default();
        let company_name = env::var("IDCHECK_COMPANY_NAME")
            .ok()
            .filter(|name| !name.trim().is_empty());

        Ok(Self {
            api_key,
            region,
            company_name,
        })
    }
}

pub(crate) fn require_api_key(api_key: &str) -> Result<(), ApiError> {
    if api_key.is_empty() {
        Err(ApiError::validation("please provide an API key"))
    } else {
        Ok(())
    }
}
