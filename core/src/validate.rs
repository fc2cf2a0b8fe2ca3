//! Set-time validation shared by the façade setters.
//!
//! Every function here is pure: it inspects the candidate value and returns
//! an [`ApiError::Validation`] describing the problem, so setters can check
//! everything before assigning anything.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use url::{Host, Url};

use crate::address::{AddressPolicy, DefaultAddressPolicy};
use crate::error::ApiError;

static AGE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-\d+$").expect("Invalid regex"));
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}/\d{2}/\d{2}$").expect("Invalid regex"));
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]{6}$").expect("Invalid regex"));
static PASSCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}").expect("Invalid regex"));

/// `minAge-maxAge`; empty clears the check.
pub fn age_range(range: &str) -> Result<(), ApiError> {
    if range.is_empty() || AGE_RANGE.is_match(range) {
        Ok(())
    } else {
        Err(ApiError::validation("invalid age range format (minAge-maxAge)"))
    }
}

/// Strict `YYYY/MM/DD` naming a real calendar date; empty clears the check.
pub fn date_of_birth(date: &str) -> Result<(), ApiError> {
    if date.is_empty() {
        return Ok(());
    }
    if DATE.is_match(date) && NaiveDate::parse_from_str(date, "%Y/%m/%d").is_ok() {
        Ok(())
    } else {
        Err(ApiError::validation("invalid birthday format (YYYY/MM/DD)"))
    }
}

pub fn hex_color(color: &str, which: &str) -> Result<(), ApiError> {
    if HEX_COLOR.is_match(color) {
        Ok(())
    } else {
        Err(ApiError::validation(format!("invalid {which} color HEX code")))
    }
}

/// Video verification passcodes must start with four digits.
pub fn video_passcode(passcode: &str) -> Result<(), ApiError> {
    if PASSCODE.is_match(passcode) {
        Ok(())
    } else {
        Err(ApiError::validation(
            "please provide a 4 digit passcode for video biometric verification",
        ))
    }
}

pub fn unit_interval(value: f32, what: &str) -> Result<(), ApiError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "invalid {what}; please specify float between 0 to 1"
        )))
    }
}

pub fn in_range(value: u32, min: u32, max: u32, message: &str) -> Result<(), ApiError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::validation(message))
    }
}

pub fn template_id(template_id: &str) -> Result<(), ApiError> {
    if template_id.is_empty() {
        Err(ApiError::validation("invalid template ID"))
    } else {
        Ok(())
    }
}

/// Absolute URL, or empty.
pub fn optional_url(url: &str, which: &str) -> Result<(), ApiError> {
    if url.is_empty() || Url::parse(url).is_ok() {
        Ok(())
    } else {
        Err(ApiError::validation(format!("invalid URL format for {which} URL")))
    }
}

/// A URL the remote service must be able to POST to: http(s), and a host
/// that is neither `localhost` nor an internal address.
pub fn callback_url(callback: &str) -> Result<(), ApiError> {
    callback_url_with(callback, &DefaultAddressPolicy::default())
}

/// `localhost`, its fully qualified form and any subdomain of it.
fn is_localhost(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain).to_ascii_lowercase();
    domain == "localhost" || domain.ends_with(".localhost")
}

pub fn callback_url_with(callback: &str, policy: &dyn AddressPolicy) -> Result<(), ApiError> {
    let uri = Url::parse(callback).map_err(|_| ApiError::validation("invalid URL format"))?;

    let internal = match uri.host() {
        Some(Host::Ipv4(ip)) => policy.is_internal(ip.into()),
        Some(Host::Ipv6(ip)) => policy.is_internal(ip.into()),
        Some(Host::Domain(domain)) => is_localhost(domain),
        None => true,
    };
    if internal {
        return Err(ApiError::validation(
            "invalid URL, the host does not appear to be a remote host",
        ));
    }
    if uri.scheme() != "http" && uri.scheme() != "https" {
        return Err(ApiError::validation(
            "invalid URL, only http and https protocols are allowed",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::CidrTableAddressPolicy;

    #[test]
    fn age_range_pattern() {
        assert!(age_range("18-120").is_ok());
        assert!(age_range("").is_ok());
        assert!(age_range("eighteen-120").is_err());
        assert!(age_range("18-").is_err());
        assert!(age_range("18 - 120").is_err());
    }

    #[test]
    fn dob_requires_real_calendar_date() {
        assert!(date_of_birth("1990/01/31").is_ok());
        assert!(date_of_birth("").is_ok());
        assert!(date_of_birth("1990/02/30").is_err());
        assert!(date_of_birth("1990/1/31").is_err());
        assert!(date_of_birth("1990-01-31").is_err());
        assert!(date_of_birth("31/01/1990").is_err());
    }

    #[test]
    fn hex_color_is_six_digits() {
        assert!(hex_color("00ff7A", "foreground").is_ok());
        assert!(hex_color("fff", "foreground").is_err());
        assert!(hex_color("gggggg", "background").is_err());
        assert!(hex_color("#00ff7a", "background").is_err());
    }

    #[test]
    fn passcode_needs_four_leading_digits() {
        assert!(video_passcode("1234").is_ok());
        assert!(video_passcode("12345abc").is_ok());
        assert!(video_passcode("123").is_err());
        assert!(video_passcode("").is_err());
        assert!(video_passcode("a1234").is_err());
    }

    #[test]
    fn callback_rejects_internal_hosts() {
        for bad in [
            "http://127.0.0.1/hook",
            "http://127.0.0.1:8080/hook",
            "https://localhost/hook",
            "https://LOCALHOST/hook",
            "http://localhost./hook",
            "http://foo.localhost/hook",
            "http://api.LocalHost./hook",
            "http://10.0.0.5/hook",
            "http://[::1]/hook",
            "http://[fe80::1]/hook",
            "http://169.254.169.254/latest",
        ] {
            assert!(callback_url(bad).is_err(), "{bad} should be rejected");
            assert!(
                callback_url_with(bad, &CidrTableAddressPolicy).is_err(),
                "{bad} should be rejected by the table policy"
            );
        }
    }

    #[test]
    fn callback_rejects_other_schemes_and_garbage() {
        assert!(callback_url("ftp://example.com/hook").is_err());
        assert!(callback_url("not a url").is_err());
        assert!(callback_url("/relative/hook").is_err());
    }

    #[test]
    fn callback_accepts_public_hosts() {
        assert!(callback_url("https://example.com/hook").is_ok());
        assert!(callback_url("http://93.184.216.34/hook").is_ok());
        assert!(callback_url("https://localhost.example.com/hook").is_ok());
        assert!(callback_url("https://mylocalhost/hook").is_ok());
    }

    #[test]
    fn ranges() {
        assert!(unit_interval(0.0, "threshold").is_ok());
        assert!(unit_interval(1.0, "threshold").is_ok());
        assert!(unit_interval(1.01, "threshold").is_err());
        assert!(unit_interval(f32::NAN, "threshold").is_err());
        assert!(in_range(10, 1, 10, "x").is_ok());
        assert!(in_range(0, 1, 10, "x").is_err());
    }
}
