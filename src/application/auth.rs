use crate::error::{CalculationError, Result};
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;
use tracing::debug;

const CLAIMS_CONFIG: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, CLAIMS_CONFIG);
const URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, CLAIMS_CONFIG);

/// Base64 of `{"alg":"HS256","typ":"JWT"}`.
const CREDENTIAL_HEADER: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
const UNSIGNED: &str = "unsigned";

#[derive(Deserialize)]
struct Claims {
    plan: Option<String>,
}

/// Checks that a bearer credential grants a plan.
///
/// This is a capability check on the decoded claims only. The signature segment
/// is never verified; integrity has to be established upstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct Authorizer;

impl Authorizer {
    pub fn new() -> Self {
        Self
    }

    /// Returns true when the credential's claims carry `required_plan`.
    ///
    /// Fails closed: fewer than two segments, an undecodable middle segment or
    /// claims without a matching `plan` all deny.
    pub fn authorize(&self, credential: &str, required_plan: &str) -> bool {
        let segments: Vec<&str> = credential.split('.').collect();
        if segments.len() < 2 {
            debug!("credential has fewer than two segments");
            return false;
        }

        let claims = match decode_segment(segments[1]) {
            Some(claims) => claims,
            None => {
                debug!("credential claims segment is not decodable");
                return false;
            }
        };
        debug!(claims = %claims, "validating credential claims");

        let required = required_plan.to_uppercase();
        match serde_json::from_str::<Claims>(&claims) {
            Ok(Claims { plan: Some(plan) }) => plan == required,
            _ => false,
        }
    }
}

fn decode_segment(segment: &str) -> Option<String> {
    let bytes = STANDARD
        .decode(segment)
        .or_else(|_| URL_SAFE.decode(segment))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Extracts the credential from an `Authorization: Bearer <credential>` header value.
pub fn bearer_credential(header: Option<&str>) -> Result<&str> {
    let header = header.ok_or_else(|| {
        CalculationError::Unauthorized("Bearer authorization header is required".to_string())
    })?;
    match header.strip_prefix("Bearer ") {
        Some(credential) if !credential.trim().is_empty() => Ok(credential.trim()),
        _ => Err(CalculationError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}

/// Builds an unsigned credential whose claims grant `plan` to `user`.
pub fn issue_credential(user: &str, plan: &str) -> String {
    let claims = serde_json::json!({
        "user": user,
        "plan": plan.to_uppercase(),
    });
    let payload = base64::engine::general_purpose::STANDARD.encode(claims.to_string());
    format!("{}.{}.{}", CREDENTIAL_HEADER, payload, UNSIGNED)
}
