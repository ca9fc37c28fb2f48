use crate::domain::request::CalculationRequest;
use crate::error::{CalculationError, Result};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use uuid::Uuid;

/// Turns untrusted input into a [`CalculationRequest`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestParser;

impl RequestParser {
    /// Parses a JSON payload carrying `clientId`, `grossAmount` and `plan`.
    ///
    /// `grossAmount` may be quoted or a bare JSON number; bare numbers keep
    /// their literal digits and never pass through a float.
    pub fn parse(payload: &[u8]) -> Result<CalculationRequest> {
        let fields: Map<String, Value> = serde_json::from_slice(payload)
            .map_err(|e| CalculationError::MalformedRequest(e.to_string()))?;

        let client_id = text_field(&fields, "clientId")?;
        let gross_amount = match fields.get("grossAmount") {
            None | Some(Value::Null) => return Err(missing("grossAmount")),
            Some(Value::String(text)) => text.clone(),
            Some(Value::Number(number)) => number.to_string(),
            Some(_) => return Err(wrong_type("grossAmount", "a decimal string or number")),
        };
        let plan = text_field(&fields, "plan")?;

        Self::from_fields(client_id, &gross_amount, plan)
    }

    /// Validates already separated fields, e.g. one row of a batch file.
    pub fn from_fields(client_id: &str, gross_amount: &str, plan: &str) -> Result<CalculationRequest> {
        let client_id = Uuid::parse_str(client_id.trim()).map_err(|e| {
            CalculationError::MalformedRequest(format!("clientId is not a valid UUID: {}", e))
        })?;
        let gross_amount = gross_amount.trim();
        let gross_amount = Decimal::from_str(gross_amount)
            .or_else(|_| Decimal::from_scientific(gross_amount))
            .map_err(|e| {
                CalculationError::MalformedRequest(format!(
                    "grossAmount is not a valid decimal: {}",
                    e
                ))
            })?;
        let plan = plan.trim();
        if plan.is_empty() {
            return Err(CalculationError::MalformedRequest(
                "plan must not be blank".to_string(),
            ));
        }

        Ok(CalculationRequest::new(client_id, gross_amount, plan.to_string()))
    }
}

fn text_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(missing(name)),
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(wrong_type(name, "a string")),
    }
}

fn missing(field: &str) -> CalculationError {
    CalculationError::MalformedRequest(format!("missing required field: {}", field))
}

fn wrong_type(field: &str, expected: &str) -> CalculationError {
    CalculationError::MalformedRequest(format!("{} must be {}", field, expected))
}
