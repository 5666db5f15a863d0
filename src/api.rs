//! Request validation and JSON response shaping for the conversion API.
//!
//! Requests arrive as `?action=...` query parameters. Everything here is
//! independent of the HTTP stack serving them.

use crate::core::engine::RateEngine;
use crate::core::error::RateError;
use crate::core::forex::RatePoint;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    List,
    Convert {
        amount: Decimal,
        from: String,
        to: String,
    },
    Rates {
        base: String,
    },
    Historical {
        from: String,
        to: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl ApiRequest {
    pub fn action(&self) -> &'static str {
        match self {
            ApiRequest::List => "list",
            ApiRequest::Convert { .. } => "convert",
            ApiRequest::Rates { .. } => "rates",
            ApiRequest::Historical { .. } => "historical",
        }
    }

    /// Validates raw query parameters. Nothing is looked up yet.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, ApiError> {
        let action = params.get("action").ok_or(ApiError::MissingAction)?;

        let required = |param: &'static str| {
            params
                .get(param)
                .map(|v| v.trim())
                .ok_or_else(|| ApiError::MissingParameter {
                    action: action.clone(),
                    param,
                })
        };

        match action.as_str() {
            "list" => Ok(ApiRequest::List),
            "convert" => {
                let amount = required("amount")?;
                let from = required("from")?.to_uppercase();
                let to = required("to")?.to_uppercase();
                Ok(ApiRequest::Convert {
                    amount: parse_amount(amount)?,
                    from,
                    to,
                })
            }
            "rates" => Ok(ApiRequest::Rates {
                base: required("base")?.to_uppercase(),
            }),
            "historical" => {
                let from = required("from")?.to_uppercase();
                let to = required("to")?.to_uppercase();
                let start = required("start")?;
                let end = required("end")?;
                let (start, end) = match (parse_iso_date(start), parse_iso_date(end)) {
                    (Some(start), Some(end)) => (start, end),
                    _ => return Err(ApiError::MalformedDate),
                };
                if start > end {
                    return Err(RateError::InvalidDateRange { start, end }.into());
                }
                Ok(ApiRequest::Historical {
                    from,
                    to,
                    start,
                    end,
                })
            }
            other => Err(ApiError::UnknownAction(other.to_string())),
        }
    }
}

fn parse_amount(raw: &str) -> Result<Decimal, ApiError> {
    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| RateError::InvalidAmount)?;
    if amount <= Decimal::ZERO {
        return Err(RateError::InvalidAmount.into());
    }
    Ok(amount)
}

/// Strict `YYYY-MM-DD` that is also a real calendar day.
fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Missing required parameter: 'action'. Available actions: list, convert, rates, historical")]
    MissingAction,

    #[error("Unknown action: '{0}'. Available actions: list, convert, rates, historical")]
    UnknownAction(String),

    #[error("Missing required parameter: '{param}' for action '{action}'.")]
    MissingParameter { action: String, param: &'static str },

    #[error("Invalid date format. Use YYYY-MM-DD for 'start' and 'end' parameters.")]
    MalformedDate,

    #[error("Failed to encode response: {0}")]
    Encoding(String),

    #[error(transparent)]
    Rate(#[from] RateError),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MissingAction | ApiError::MissingParameter { .. } | ApiError::MalformedDate => {
                400
            }
            ApiError::UnknownAction(_) => 404,
            ApiError::Encoding(_) => 500,
            ApiError::Rate(e) => e.status_code(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ConversionData {
    from: String,
    to: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    result: Decimal,
}

#[derive(Debug, Clone, Serialize)]
struct HistoricalData {
    from: String,
    to: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    rates: Vec<RatePoint>,
}

/// A status code plus the JSON envelope to send back.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct Api {
    engine: Arc<RateEngine>,
    debug: bool,
}

impl Api {
    pub fn new(engine: Arc<RateEngine>, debug: bool) -> Self {
        Self { engine, debug }
    }

    /// Validates and serves one request given as query parameters.
    pub async fn handle_query(
        &self,
        params: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> ApiResponse {
        match ApiRequest::from_query(params) {
            Ok(request) => self.handle(request, now).await,
            Err(e) => self.failure(e),
        }
    }

    pub async fn handle(&self, request: ApiRequest, now: DateTime<Utc>) -> ApiResponse {
        let action = request.action();
        debug!(?request, "Handling API request");

        match self.dispatch(request, now).await {
            Ok(data) => ApiResponse {
                status: 200,
                body: json!({
                    "success": true,
                    "action": action,
                    "data": data,
                }),
            },
            Err(e) => self.failure(e),
        }
    }

    async fn dispatch(&self, request: ApiRequest, now: DateTime<Utc>) -> Result<Value, ApiError> {
        match request {
            ApiRequest::List => encode(&self.engine.list_currencies().await?),
            ApiRequest::Convert { amount, from, to } => {
                let result = self.engine.convert(amount, &from, &to).await?;
                encode(&ConversionData {
                    from,
                    to,
                    amount,
                    result,
                })
            }
            ApiRequest::Rates { base } => encode(&self.engine.get_rates(&base, now).await?),
            ApiRequest::Historical {
                from,
                to,
                start,
                end,
            } => {
                let rates = self
                    .engine
                    .get_historical_rates(&from, &to, start, end)
                    .await?;
                encode(&HistoricalData {
                    from,
                    to,
                    start_date: start,
                    end_date: end,
                    rates,
                })
            }
        }
    }

    fn failure(&self, error: ApiError) -> ApiResponse {
        let status = error.status_code();
        let cause = match &error {
            ApiError::Rate(e) => e.cause(),
            _ => None,
        };
        if status >= 500 {
            warn!(status, cause = cause.unwrap_or_default(), "API request failed: {error}");
        } else {
            debug!(status, "API request rejected: {error}");
        }

        let message = match cause {
            Some(cause) if self.debug => format!("{error}: {cause}"),
            _ => error.to_string(),
        };

        ApiResponse {
            status,
            body: json!({
                "success": false,
                "error": {
                    "code": status,
                    "message": message,
                },
            }),
        }
    }
}

fn encode<T: Serialize>(data: &T) -> Result<Value, ApiError> {
    serde_json::to_value(data).map_err(|e| ApiError::Encoding(e.to_string()))
}
