//! Request and response payloads exchanged with the backend

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest<'a> {
    pub email: &'a str,
}

/// Token pair issued by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginTokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Deserialize)]
struct LoginEnvelope {
    #[serde(default)]
    token: Option<LoginTokens>,
}

impl LoginTokens {
    /// Extract `token.access` and `token.refresh` from a login response.
    ///
    /// Returns `None` unless both are present as non-empty strings.
    pub fn from_response(body: &Value) -> Option<Self> {
        let envelope = LoginEnvelope::deserialize(body).ok()?;
        envelope
            .token
            .filter(|t| !t.access.is_empty() && !t.refresh.is_empty())
    }
}

/// Community flood observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrowdsourceReport {
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown urgency '{other}', expected low, medium or high")),
        }
    }
}

/// Request for rescue or assistance at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Serialize)]
pub struct BroadcastAlert<'a> {
    pub message: &'a str,
    pub area: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_tokens_from_nested_response() {
        let body = json!({"token": {"access": "A", "refresh": "R"}, "msg": "Login Success"});
        assert_eq!(
            LoginTokens::from_response(&body),
            Some(LoginTokens {
                access: "A".into(),
                refresh: "R".into()
            })
        );
    }

    #[test]
    fn login_tokens_require_both_halves() {
        assert_eq!(
            LoginTokens::from_response(&json!({"token": {"access": "A"}})),
            None
        );
        assert_eq!(
            LoginTokens::from_response(&json!({"token": {"access": "A", "refresh": ""}})),
            None
        );
        assert_eq!(
            LoginTokens::from_response(&json!({"token": {"access": 1, "refresh": "R"}})),
            None
        );
        assert_eq!(LoginTokens::from_response(&json!({"msg": "ok"})), None);
        assert_eq!(LoginTokens::from_response(&json!([])), None);
    }

    #[test]
    fn crowdsource_report_uses_camel_case() {
        let report = CrowdsourceReport {
            latitude: 23.7,
            longitude: 90.4,
            description: "Road flooded".into(),
            image_url: Some("https://img.example/1.jpg".into()),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["imageUrl"], "https://img.example/1.jpg");

        let without_image = CrowdsourceReport {
            image_url: None,
            ..report
        };
        let value = serde_json::to_value(&without_image).unwrap();
        assert!(value.get("imageUrl").is_none());
    }

    #[test]
    fn urgency_parses_and_serializes_lowercase() {
        assert_eq!("HIGH".parse::<Urgency>(), Ok(Urgency::High));
        assert!("urgent".parse::<Urgency>().is_err());
        assert_eq!(serde_json::to_value(Urgency::Medium).unwrap(), json!("medium"));
        assert_eq!(Urgency::Low.to_string(), "low");
    }
}
