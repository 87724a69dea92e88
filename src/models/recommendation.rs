use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shape every element of the agent's answer must have
///
/// Only used to validate records; the records themselves are returned as the
/// agent wrote them, extra fields and explicit nulls included.
#[derive(Debug, Deserialize)]
pub struct Recommendation {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(rename = "type")]
    pub content_type: String,
    pub reason: String,
}

/// Body returned by the recommendations endpoint
///
/// `raw` is set when the agent answered but not in the expected shape;
/// `error` is set when no usable answer was produced at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecommendationResponse {
    pub fn parsed(recommendations: Vec<Value>) -> Self {
        Self {
            recommendations,
            raw: None,
            error: None,
        }
    }

    pub fn degraded(raw: impl Into<String>) -> Self {
        Self {
            recommendations: Vec::new(),
            raw: Some(raw.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            recommendations: Vec::new(),
            raw: None,
            error: Some(error.into()),
        }
    }
}
