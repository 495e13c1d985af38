//! Request and response bodies for the `/v1` API.
//!
//! Field names follow the JSON shape clients already use (`tagId`, not `tag_id`). Request
//! fields are all optional at this layer so that a missing field is reported by validation
//! with a message naming it, rather than by the JSON decoder.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A patient as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub name: String,
    pub id: String,
    pub tag_id: Option<String>,
    /// `[timestamp, location]` pairs in the order they were recorded.
    #[schema(value_type = Vec<Vec<Object>>)]
    pub locations: Vec<(i64, String)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientReq {
    pub name: Option<String>,
    pub id: Option<String>,
    pub tag_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientReq {
    pub name: Option<String>,
    pub tag_id: Option<String>,
}

/// Search parameters; also echoed back in search responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchPatientsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchPatientsRes {
    pub patients: Vec<Patient>,
    pub query: SearchPatientsQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GetPatientRes {
    pub patient: Patient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RecordLocationReq {
    pub timestamp: Option<i64>,
    pub location: Option<String>,
}

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    /// The normalised search, on search misses only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<SearchPatientsQuery>,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            query: None,
        }
    }
}
