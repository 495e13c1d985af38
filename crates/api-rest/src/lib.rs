//! # API REST
//!
//! REST API implementation for RFIV.
//!
//! Handles:
//! - HTTP endpoints with axum under the `/v1` prefix
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, request tracing)
//!
//! Uses `api-shared` for the wire types and `rfiv-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod error;

use api_shared::{wire, HealthService};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rfiv_core::{LocationPing, NewPatient, PatientPatch, PatientService, SearchQuery};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;

/// Path prefix of the versioned patient API.
pub const API_PREFIX: &str = "/v1";

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers. The
/// `PatientService` is built once at startup and owns the store handle.
#[derive(Clone)]
pub struct AppState {
    patients: PatientService,
}

impl AppState {
    pub fn new(patients: PatientService) -> Self {
        Self { patients }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_patient,
        search_patients,
        get_patient,
        update_patient,
        record_location,
    ),
    components(schemas(
        wire::HealthRes,
        wire::Patient,
        wire::CreatePatientReq,
        wire::UpdatePatientReq,
        wire::SearchPatientsQuery,
        wire::SearchPatientsRes,
        wire::GetPatientRes,
        wire::RecordLocationReq,
        wire::ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router.
///
/// Routes:
/// - `GET /health`
/// - `POST /v1/patient`
/// - `GET /v1/patients`
/// - `GET /v1/patient/:id` and `PUT /v1/patient/:id`
/// - `POST /v1/patient/:tagId/location`
///
/// Any other `GET` returns the API welcome text.
pub fn router(state: AppState) -> Router {
    // the location route shares the `:id` segment name; there it carries a tag ID
    let v1 = Router::new()
        .route("/patient", post(create_patient).fallback(unsupported_method))
        .route("/patients", get(search_patients).fallback(unsupported_method))
        .route(
            "/patient/:id",
            get(get_patient)
                .put(update_patient)
                .fallback(unsupported_method),
        )
        .route(
            "/patient/:id/location",
            post(record_location).fallback(unsupported_method),
        );

    Router::new()
        .route("/health", get(health).fallback(unsupported_method))
        .nest(API_PREFIX, v1)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(overview)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn to_wire(patient: rfiv_core::Patient) -> wire::Patient {
    wire::Patient {
        name: patient.name,
        id: patient.id,
        tag_id: patient.tag_id,
        locations: patient
            .locations
            .into_iter()
            .map(|entry| (entry.0, entry.1))
            .collect(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = wire::HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// This endpoint is used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<wire::HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/v1/patient",
    request_body = wire::CreatePatientReq,
    responses(
        (status = 204, description = "Patient created"),
        (status = 400, description = "Invalid input, or id/tagId already in use", body = wire::ErrorRes),
        (status = 503, description = "Patient store unavailable", body = wire::ErrorRes)
    )
)]
/// Create a new patient record
///
/// All three fields are sanitised before they are stored. `tagId` may be omitted only when the
/// server runs with `RFIV_REQUIRE_TAG_ID=false`.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - a field is missing or empty (the message names it),
/// - the `id` or the `tagId` belongs to another patient (the message names which).
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    body: Result<Json<wire::CreatePatientReq>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = body?;
    let new_patient = NewPatient::parse(
        req.name.as_deref(),
        req.id.as_deref(),
        req.tag_id.as_deref(),
        state.patients.config().require_tag_id(),
    )?;

    state.patients.create(new_patient).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/patients",
    params(wire::SearchPatientsQuery),
    responses(
        (status = 200, description = "Matching patients", body = wire::SearchPatientsRes),
        (status = 400, description = "Empty query", body = wire::ErrorRes),
        (status = 404, description = "No patient matches; echoes the query", body = wire::ErrorRes)
    )
)]
/// Search patients by name, id and tag
///
/// Every supplied field is a case-insensitive substring match and all of them must match.
/// Blank fields are ignored, but at least one field must be non-blank.
#[axum::debug_handler]
async fn search_patients(
    State(state): State<AppState>,
    query: Result<Query<wire::SearchPatientsQuery>, QueryRejection>,
) -> Result<Json<wire::SearchPatientsRes>, ApiError> {
    let Query(raw) = query?;
    let query = SearchQuery::parse(
        raw.name.as_deref(),
        raw.id.as_deref(),
        raw.tag_id.as_deref(),
    )?;
    let echo = wire::SearchPatientsQuery {
        name: query.name.clone(),
        id: query.id.clone(),
        tag_id: query.tag_id.clone(),
    };

    match state.patients.search(&query).await {
        Ok(patients) => Ok(Json(wire::SearchPatientsRes {
            patients: patients.into_iter().map(to_wire).collect(),
            query: echo,
        })),
        Err(e) => Err(ApiError::from(e).with_query(echo)),
    }
}

#[utoipa::path(
    get,
    path = "/v1/patient/{id}",
    params(("id" = String, Path, description = "Hospital patient ID")),
    responses(
        (status = 200, description = "Patient found", body = wire::GetPatientRes),
        (status = 404, description = "Unknown patient", body = wire::ErrorRes)
    )
)]
/// Fetch a patient by exact hospital ID
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<wire::GetPatientRes>, ApiError> {
    let Path(id) = id?;
    let patient = state.patients.get(&id).await?;
    Ok(Json(wire::GetPatientRes {
        patient: to_wire(patient),
    }))
}

#[utoipa::path(
    put,
    path = "/v1/patient/{id}",
    params(("id" = String, Path, description = "Hospital patient ID")),
    request_body = wire::UpdatePatientReq,
    responses(
        (status = 204, description = "Patient updated"),
        (status = 400, description = "Empty update, invalid input, or tagId already in use", body = wire::ErrorRes),
        (status = 404, description = "Unknown patient", body = wire::ErrorRes)
    )
)]
/// Update a patient's name and/or tag
///
/// Only the supplied fields change. The patient's `id` cannot be changed.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<wire::UpdatePatientReq>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let Json(req) = body?;
    let patch = PatientPatch::parse(req.name.as_deref(), req.tag_id.as_deref())?;

    state.patients.update(&id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/patient/{tagId}/location",
    params(("tagId" = String, Path, description = "ID of the RFID tag that reported the reading")),
    request_body = wire::RecordLocationReq,
    responses(
        (status = 204, description = "Reading recorded"),
        (status = 400, description = "Invalid input", body = wire::ErrorRes),
        (status = 404, description = "Unknown tag", body = wire::ErrorRes),
        (status = 405, description = "Same location as the last reading, inside the heartbeat window", body = wire::ErrorRes)
    )
)]
/// Record a location reading for a tag
///
/// The reading is stored when the location differs from the last one recorded for the
/// patient, or when the last reading is more than the heartbeat window (120000 ms by default)
/// older. Otherwise the call answers `405`, which callers should treat as "nothing to do".
#[axum::debug_handler]
async fn record_location(
    State(state): State<AppState>,
    tag_id: Result<Path<String>, PathRejection>,
    body: Result<Json<wire::RecordLocationReq>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(tag_id) = tag_id?;
    let Json(req) = body?;
    let ping = LocationPing::parse(req.timestamp, req.location.as_deref())?;

    state.patients.record_location(&tag_id, ping).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Answers a known path requested with a method it does not serve.
///
/// Kept apart from the `405` of a suppressed location reading by its message.
async fn unsupported_method(method: Method) -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("Unsupported method: {method}"),
    )
}

/// Answers any unrouted `GET` with the API welcome text.
async fn overview(method: Method) -> Response {
    if method == Method::GET {
        (StatusCode::OK, "Welcome to the RFIV API page.").into_response()
    } else {
        ApiError::new(StatusCode::NOT_FOUND, "Unknown route").into_response()
    }
}
