//! JSON API over a shared pricing workspace.
//!
//! Endpoints:
//! - `GET  /api/v1/actors`                          roster for the user selector
//! - `GET  /api/v1/requests?search=`                requests visible to the actor
//! - `POST /api/v1/requests`                        create a draft
//! - `GET  /api/v1/requests/{id}`                   single visible request
//! - `PUT  /api/v1/requests/{id}`                   guarded full edit
//! - `POST /api/v1/requests/{id}/transition`        `{ "to": "<status>" }`
//! - `POST /api/v1/requests/{id}/comments`          `{ "text": "..." }`
//! - `GET  /api/v1/requests/{id}/actions`           transitions the actor may take
//! - `GET  /api/v1/agreements?search=`              agreement library
//! - `GET  /api/v1/agreements/{id}/document`        PDF, or HTML without a converter
//! - `GET  /api/v1/agreements/{id}/summary`         LLM executive summary
//! - `GET  /api/v1/dashboard`                       pipeline summary
//! - `POST /api/v1/rates/quote`                     static rate formula
//! - `POST /api/v1/analysis/sensitivity`            LLM sensitivity analysis
//! - `GET  /health`
//!
//! The acting user is named by the `x-actor-id` header.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use pricedesk_agent::{AnalysisError, LlmClient, SensitivityAnalyzer};
use pricedesk_core::config::LlmProvider;
use pricedesk_core::{
    Actor, AnalysisResult, ApplicationError, DashboardSummary, DomainError, DraftFields,
    InterfaceError, PricingRequest, RateCalculator, RateInput, RateQuote, RequestId, RequestStatus,
    SensitivityScenario, StaticRateCalculator, TransitionOutcome, Workspace,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::document::{self, AgreementRenderer, DocumentError};
use crate::health;

pub const ACTOR_HEADER: &str = "x-actor-id";
pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct ApiState {
    pub(crate) workspace: Arc<Mutex<Workspace>>,
    pub(crate) renderer: Arc<AgreementRenderer>,
    pub(crate) analyzer: Arc<SensitivityAnalyzer<Box<dyn LlmClient>>>,
    pub(crate) rates: Arc<dyn RateCalculator>,
    pub(crate) llm_provider: Option<LlmProvider>,
}

impl ApiState {
    pub fn new(
        workspace: Workspace,
        renderer: AgreementRenderer,
        llm_client: Box<dyn LlmClient>,
    ) -> Self {
        Self {
            workspace: Arc::new(Mutex::new(workspace)),
            renderer: Arc::new(renderer),
            analyzer: Arc::new(SensitivityAnalyzer::new(llm_client)),
            rates: Arc::new(StaticRateCalculator),
            llm_provider: None,
        }
    }

    pub fn with_llm_provider(mut self, provider: LlmProvider) -> Self {
        self.llm_provider = Some(provider);
        self
    }

    pub fn workspace(&self) -> Arc<Mutex<Workspace>> {
        Arc::clone(&self.workspace)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

pub type ApiRejection = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<T, ApiRejection>;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub to: RequestStatus,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionsResponse {
    pub request_id: RequestId,
    pub actor_id: String,
    pub available: Vec<RequestStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub request_id: RequestId,
    pub summary: String,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/actors", get(list_actors))
        .route("/api/v1/requests", get(list_requests).post(create_request))
        .route("/api/v1/requests/{id}", get(get_request).put(replace_request))
        .route("/api/v1/requests/{id}/transition", post(transition_request))
        .route("/api/v1/requests/{id}/comments", post(add_comment))
        .route("/api/v1/requests/{id}/actions", get(available_actions))
        .route("/api/v1/agreements", get(list_agreements))
        .route("/api/v1/agreements/{id}/document", get(agreement_document))
        .route("/api/v1/agreements/{id}/summary", get(agreement_summary))
        .route("/api/v1/dashboard", get(dashboard))
        .route("/api/v1/rates/quote", post(rate_quote))
        .route("/api/v1/analysis/sensitivity", post(sensitivity_analysis))
        .with_state(state)
}

async fn list_actors(State(state): State<ApiState>) -> Json<Vec<Actor>> {
    let workspace = state.workspace.lock().await;
    Json(workspace.directory().iter().cloned().collect())
}

async fn list_requests(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<PricingRequest>>> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;

    let workspace = state.workspace.lock().await;
    let requests = workspace
        .visible_requests(&actor_id, &query.search)
        .map_err(|error| reject(error, &correlation_id))?;
    Ok(Json(requests.into_iter().cloned().collect()))
}

async fn create_request(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(fields): Json<DraftFields>,
) -> ApiResult<(StatusCode, Json<PricingRequest>)> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;

    let mut workspace = state.workspace.lock().await;
    let created =
        workspace.create_request(&actor_id, fields).map_err(|error| reject(error, &correlation_id))?;

    info!(
        event_name = "api.request.created",
        correlation_id = %correlation_id,
        request_id = %created.id,
        actor_id = %actor_id,
        "pricing request created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_request(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<PricingRequest>> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;

    let workspace = state.workspace.lock().await;
    let request = workspace
        .request(&actor_id, &RequestId::new(id))
        .map_err(|error| reject(error, &correlation_id))?;
    Ok(Json(request.clone()))
}

async fn replace_request(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(updated): Json<PricingRequest>,
) -> ApiResult<Json<PricingRequest>> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;

    if updated.id.as_str() != id {
        let error = DomainError::invalid_field(
            "id",
            format!("body id `{}` does not match path id `{id}`", updated.id),
        );
        return Err(reject(error.into(), &correlation_id));
    }

    let mut workspace = state.workspace.lock().await;
    let saved =
        workspace.replace_request(&actor_id, updated).map_err(|error| reject(error, &correlation_id))?;

    info!(
        event_name = "api.request.replaced",
        correlation_id = %correlation_id,
        request_id = %saved.id,
        actor_id = %actor_id,
        status = saved.status.as_str(),
        "pricing request saved"
    );
    Ok(Json(saved))
}

async fn transition_request(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<TransitionBody>,
) -> ApiResult<Json<TransitionOutcome>> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;
    let request_id = RequestId::new(id);

    let mut workspace = state.workspace.lock().await;
    let outcome = workspace
        .submit_transition(&actor_id, &request_id, body.to)
        .map_err(|error| reject(error, &correlation_id))?;

    info!(
        event_name = "api.request.transitioned",
        correlation_id = %correlation_id,
        request_id = %request_id,
        actor_id = %actor_id,
        from = outcome.from.as_str(),
        to = outcome.to.as_str(),
        "pricing request transitioned"
    );
    Ok(Json(outcome))
}

async fn add_comment(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CommentBody>,
) -> ApiResult<Json<PricingRequest>> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;
    let request_id = RequestId::new(id);

    let mut workspace = state.workspace.lock().await;
    let updated = workspace
        .add_comment(&actor_id, &request_id, &body.text)
        .map_err(|error| reject(error, &correlation_id))?;

    info!(
        event_name = "api.request.commented",
        correlation_id = %correlation_id,
        request_id = %request_id,
        actor_id = %actor_id,
        comments = updated.comments.len(),
        "comment added"
    );
    Ok(Json(updated))
}

async fn available_actions(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionsResponse>> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;
    let request_id = RequestId::new(id);

    let workspace = state.workspace.lock().await;
    let available = workspace
        .available_transitions(&actor_id, &request_id)
        .map_err(|error| reject(error, &correlation_id))?;
    Ok(Json(ActionsResponse { request_id, actor_id, available }))
}

async fn list_agreements(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<PricingRequest>>> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;

    let workspace = state.workspace.lock().await;
    workspace.resolve_actor(&actor_id).map_err(|error| reject(error, &correlation_id))?;
    Ok(Json(workspace.agreement_library(&query.search).into_iter().cloned().collect()))
}

async fn agreement_document(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;
    let request_id = RequestId::new(id);

    let document = {
        let workspace = state.workspace.lock().await;
        workspace.resolve_actor(&actor_id).map_err(|error| reject(error, &correlation_id))?;
        workspace.agreement_document(&request_id).map_err(|error| reject(error, &correlation_id))?
    };

    let rendered = state
        .renderer
        .render(&document)
        .await
        .map_err(|error| reject(rendering_error(error), &correlation_id))?;

    info!(
        event_name = "api.agreement.exported",
        correlation_id = %correlation_id,
        request_id = %request_id,
        actor_id = %actor_id,
        format = if rendered.is_pdf() { "pdf" } else { "html" },
        "agreement document exported"
    );
    Ok(rendered.into_response(&document.file_name()))
}

async fn agreement_summary(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<SummaryResponse>> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;
    let request_id = RequestId::new(id);

    let document = {
        let workspace = state.workspace.lock().await;
        workspace.resolve_actor(&actor_id).map_err(|error| reject(error, &correlation_id))?;
        workspace.agreement_document(&request_id).map_err(|error| reject(error, &correlation_id))?
    };

    let summary = state
        .analyzer
        .summarize_agreement(&document::plain_text(&document))
        .await
        .map_err(|error| reject(analysis_error(error), &correlation_id))?;
    Ok(Json(SummaryResponse { request_id, summary }))
}

async fn dashboard(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> ApiResult<Json<DashboardSummary>> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;

    let workspace = state.workspace.lock().await;
    workspace.resolve_actor(&actor_id).map_err(|error| reject(error, &correlation_id))?;
    Ok(Json(workspace.dashboard()))
}

async fn rate_quote(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(input): Json<RateInput>,
) -> ApiResult<Json<RateQuote>> {
    let correlation_id = correlation_id(&headers);
    let quote = state.rates.quote(&input).map_err(|error| {
        reject(DomainError::invalid_field("rate", error.to_string()).into(), &correlation_id)
    })?;
    Ok(Json(quote))
}

async fn sensitivity_analysis(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(scenario): Json<SensitivityScenario>,
) -> ApiResult<Json<AnalysisResult>> {
    let correlation_id = correlation_id(&headers);
    let actor_id = actor_id(&headers, &correlation_id)?;
    {
        let workspace = state.workspace.lock().await;
        workspace.resolve_actor(&actor_id).map_err(|error| reject(error, &correlation_id))?;
    }

    let result = state
        .analyzer
        .analyze(&scenario)
        .await
        .map_err(|error| reject(analysis_error(error), &correlation_id))?;

    info!(
        event_name = "api.analysis.completed",
        correlation_id = %correlation_id,
        actor_id = %actor_id,
        "sensitivity analysis returned"
    );
    Ok(Json(result))
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn actor_id(headers: &HeaderMap, correlation_id: &str) -> ApiResult<String> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            reject(
                ApplicationError::UnknownActor(format!("(missing {ACTOR_HEADER} header)")),
                correlation_id,
            )
        })
}

fn analysis_error(error: AnalysisError) -> ApplicationError {
    match error {
        AnalysisError::InvalidScenario(reason) => {
            DomainError::invalid_field("scenario", reason).into()
        }
        other => ApplicationError::Integration(other.to_string()),
    }
}

fn rendering_error(error: DocumentError) -> ApplicationError {
    ApplicationError::Rendering(error.to_string())
}

pub fn status_for(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
        InterfaceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(error: ApplicationError, correlation_id: &str) -> ApiRejection {
    let interface = error.into_interface(correlation_id);
    let status = status_for(&interface);

    warn!(
        event_name = "api.request.rejected",
        correlation_id = %correlation_id,
        status = status.as_u16(),
        error = %interface,
        "api call rejected"
    );

    (
        status,
        Json(ApiError {
            error: interface.user_message().to_string(),
            message: interface.message().to_string(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}
