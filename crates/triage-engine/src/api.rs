//! HTTP surface for the telephony layer
//!
//! - `GET /health`
//! - `POST /route` returns the full [`TriageOutcome`]
//! - `POST /calls` greets an incoming call: queue it or offer the menu
//! - `POST /calls/input` answers a caller's menu choice with what to say next
//! - `POST /calls/message` stores a recorded voicemail

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::engine::TriageEngine;
use crate::error::{Result, Stage, TriageError};
use crate::responses::{
    automated_response, menu_prompt, priority_announcement, wait_announcement, CallerChoice,
    FALLBACK_ANNOUNCEMENT, FEEDBACK_PROMPT, LEAVE_MESSAGE_PROMPT, NOT_UNDERSTOOD_PROMPT,
    VOICEMAIL_FAILED, VOICEMAIL_SAVED,
};
use crate::types::{
    AgentSuggestion, AgentType, Department, Priority, RouteRequest, RoutingDecision,
    TriageOutcome, VoicemailMetadata,
};

/// Queue every connected call is placed on
pub const AGENT_QUEUE: &str = "support";

/// Body of `/calls` and `/calls/input`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallInput {
    pub call_sid: Option<String>,
    pub caller_id: Option<String>,
    pub speech_result: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicemailInput {
    pub call_sid: Option<String>,
    pub caller_id: Option<String>,
    pub recording_url: Option<String>,
    /// Seconds
    pub recording_duration: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallAction {
    /// Queue the call for an agent
    Connect,
    /// Say the menu and post the answer to `/calls/input`
    Menu,
    Automated,
    /// Record a message and post it to `/calls/message`
    Message,
    Retry,
    Fallback,
    Hangup,
}

/// Task attached to a call when it joins the agent queue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueTask {
    pub queue: String,
    pub priority: Priority,
    pub department: Department,
    pub agent_type: AgentType,
    pub suggestions: Vec<AgentSuggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResponse {
    pub action: CallAction,
    pub say: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enqueue: Option<EnqueueTask>,
    /// Follow-up question to gather speech for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gather: Option<String>,
}

impl CallResponse {
    fn say(action: CallAction, text: impl Into<String>) -> Self {
        Self {
            action,
            say: text.into(),
            enqueue: None,
            gather: None,
        }
    }

    fn connect(announcement: String, decision: &RoutingDecision, suggestions: Vec<AgentSuggestion>) -> Self {
        Self {
            action: CallAction::Connect,
            say: announcement,
            enqueue: Some(EnqueueTask {
                queue: AGENT_QUEUE.to_string(),
                priority: decision.priority,
                department: decision.department,
                agent_type: decision.agent_type,
                suggestions,
            }),
            gather: None,
        }
    }

    fn fallback() -> Self {
        Self::say(CallAction::Fallback, FALLBACK_ANNOUNCEMENT)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<Stage>,
}

/// Routing error rendered as a JSON response
pub struct ApiError(pub TriageError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            TriageError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TriageError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            e if e.is_collaborator_failure() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TriageError> for ApiError {
    fn from(err: TriageError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.to_string(),
            stage: self.0.stage(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the router over a shared engine
pub fn create_router(engine: Arc<TriageEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/route", post(route_call))
        .route("/calls", post(handle_incoming))
        .route("/calls/input", post(handle_input))
        .route("/calls/message", post(handle_message))
        .with_state(engine)
}

/// Serve until `shutdown` is cancelled
pub async fn serve(
    engine: Arc<TriageEngine>,
    bind_address: &str,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 Triage API listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(engine))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Triage API stopped");
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn route_call(
    State(engine): State<Arc<TriageEngine>>,
    Json(request): Json<RouteRequest>,
) -> std::result::Result<Json<TriageOutcome>, ApiError> {
    let outcome = engine.route(&request).await?;
    Ok(Json(outcome))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn missing_parameters() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "message": "Missing required parameters" })),
    )
        .into_response()
}

/// High priority callers go straight to the queue; the rest hear the menu
async fn handle_incoming(
    State(engine): State<Arc<TriageEngine>>,
    Json(input): Json<CallInput>,
) -> Response {
    let (Some(call_sid), Some(caller_id)) = (non_empty(input.call_sid), non_empty(input.caller_id))
    else {
        return missing_parameters();
    };

    let Some(speech) = non_empty(input.speech_result) else {
        info!("☎️ Call {} from {} has not spoken yet, offering the menu", call_sid, caller_id);
        return Json(CallResponse::say(CallAction::Menu, menu_prompt(None))).into_response();
    };

    let response = match engine.route(&RouteRequest::new(caller_id, speech)).await {
        Ok(outcome) if outcome.routing_decision.priority == Priority::High => {
            info!("☎️ Call {} is high priority, queueing now", call_sid);
            let decision = outcome.routing_decision;
            CallResponse::connect(priority_announcement(&decision), &decision, outcome.suggestions)
        }
        Ok(outcome) => CallResponse::say(CallAction::Menu, menu_prompt(Some(&outcome.intent.intent))),
        Err(e) => {
            error!("❌ Call {} falling back to an agent: {}", call_sid, e);
            CallResponse::fallback()
        }
    };

    Json(response).into_response()
}

async fn handle_message(
    State(engine): State<Arc<TriageEngine>>,
    Json(input): Json<VoicemailInput>,
) -> Response {
    let (Some(call_sid), Some(caller_id), Some(recording_url)) = (
        non_empty(input.call_sid),
        non_empty(input.caller_id),
        non_empty(input.recording_url),
    ) else {
        return missing_parameters();
    };

    let voicemail = VoicemailMetadata {
        call_sid: call_sid.clone(),
        recording_url,
        recording_duration: input.recording_duration,
    };
    let response = match engine.record_voicemail(&caller_id, voicemail).await {
        Ok(_) => CallResponse::say(CallAction::Hangup, VOICEMAIL_SAVED),
        Err(e) => {
            error!("💾 Voicemail for call {} not saved: {}", call_sid, e);
            CallResponse::say(CallAction::Hangup, VOICEMAIL_FAILED)
        }
    };

    Json(response).into_response()
}

async fn handle_input(
    State(engine): State<Arc<TriageEngine>>,
    Json(input): Json<CallInput>,
) -> Response {
    let (Some(call_sid), Some(caller_id), Some(speech)) = (
        non_empty(input.call_sid),
        non_empty(input.caller_id),
        non_empty(input.speech_result),
    ) else {
        return missing_parameters();
    };

    let choice = CallerChoice::parse(&speech);
    info!("☎️ Call {} from {} chose {:?}", call_sid, caller_id, choice);

    let response = if choice.needs_routing() {
        match engine.route(&RouteRequest::new(caller_id, speech)).await {
            Ok(outcome) => answer_with_outcome(choice, outcome),
            Err(e) => {
                error!("❌ Call {} falling back to an agent: {}", call_sid, e);
                CallResponse::fallback()
            }
        }
    } else if choice == CallerChoice::LeaveMessage {
        CallResponse::say(CallAction::Message, LEAVE_MESSAGE_PROMPT)
    } else {
        CallResponse::say(CallAction::Retry, NOT_UNDERSTOOD_PROMPT)
    };

    Json(response).into_response()
}

fn answer_with_outcome(choice: CallerChoice, outcome: TriageOutcome) -> CallResponse {
    if outcome.is_degraded() {
        warn!(
            "Interaction {} answered with degradations: {:?}",
            outcome.interaction_id, outcome.degradations
        );
    }

    let decision = outcome.routing_decision;
    match choice {
        CallerChoice::Automated => CallResponse {
            action: CallAction::Automated,
            say: automated_response(&outcome.intent.intent).to_string(),
            enqueue: None,
            gather: Some(FEEDBACK_PROMPT.to_string()),
        },
        _ => CallResponse::connect(wait_announcement(&decision), &decision, outcome.suggestions),
    }
}
