//! Blueprint Server
//!
//! Axum surface over blueprint_core: job start, live progress over SSE,
//! the clarify gate, the chat copilot, and blueprint saving. Identity,
//! quota accounting, and real storage are external collaborators; the
//! server boots with the permissive in-process defaults from
//! `blueprint_core::services`.

use anyhow::Context as _;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, Response, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
    routing::{get, post},
    Router,
};
use blueprint_core::llm::{CallAdapter, HttpCompletionTransport, TransportConfig};
use blueprint_core::models::{AgentBlueprint, DialogMessage};
use blueprint_core::pipeline::{
    EmitterConfig, Generator, InMemoryProgressStore, ProgressEmitter, ProgressStore, SessionId,
};
use blueprint_core::services::{AllowAll, BlueprintSink, CallerToken, InMemorySink, QuotaService};
use blueprint_core::skills::{ClarifySkill, CopilotSkill};
use clap::{Parser, Subcommand};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Application state
struct AppState {
    generator: Generator,
    store: Arc<dyn ProgressStore>,
    quota: Arc<dyn QuotaService>,
    sink: Arc<dyn BlueprintSink>,
    adapter: CallAdapter,
    emitter_config: EmitterConfig,
}

type SharedState = Arc<AppState>;

// === API Types ===

#[derive(Deserialize, ToSchema)]
struct GenerateRequest {
    idea: String,
    attachments: Option<Vec<String>>,
    /// Prior clarify dialog, folded into the analyst's context
    #[schema(value_type = Option<Vec<Object>>)]
    conversation_history: Option<Vec<DialogMessage>>,
}

#[derive(Serialize, ToSchema)]
struct GenerateResponse {
    #[schema(value_type = String)]
    session_id: SessionId,
}

#[derive(Deserialize, ToSchema)]
struct ClarifyRequest {
    idea: String,
    #[schema(value_type = Option<Vec<Object>>)]
    conversation_history: Option<Vec<DialogMessage>>,
}

#[derive(Serialize, ToSchema)]
struct ClarifyResponse {
    needs_clarification: bool,
    questions: Vec<String>,
    summary: String,
}

#[derive(Deserialize, ToSchema)]
struct ChatRequest {
    message: String,
    /// The blueprint the conversation is about
    #[schema(value_type = Object)]
    agent_context: AgentBlueprint,
    #[schema(value_type = Option<Vec<Object>>)]
    conversation_history: Option<Vec<DialogMessage>>,
    /// 1-based implementation step the user is currently on
    current_step: Option<u32>,
}

#[derive(Serialize, ToSchema)]
struct ChatResponse {
    response: String,
    suggested_actions: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
struct SaveAgentRequest {
    idea: String,
    #[schema(value_type = Object)]
    blueprint: AgentBlueprint,
}

#[derive(Serialize, ToSchema)]
struct SaveAgentResponse {
    #[schema(value_type = String)]
    id: Uuid,
    name: String,
}

#[derive(Serialize, ToSchema)]
struct ApiMessage {
    message: String,
}

#[derive(Parser, Clone)]
#[command(author, version, about = "Blueprint - AI agent blueprint generation service")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the Blueprint server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
}

// === OpenAPI Definition ===

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blueprint API",
        version = "1.0.0",
        description = "Turns a free-text idea into an AI agent blueprint through a staged generation pipeline"
    ),
    paths(start_generation, clarify_idea, chat_turn, save_agent),
    components(
        schemas(
            GenerateRequest,
            GenerateResponse,
            ClarifyRequest,
            ClarifyResponse,
            ChatRequest,
            ChatResponse,
            SaveAgentRequest,
            SaveAgentResponse,
            ApiMessage
        )
    ),
    tags(
        (name = "generate", description = "Blueprint generation and live progress"),
        (name = "chat", description = "Copilot conversation about a blueprint"),
        (name = "agents", description = "Saving finished blueprints")
    )
)]
struct ApiDoc;

// === Helpers ===

/// The caller's identity, passed through verbatim and never inspected here
fn caller_from(headers: &HeaderMap) -> CallerToken {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(CallerToken::new)
        .unwrap_or_else(CallerToken::anonymous)
}

fn upstream_error(err: impl std::fmt::Display) -> (StatusCode, Json<ApiMessage>) {
    (
        StatusCode::BAD_GATEWAY,
        Json(ApiMessage {
            message: err.to_string(),
        }),
    )
}

// === API Handlers ===

async fn read_root() -> Json<ApiMessage> {
    Json(ApiMessage {
        message: "Blueprint API - ready".to_string(),
    })
}

/// Start a generation session
#[utoipa::path(
    post,
    path = "/api/v1/generate",
    tag = "generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Session started", body = GenerateResponse),
        (status = 403, description = "Quota denied", body = ApiMessage)
    )
)]
async fn start_generation(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<ApiMessage>)> {
    let caller = caller_from(&headers);
    if !state.quota.can_start(&caller).await {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiMessage {
                message: "Generation limit reached for this plan".to_string(),
            }),
        ));
    }

    let session_id = state
        .generator
        .start(
            req.idea,
            req.attachments.unwrap_or_default(),
            req.conversation_history.unwrap_or_default(),
        )
        .await;

    Ok(Json(GenerateResponse { session_id }))
}

/// SSE stream of the session's progress records.
///
/// Closes after the terminal event, or after the stream budget with a
/// synthetic `{"stage":"timeout","error":true}` event.
async fn generation_progress(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let emitter = ProgressEmitter::new(
        state.store.clone(),
        SessionId::from(session_id),
        state.emitter_config.clone(),
    );

    let stream = stream::unfold(emitter, |mut emitter| async move {
        let record = emitter.next_event().await?;
        let json = serde_json::to_string(&record).unwrap_or_default();
        Some((Ok(Event::default().data(json)), emitter))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Run the clarify gate over an idea
#[utoipa::path(
    post,
    path = "/api/v1/clarify",
    tag = "generate",
    request_body = ClarifyRequest,
    responses(
        (status = 200, description = "Clarify verdict", body = ClarifyResponse),
        (status = 502, description = "Generation service unavailable", body = ApiMessage)
    )
)]
async fn clarify_idea(
    State(state): State<SharedState>,
    Json(req): Json<ClarifyRequest>,
) -> Result<Json<ClarifyResponse>, (StatusCode, Json<ApiMessage>)> {
    let dialog = req.conversation_history.unwrap_or_default();
    let invoked = ClarifySkill::run(&req.idea, &dialog, &state.adapter)
        .await
        .map_err(upstream_error)?;

    Ok(Json(ClarifyResponse {
        needs_clarification: invoked.value.needs_clarification,
        questions: invoked.value.questions,
        summary: invoked.value.summary,
    }))
}

/// One copilot turn about a finished blueprint
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Copilot reply", body = ChatResponse),
        (status = 502, description = "Generation service unavailable", body = ApiMessage)
    )
)]
async fn chat_turn(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ApiMessage>)> {
    let history = req.conversation_history.unwrap_or_default();
    let reply = CopilotSkill::reply(
        &req.message,
        &req.agent_context,
        &history,
        req.current_step,
        &state.adapter,
    )
    .await
    .map_err(upstream_error)?;

    Ok(Json(ChatResponse {
        response: reply.response,
        suggested_actions: reply.suggested_actions,
    }))
}

/// Hand a finished blueprint to the persistence collaborator
#[utoipa::path(
    post,
    path = "/api/v1/agents",
    tag = "agents",
    request_body = SaveAgentRequest,
    responses(
        (status = 200, description = "Blueprint saved", body = SaveAgentResponse),
        (status = 500, description = "Persistence failed", body = ApiMessage)
    )
)]
async fn save_agent(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<SaveAgentRequest>,
) -> Result<Json<SaveAgentResponse>, (StatusCode, Json<ApiMessage>)> {
    let caller = caller_from(&headers);
    let saved = state
        .sink
        .persist(&caller, &req.idea, &req.blueprint)
        .await
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage {
                    message: err.to_string(),
                }),
            )
        })?;

    Ok(Json(SaveAgentResponse {
        id: saved.id,
        name: saved.name,
    }))
}

// === OpenAPI Handler ===

async fn serve_openapi() -> impl IntoResponse {
    let spec = ApiDoc::openapi().to_json().unwrap_or_default();
    Response::builder()
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(spec))
        .unwrap()
}

// === Server Entry ===

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let server_port = match args.command {
        Some(CliCommand::Serve { port }) => port,
        None => 8000,
    };

    let transport_config =
        TransportConfig::from_env().context("generation service is not configured")?;
    let transport = Arc::new(HttpCompletionTransport::new(transport_config)?);
    let adapter = CallAdapter::new(transport);

    let store = Arc::new(InMemoryProgressStore::new());
    let generator = Generator::new(adapter.clone(), store.clone());

    let state: SharedState = Arc::new(AppState {
        generator,
        store,
        quota: Arc::new(AllowAll),
        sink: Arc::new(InMemorySink::new()),
        adapter,
        emitter_config: EmitterConfig::default(),
    });

    let api_routes = Router::new()
        .route("/generate", post(start_generation))
        .route("/generate/:session_id/progress", get(generation_progress))
        .route("/clarify", post(clarify_idea))
        .route("/chat", post(chat_turn))
        .route("/agents", post(save_agent))
        .route("/openapi.json", get(serve_openapi));

    let app = Router::new()
        .route("/", get(read_root))
        .nest("/api/v1", api_routes)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    println!("🚀 Blueprint Server running at http://{}", addr);
    println!("   API v1 Routes:");
    println!("   Generate:  POST /api/v1/generate");
    println!("   Progress:  GET  /api/v1/generate/:session_id/progress (SSE)");
    println!("   Clarify:   POST /api/v1/clarify");
    println!("   Chat:      POST /api/v1/chat");
    println!("   Agents:    POST /api/v1/agents");
    println!("   OpenAPI:   GET  /api/v1/openapi.json");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════╗");
    println!("║          BLUEPRINT SERVER            ║");
    println!("╚══════════════════════════════════════╝");

    run_server().await
}
