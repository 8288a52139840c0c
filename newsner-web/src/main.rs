//! Axum web server for interactive Thai-news entity annotation.
//!
//! Two entry points share one pipeline:
//! - `POST /analyze` — paste text or a news URL, get the annotated document,
//!   a highlighted HTML view and a lead summary in one response.
//! - `GET /ws` — WebSocket that streams one [`PipelineEvent`] per stage so
//!   the frontend can animate the pipeline working through the article.

mod render;
mod summarize;

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use newsner_core::{
    article::extract_body, remote::RemoteTagger, AnnotatedDocument, EntityTagger,
    NewmmWordTokenizer, NewsPipeline, PipelineEvent, QualityGate, RuleOnlyTagger,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::render::highlight_html;
use crate::summarize::{LeadSummarizer, Summarizer};

/// Tagger choice is a deployment concern, so it is resolved at startup and
/// erased behind a trait object.
type DynTagger = Box<dyn EntityTagger + Send + Sync>;

struct AppState {
    pipeline: NewsPipeline<DynTagger>,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    document: AnnotatedDocument,
    highlight_html: String,
    summary: String,
    processing_ms: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let tagger: DynTagger = match std::env::var("NEWSNER_TAGGER_URL") {
        Ok(url) => match RemoteTagger::new(url.as_str()) {
            Ok(remote) => {
                info!(%url, "using remote tagger");
                Box::new(remote)
            }
            Err(err) => {
                warn!(%err, "remote tagger unavailable, falling back to rules");
                Box::new(RuleOnlyTagger::new())
            }
        },
        Err(_) => {
            info!("NEWSNER_TAGGER_URL not set, using rule-only tagger");
            Box::new(RuleOnlyTagger::new())
        }
    };

    let mut pipeline = NewsPipeline::new(tagger);
    if let Ok(path) = std::env::var("NEWSNER_DICT_PATH") {
        info!(%path, "using newmm word segmentation");
        pipeline = pipeline.with_tokenizer(Box::new(NewmmWordTokenizer::from_dict_file(&path)));
    } else {
        info!("NEWSNER_DICT_PATH not set, splitting tokens on whitespace");
    }

    let state = Arc::new(AppState {
        pipeline,
        http: reqwest::Client::new(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/analyze", post(analyze_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("bind 0.0.0.0:3000");
    info!("newsner server listening on http://localhost:3000");
    axum::serve(listener, app).await.expect("server error");
}

async fn index_handler() -> impl IntoResponse {
    Html(include_str!("templates/index.html"))
}

/// Resolves the request into article text: inline text wins, otherwise the
/// URL is fetched and the article body extracted from its HTML.
async fn resolve_text(state: &AppState, req: &AnalyzeRequest) -> Result<String, String> {
    if let Some(text) = &req.text {
        if !text.trim().is_empty() {
            return Ok(text.clone());
        }
    }
    let Some(url) = &req.url else {
        return Err("either text or url is required".to_string());
    };

    let response = state
        .http
        .get(url)
        .header(reqwest::header::USER_AGENT, "Mozilla/5.0 (newsner)")
        .send()
        .await
        .map_err(|e| format!("fetching {url}: {e}"))?;
    if !response.status().is_success() {
        return Err(format!("fetching {url}: HTTP {}", response.status()));
    }
    let html = response
        .text()
        .await
        .map_err(|e| format!("reading {url}: {e}"))?;

    let body = extract_body(&html);
    let quality = state.pipeline.normalizer.quality(&body);
    if !quality.passes(&QualityGate::soft()) {
        return Err(format!(
            "insufficient article content at {url} ({} chars, {:.0}% Thai)",
            quality.chars,
            quality.thai_ratio * 100.0
        ));
    }
    Ok(body)
}

/// Full annotation over HTTP, no streaming.
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let text = match resolve_text(&state, &req).await {
        Ok(text) => text,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response();
        }
    };

    let start = std::time::Instant::now();
    let state_for_thread = Arc::clone(&state);
    let document = match tokio::task::spawn_blocking(move || {
        state_for_thread.pipeline.annotate(&text)
    })
    .await
    {
        Ok(document) => document,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("pipeline task failed: {err}") })),
            )
                .into_response();
        }
    };

    let highlight = highlight_html(&document);
    let summary = LeadSummarizer.summarize(&document.text, 3);
    Json(AnalyzeResponse {
        highlight_html: highlight,
        summary,
        processing_ms: start.elapsed().as_millis() as u64,
        document,
    })
    .into_response()
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// WebSocket loop: receives a text (or a `{"text"| "url"}` JSON object),
/// runs the pipeline and replays its events to the client with a short
/// delay per event for the step-by-step animation.
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("websocket connected");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(raw) => {
                let request = serde_json::from_str::<AnalyzeRequest>(&raw).unwrap_or_else(|_| {
                    AnalyzeRequest {
                        text: Some(raw.to_string()),
                        url: None,
                    }
                });

                let text = match resolve_text(&state, &request).await {
                    Ok(text) => text,
                    Err(message) => {
                        let event = PipelineEvent::Error { message };
                        if let Ok(json) = serde_json::to_string(&event) {
                            let _ = socket.send(Message::Text(json.into())).await;
                        }
                        continue;
                    }
                };

                info!(chars = text.len(), "annotating via websocket");

                // the pipeline is synchronous: run it off the async runtime
                let (tx, rx) = std::sync::mpsc::channel::<PipelineEvent>();
                let state_for_thread = Arc::clone(&state);
                let handle = tokio::task::spawn_blocking(move || {
                    state_for_thread.pipeline.annotate_streaming(&text, tx);
                });
                handle.await.ok();

                // the pipeline has finished, so every event is already queued;
                // drain them up front rather than holding the non-Sync
                // receiver across the await points below
                let events: Vec<PipelineEvent> = rx.try_iter().collect();
                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            return;
                        }
                        tokio::time::sleep(tokio::time::Duration::from_millis(35)).await;
                    }
                }
            }
            Message::Close(_) => {
                info!("websocket disconnected");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
