use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::{Article, Database};
use crate::export;
use crate::fetcher::Fetcher;

pub struct AppState {
    pub db: Arc<Database>,
    pub fetcher: Arc<Fetcher>,
    /// Used when the form is submitted without names
    pub default_entities: Vec<String>,
    pub per_entity_cap: usize,
    pub display_limit: i64,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub articles: Vec<Article>,
    pub cutoff_days: i64,
    pub fetched: Option<usize>,
    pub cleared: bool,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/fetch", post(fetch))
        .route("/clear", post(clear))
        .route("/export.csv", get(export_csv))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// One name per line; blank lines are ignored. Falls back to `defaults`
/// when nothing is left.
pub fn parse_entity_names(raw: &str, defaults: &[String]) -> Vec<String> {
    let names: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if names.is_empty() {
        defaults.to_vec()
    } else {
        names
    }
}

#[derive(Deserialize)]
pub struct IndexQuery {
    pub fetched: Option<usize>,
    #[serde(default)]
    pub cleared: bool,
}

#[derive(Deserialize)]
pub struct FetchForm {
    #[serde(default)]
    pub names: String,
}

// Route handlers
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IndexQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = state.fetcher.window();
    let articles = state.db.list_recent(window, state.display_limit).await?;

    Ok(HtmlTemplate(IndexTemplate {
        articles,
        cutoff_days: window.length().num_days(),
        fetched: query.fetched,
        cleared: query.cleared,
    }))
}

pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FetchForm>,
) -> Result<impl IntoResponse, AppError> {
    let entities = parse_entity_names(&form.names, &state.default_entities);
    let articles = state
        .fetcher
        .fetch(&entities, state.per_entity_cap)
        .await?;

    Ok(Redirect::to(&format!("/?fetched={}", articles.len())))
}

pub async fn clear(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    state.db.clear_all().await?;
    info!("All news cleared");
    Ok(Redirect::to("/?cleared=true"))
}

pub async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let articles = state
        .db
        .list_recent(state.fetcher.window(), state.display_limit)
        .await?;
    let body = export::to_csv(&articles)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export::EXPORT_FILENAME),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
