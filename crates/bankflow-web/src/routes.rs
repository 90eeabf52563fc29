//! HTTP routes.

use crate::AppState;
use crate::error::WebError;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Router, routing::get};
use bankflow_core::error::BankflowError;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

type HandlerResult<T> = std::result::Result<T, WebError>;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(select_bank))
        .route("/results", get(results))
        .route("/agreements/:aspsp_id", get(start_agreement))
        .route("/downloads/:filename", get(download))
        .route("/:search", get(search_banks))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn select_bank(State(state): State<AppState>) -> HandlerResult<Html<String>> {
    render_banks(&state, None).await
}

async fn search_banks(
    State(state): State<AppState>,
    Path(search): Path<String>,
) -> HandlerResult<Html<String>> {
    render_banks(&state, Some(&search)).await
}

async fn render_banks(state: &AppState, search: Option<&str>) -> HandlerResult<Html<String>> {
    if let Some(missing) = state.flows.readiness() {
        return Ok(Html(state.pages.missing_inputs(missing)?));
    }
    match state.flows.list_banks(search).await {
        Ok(banks) => Ok(Html(state.pages.select_aspsp(&banks, search)?)),
        Err(BankflowError::MissingConfiguration(missing)) => {
            Ok(Html(state.pages.missing_inputs(missing)?))
        }
        Err(err) => Err(err.into()),
    }
}

async fn start_agreement(
    State(state): State<AppState>,
    Path(aspsp_id): Path<String>,
) -> HandlerResult<Response> {
    if aspsp_id.trim().is_empty() {
        return Ok(Redirect::to("/").into_response());
    }
    let start = state.flows.start_flow(&aspsp_id).await?;
    Ok(Redirect::to(&start.link).into_response())
}

#[derive(Debug, Deserialize)]
struct ResultsQuery {
    #[serde(rename = "ref")]
    reference: Option<String>,
}

async fn results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> HandlerResult<Html<String>> {
    let Some(reference) = query.reference else {
        return Err(BankflowError::ReferenceMismatch.into());
    };
    let results = state.flows.complete_flow(&reference).await?;
    Ok(Html(state.pages.results(&results.data)?))
}

async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> HandlerResult<Response> {
    let path = state.downloads.resolve_download(&filename).await?;
    let body = tokio::fs::read(&path)
        .await
        .map_err(BankflowError::from)?;
    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    tracing::debug!("Serving download {}", filename);

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}
