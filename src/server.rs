use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::{FixedSlot, GenerationResult, SubjectRequirement, Teacher, TimetableInput};
use crate::export;
use crate::ingest::{self, UploadKind};
use crate::solver::{GeneratorOptions, TimetableGenerator};
use crate::storage::{FileStore, TimetableRepository};
use crate::validation::validate_input;

type ApiError = (StatusCode, String);

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<TimetableRepository>,
    pub options: GeneratorOptions,
}

impl AppState {
    pub fn new(repo: TimetableRepository, options: GeneratorOptions) -> Self {
        Self {
            repo: Arc::new(repo),
            options,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub kind: String,
    pub records: usize,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
    pub department: Option<String>,
}

fn internal(e: anyhow::Error) -> ApiError {
    error!("{e:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
}

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, message)
}

/// Runs `f` against the repository on the blocking pool; the file store
/// does synchronous I/O.
async fn with_repo<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&TimetableRepository) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let repo = Arc::clone(&state.repo);
    tokio::task::spawn_blocking(move || f(&repo))
        .await
        .map_err(|e| internal(e.into()))?
}

fn generate(input: TimetableInput, options: GeneratorOptions) -> Result<GenerationResult, ApiError> {
    if let Err(errors) = validate_input(&input) {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(bad_request(message));
    }
    Ok(TimetableGenerator::new(input).with_options(options).generate())
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(input): Json<TimetableInput>,
) -> Result<Json<GenerationResult>, ApiError> {
    generate(input, state.options).map(Json)
}

async fn regenerate_handler(State(state): State<AppState>) -> Result<Json<GenerationResult>, ApiError> {
    let options = state.options;
    let result = with_repo(&state, move |repo| {
        let input = repo.input().map_err(internal)?;
        let result = generate(input, options)?;
        let generated_at = repo.save_result(&result).map_err(internal)?;
        info!("Stored timetable generated at {}", generated_at);
        Ok(result)
    })
    .await?;
    Ok(Json(result))
}

async fn timetable_handler(State(state): State<AppState>) -> Result<Json<GenerationResult>, ApiError> {
    match with_repo(&state, |repo| repo.result().map_err(internal)).await? {
        Some(result) => Ok(Json(result)),
        None => Err((StatusCode::NOT_FOUND, "No timetable has been generated yet".to_string())),
    }
}

async fn inputs_handler(State(state): State<AppState>) -> Result<Json<TimetableInput>, ApiError> {
    with_repo(&state, |repo| repo.input().map_err(internal))
        .await
        .map(Json)
}

async fn put_teachers(
    State(state): State<AppState>,
    Json(teachers): Json<Vec<Teacher>>,
) -> Result<StatusCode, ApiError> {
    with_repo(&state, move |repo| repo.save_teachers(&teachers).map_err(internal)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn put_fixed_slots(
    State(state): State<AppState>,
    Json(slots): Json<Vec<FixedSlot>>,
) -> Result<StatusCode, ApiError> {
    with_repo(&state, move |repo| repo.save_fixed_slots(&slots).map_err(internal)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn put_subjects(
    State(state): State<AppState>,
    Json(mappings): Json<Vec<SubjectRequirement>>,
) -> Result<StatusCode, ApiError> {
    with_repo(&state, move |repo| {
        repo.save_subject_mappings(&mappings).map_err(internal)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn upload_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    body: String,
) -> Result<Json<UploadSummary>, ApiError> {
    let kind = kind
        .parse::<UploadKind>()
        .map_err(|e: anyhow::Error| (StatusCode::NOT_FOUND, e.to_string()))?;
    let parse_error = |e: anyhow::Error| bad_request(format!("{e:#}"));

    let records = with_repo(&state, move |repo| match kind {
        UploadKind::Teachers => {
            let teachers = ingest::read_teachers(body.as_bytes()).map_err(parse_error)?;
            repo.save_teachers(&teachers).map_err(internal)?;
            Ok(teachers.len())
        }
        UploadKind::FixedSlots => {
            let slots = ingest::read_fixed_slots(body.as_bytes()).map_err(parse_error)?;
            repo.save_fixed_slots(&slots).map_err(internal)?;
            Ok(slots.len())
        }
        UploadKind::Subjects => {
            let mappings = ingest::read_subject_requirements(body.as_bytes()).map_err(parse_error)?;
            repo.save_subject_mappings(&mappings).map_err(internal)?;
            Ok(mappings.len())
        }
    })
    .await?;
    info!("Uploaded {} {} records", records, kind);
    Ok(Json(UploadSummary {
        kind: kind.to_string(),
        records,
    }))
}

async fn sample_handler(Path(kind): Path<String>) -> Result<Response, ApiError> {
    let kind = kind
        .parse::<UploadKind>()
        .map_err(|e: anyhow::Error| (StatusCode::NOT_FOUND, e.to_string()))?;
    let csv = ingest::sample_csv(kind).map_err(internal)?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv).into_response())
}

async fn export_handler(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let result = with_repo(&state, |repo| repo.result().map_err(internal))
        .await?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No timetable has been generated yet".to_string()))?;

    match params.format.as_deref().unwrap_or("csv") {
        "csv" => {
            let csv = match params.department.as_deref() {
                Some(department) => export::department_csv(&result.timetable, department)
                    .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?,
                None => export::summary_csv(&result.timetable).map_err(internal)?,
            };
            Ok(([(header::CONTENT_TYPE, "text/csv")], csv).into_response())
        }
        "html" => {
            let html = export::printable_html(&result.timetable);
            Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response())
        }
        other => Err(bad_request(format!("unsupported export format: {other}"))),
    }
}

async fn export_teachers(State(state): State<AppState>) -> Result<Response, ApiError> {
    let csv = with_repo(&state, |repo| {
        let teachers = repo.teachers().map_err(internal)?;
        export::teachers_csv(&teachers).map_err(internal)
    })
    .await?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv).into_response())
}

async fn export_backup(State(state): State<AppState>) -> Result<Response, ApiError> {
    let bundle = with_repo(&state, |repo| repo.export_bundle().map_err(internal)).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bundle).into_response())
}

async fn import_backup(State(state): State<AppState>, body: String) -> Result<StatusCode, ApiError> {
    with_repo(&state, move |repo| {
        repo.import_bundle(&body)
            .map_err(|e| bad_request(format!("{e:#}")))
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_handler(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    with_repo(&state, |repo| repo.clear_all().map_err(internal)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/timetable/regenerate", post(regenerate_handler))
        .route("/v1/timetable", get(timetable_handler))
        .route("/v1/timetable/export", get(export_handler))
        .route("/v1/teachers/export", get(export_teachers))
        .route("/v1/inputs", get(inputs_handler))
        .route("/v1/inputs/teachers", put(put_teachers))
        .route("/v1/inputs/fixed-slots", put(put_fixed_slots))
        .route("/v1/inputs/subjects", put(put_subjects))
        .route("/v1/upload/:kind", post(upload_handler))
        .route("/v1/samples/:kind", get(sample_handler))
        .route("/v1/backup", get(export_backup).post(import_backup))
        .route("/v1/data", delete(clear_handler))
        .with_state(state)
}

pub async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    let store = FileStore::open(config.data_dir())?;
    info!("Storing timetable data in {}", store.dir().display());
    let state = AppState::new(TimetableRepository::new(store), config.generator_options());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
