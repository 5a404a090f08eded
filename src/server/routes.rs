use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use crate::server::AppState;
use crate::storage::{SourceStore, StoreStats};
use crate::{Error, Source};

#[derive(Deserialize)]
pub struct CreateSource {
    pub filename: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct UpdateSource {
    pub content: String,
}

#[derive(Deserialize, Default)]
pub struct ExportRequest {
    /// Subdirectory of the configured export directory; the directory itself when absent
    #[serde(default)]
    pub target_dir: Option<PathBuf>,
}

#[derive(Serialize, Debug)]
pub struct ExportResponse {
    pub path: PathBuf,
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Duplicate(_) => StatusCode::CONFLICT,
        Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        Error::InvalidPath(_) => StatusCode::BAD_REQUEST,
        Error::Io { .. } | Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: Error) -> ApiError {
    (
        status_for(&err),
        Json(ErrorResponse {
            error: err.to_string(),
            kind: err.kind(),
        }),
    )
}

/// Run store work on the blocking pool with a fresh connection
async fn with_store<T, F>(state: Arc<AppState>, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&SourceStore, &AppState) -> crate::Result<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || {
        let store = state.open_store()?;
        op(&store, &state)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("worker failed: {}", e),
                kind: "internal",
            }),
        )
    })?;

    result.map(Json).map_err(reject)
}

pub async fn list_sources(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Source>> {
    with_store(state, |store, _| store.list()).await
}

pub async fn create_source(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSource>,
) -> Result<(StatusCode, Json<Source>), ApiError> {
    let created = with_store(state, move |store, _| store.create(&body.filename, &body.content)).await?;
    Ok((StatusCode::CREATED, created))
}

pub async fn get_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Source> {
    with_store(state, move |store, _| store.get(id)).await
}

pub async fn find_source(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> ApiResult<Source> {
    with_store(state, move |store, _| store.find(&filename)).await
}

pub async fn update_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSource>,
) -> ApiResult<Source> {
    with_store(state, move |store, _| store.update(id, &body.content)).await
}

pub async fn delete_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let Json(()) = with_store(state, move |store, _| store.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn export_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ExportRequest>,
) -> ApiResult<ExportResponse> {
    with_store(state, move |store, state| {
        let target = match &body.target_dir {
            Some(dir) => Some(export_subdir(state.exporter.default_dir(), dir)?),
            None => None,
        };
        let source = store.get(id)?;
        let path = match target {
            Some(dir) => state.exporter.export_into(&source, &dir)?,
            None => state.exporter.export(&source)?,
        };
        Ok(ExportResponse { path })
    })
    .await
}

/// Remote callers may only pick a directory below the export directory
fn export_subdir(default_dir: &std::path::Path, requested: &std::path::Path) -> crate::Result<PathBuf> {
    match requested.to_str() {
        Some(relative) if crate::path::is_safe_relative(relative) => Ok(default_dir.join(relative)),
        _ => Err(Error::InvalidPath(format!(
            "export target {} must be a relative directory below the export directory",
            requested.display()
        ))),
    }
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<StoreStats> {
    with_store(state, |store, _| store.stats()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::SourceExporter;
    use crate::validator::RecordingValidator;
    use std::time::Duration;

    fn state(dir: &std::path::Path) -> Arc<AppState> {
        Arc::new(AppState {
            database_path: dir.join("sources.db"),
            validator: Arc::new(RecordingValidator::rejecting("BROKEN")),
            validation_timeout: Duration::from_secs(5),
            exporter: SourceExporter::new(dir.join("export")),
        })
    }

    fn create_body(filename: &str, content: &str) -> Json<CreateSource> {
        Json(CreateSource {
            filename: filename.to_string(),
            content: content.to_string(),
        })
    }

    #[test]
    fn test_router_builds() {
        let dir = tempfile::tempdir().unwrap();
        let _ = crate::server::router(state(dir.path()));
    }

    #[tokio::test]
    async fn test_create_then_find_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let (status, Json(created)) = create_source(State(state.clone()), create_body("net/main.tf", "x"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(found) = find_source(State(state.clone()), Path("net/main.tf".to_string()))
            .await
            .unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        create_source(State(state.clone()), create_body("main.tf", "x")).await.unwrap();

        let (status, Json(body)) = create_source(State(state.clone()), create_body("main.tf", "y"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.kind, "duplicate");

        let (status, _) = create_source(State(state.clone()), create_body("bad.tf", "BROKEN"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = get_source(State(state.clone()), Path(999)).await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = create_source(State(state.clone()), create_body("../x.tf", "x"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_defaults_to_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let (_, Json(created)) = create_source(State(state.clone()), create_body("main.tf", "resource X {}"))
            .await
            .unwrap();

        let Json(exported) = export_source(
            State(state.clone()),
            Path(created.id),
            Json(ExportRequest::default()),
        )
        .await
        .unwrap();

        assert_eq!(exported.path, dir.path().join("export").join("main.tf"));
        assert_eq!(std::fs::read_to_string(&exported.path).unwrap(), "resource X {}");
    }

    #[tokio::test]
    async fn test_export_target_stays_below_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let outside = dir.path().join("outside");

        let (_, Json(created)) = create_source(State(state.clone()), create_body("main.tf", "x"))
            .await
            .unwrap();

        let (status, Json(body)) = export_source(
            State(state.clone()),
            Path(created.id),
            Json(ExportRequest { target_dir: Some(outside.clone()) }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, "invalid_path");
        assert!(!outside.exists());

        let (status, _) = export_source(
            State(state.clone()),
            Path(created.id),
            Json(ExportRequest { target_dir: Some(PathBuf::from("../escape")) }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let Json(exported) = export_source(
            State(state.clone()),
            Path(created.id),
            Json(ExportRequest { target_dir: Some(PathBuf::from("staging/eu")) }),
        )
        .await
        .unwrap();
        assert_eq!(
            exported.path,
            dir.path().join("export").join("staging").join("eu").join("main.tf")
        );
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let (_, Json(created)) = create_source(State(state.clone()), create_body("main.tf", "a"))
            .await
            .unwrap();

        let Json(updated) = update_source(
            State(state.clone()),
            Path(created.id),
            Json(UpdateSource { content: "b".to_string() }),
        )
        .await
        .unwrap();
        assert_eq!(updated.content, "b");

        let status = delete_source(State(state.clone()), Path(created.id)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(stats) = get_stats(State(state)).await.unwrap();
        assert_eq!(stats.sources, 0);
    }
}
