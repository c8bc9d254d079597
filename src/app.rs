use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::WizardSettings;
use crate::display::Presentation;
use crate::downloader;
use crate::error::WizardError;
use crate::field::{Attribute, FieldDefinition, FieldIndex};
use crate::form::FieldNameOption;
use crate::protocol::{PackageRequest, PackageResponse, UploadedFile};
use crate::saving;
use crate::validation::ValidationReport;
use crate::wizard::{AddFieldsOutcome, PackageChange, SubmitOutcome, Submission, Wizard};

pub struct AppState {
    wizard: Mutex<Wizard>,
}

impl AppState {
    pub fn new(settings: WizardSettings) -> Result<Self, WizardError> {
        Ok(AppState {
            wizard: Mutex::new(Wizard::new(settings)?),
        })
    }

    fn session(&self) -> MutexGuard<'_, Wizard> {
        self.wizard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A wizard failure as an HTTP response.
pub struct ApiError(WizardError);

impl From<WizardError> for ApiError {
    fn from(e: WizardError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WizardError::UnknownField(_) => StatusCode::NOT_FOUND,
            WizardError::UnknownAttribute(_)
            | WizardError::InvalidValue { .. }
            | WizardError::UnsupportedInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(StatusResponse::error(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

impl StatusResponse {
    fn ok() -> Self {
        StatusResponse {
            status: "ok".to_string(),
            message: None,
        }
    }

    fn error(message: String) -> Self {
        StatusResponse {
            status: "error".to_string(),
            message: Some(message),
        }
    }
}

#[derive(Deserialize)]
struct FieldNamesRequest {
    field_names: String,
}

#[derive(Deserialize)]
struct StudyNameRequest {
    study_name: String,
}

#[derive(Deserialize)]
struct ValueRequest {
    attribute: String,
    value: String,
}

#[derive(Deserialize)]
struct CheckRequest {
    attribute: String,
    value: String,
    checked: bool,
}

#[derive(Deserialize, Default)]
struct ConfirmRequest {
    #[serde(default)]
    confirm: bool,
}

#[derive(Deserialize)]
struct PackageSelection {
    #[serde(flatten)]
    package: PackageRequest,
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
struct FieldSnapshot {
    index: FieldIndex,
    name: String,
    shown: bool,
    presentation: Presentation,
    values: FieldDefinition,
}

#[derive(Serialize)]
struct FormSnapshot {
    study_name: String,
    field_names: String,
    fields: Vec<FieldSnapshot>,
    field_name_options: Vec<FieldNameOption>,
    selected_field: Option<FieldIndex>,
    existing_fields_visible: bool,
    package: Option<PackageRequest>,
    package_fields: Vec<String>,
    submitted: bool,
    report: Option<ValidationReport>,
}

fn snapshot(wizard: &Wizard) -> ApiResult<FormSnapshot> {
    let form = wizard.form();
    let mut fields = Vec::new();
    for panel in form.fields() {
        fields.push(FieldSnapshot {
            index: panel.index,
            name: panel.field_name().to_string(),
            shown: panel.shown,
            presentation: wizard.presentation(panel.index)?,
            values: panel.collect(),
        });
    }
    Ok(FormSnapshot {
        study_name: form.study_name.clone(),
        field_names: form.field_names.clone(),
        fields,
        field_name_options: form.field_name_options().to_vec(),
        selected_field: form.selected_field(),
        existing_fields_visible: form.existing_fields_visible(),
        package: wizard.package().cloned(),
        package_fields: wizard.registry().package_fields().iter().cloned().collect(),
        submitted: wizard.is_submitted(),
        report: wizard.last_report().cloned(),
    })
}

fn parse_attribute(name: &str) -> ApiResult<Attribute> {
    Attribute::from_name(name).ok_or_else(|| WizardError::UnknownAttribute(name.to_string()).into())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_wizard))
        .route("/api/form", get(get_form))
        .route("/api/study_name", post(set_study_name))
        .route("/api/fields", post(add_fields))
        .route("/api/field/:index/value", post(set_value))
        .route("/api/field/:index/check", post(set_checked))
        .route("/api/field/:index/remove", post(remove_field))
        .route("/api/field/:index/select", post(select_field))
        .route("/api/package", post(select_package))
        .route("/api/upload", post(upload))
        .route("/api/submit", post(submit))
        .route("/api/download/csv", get(download_csv))
        .route("/api/download/xlsx", get(download_xlsx))
        .route("/api/download/wizard", get(download_wizard_file))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(settings: WizardSettings, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app_state = Arc::new(AppState::new(settings)?);
    let app = router(app_state);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_wizard(State(state): State<Arc<AppState>>) -> Html<String> {
    let wizard = state.session();
    let mut page = String::from("<!DOCTYPE html>\n<html><head><title>Metadata Wizard</title></head><body>\n");
    page.push_str("<form id=\"metadata_form\">\n");
    page.push_str(&format!(
        "<label for=\"study_name\">Study name:</label> <input type=\"text\" id=\"study_name\" name=\"study_name\" value=\"{}\">\n",
        wizard.form().study_name.replace('"', "&quot;")
    ));
    page.push_str("<textarea id=\"field_names\" name=\"field_names\"></textarea>\n");
    for panel in wizard.form().fields() {
        page.push_str(&panel.to_markup());
    }
    page.push_str("</form>\n</body></html>\n");
    Html(page)
}

async fn get_form(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let wizard = state.session();
    Ok(Json(snapshot(&wizard)?))
}

async fn set_study_name(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StudyNameRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut wizard = state.session();
    wizard.set_study_name(&payload.study_name);
    Ok(Json(snapshot(&wizard)?))
}

async fn add_fields(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FieldNamesRequest>,
) -> ApiResult<Response> {
    let mut wizard = state.session();
    match wizard.add_field_names(&payload.field_names)? {
        AddFieldsOutcome::Added(indexes) => Ok(Json(serde_json::json!({
            "status": "ok",
            "added": indexes,
        }))
        .into_response()),
        AddFieldsOutcome::Rejected(messages) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "status": "error",
                "messages": messages,
            })),
        )
            .into_response()),
    }
}

async fn set_value(
    Path(index): Path<FieldIndex>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValueRequest>,
) -> ApiResult<impl IntoResponse> {
    let attribute = parse_attribute(&payload.attribute)?;
    let mut wizard = state.session();
    wizard.set_value(index, attribute, &payload.value)?;
    Ok(Json(snapshot(&wizard)?))
}

async fn set_checked(
    Path(index): Path<FieldIndex>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckRequest>,
) -> ApiResult<impl IntoResponse> {
    let attribute = parse_attribute(&payload.attribute)?;
    let mut wizard = state.session();
    wizard.set_checked(index, attribute, &payload.value, payload.checked)?;
    Ok(Json(snapshot(&wizard)?))
}

async fn remove_field(
    Path(index): Path<FieldIndex>,
    State(state): State<Arc<AppState>>,
    payload: Option<Json<ConfirmRequest>>,
) -> ApiResult<Response> {
    let confirmed = payload.map(|Json(p)| p.confirm).unwrap_or_default();
    let mut wizard = state.session();
    let mut prompt = String::new();
    let removed = wizard.remove_field(index, |message| {
        prompt = message.to_string();
        confirmed
    })?;
    if removed {
        Ok(Json(StatusResponse::ok()).into_response())
    } else {
        // unconfirmed: hand the question back to the client
        Ok((StatusCode::CONFLICT, Json(StatusResponse::error(prompt))).into_response())
    }
}

async fn select_field(
    Path(index): Path<FieldIndex>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let mut wizard = state.session();
    wizard.select_field(index)?;
    Ok(Json(StatusResponse::ok()))
}

async fn select_package(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PackageSelection>,
) -> ApiResult<Response> {
    let mut wizard = state.session();
    let package = wizard
        .settings()
        .find_package(&payload.package.env, &payload.package.sample_type)
        .cloned();
    let package = match package {
        Some(package) => package,
        None => {
            warn!(
                "no package for {} / {}",
                payload.package.env, payload.package.sample_type
            );
            return Ok((
                StatusCode::NOT_FOUND,
                Json(StatusResponse::error(format!(
                    "No package for environment '{}' and sample type '{}'",
                    payload.package.env, payload.package.sample_type
                ))),
            )
                .into_response());
        }
    };
    let response = PackageResponse::for_package(&package, &wizard.settings().reserved_words);

    let mut prompt = String::new();
    let confirmed = payload.confirm;
    match wizard.change_package(payload.package, |message| {
        prompt = message.to_string();
        confirmed
    }) {
        PackageChange::Declined => {
            Ok((StatusCode::CONFLICT, Json(StatusResponse::error(prompt))).into_response())
        }
        PackageChange::Unchanged => Ok(Json(response).into_response()),
        PackageChange::Reset => {
            wizard.apply_package_response(&response);
            Ok(Json(response).into_response())
        }
    }
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        let file_name = field
            .file_name()
            .or(field.name())
            .unwrap_or("unknown")
            .to_string();
        let data = field.bytes().await.unwrap_or_default().to_vec();
        files.push((file_name, data));
    }

    let response = saving::upload_response(&files);
    let mut wizard = state.session();
    let errors = wizard.apply_upload_response(&response)?;
    let files: Vec<UploadedFile> = response.files;
    Ok(Json(serde_json::json!({
        "files": files,
        "errors": errors,
        "form": snapshot(&wizard)?,
    })))
}

async fn submit(State(state): State<Arc<AppState>>) -> Response {
    let mut wizard = state.session();
    match wizard.submit() {
        SubmitOutcome::Accepted(submission) => Json(serde_json::json!({
            "status": "ok",
            "submission": submission,
        }))
        .into_response(),
        SubmitOutcome::Rejected(report) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "status": "error",
                "summary": report.summary_text(),
                "report": report,
            })),
        )
            .into_response(),
    }
}

/// Runs a submit; a rejected one becomes the error response.
fn accepted_submission(state: &AppState) -> Result<Submission, Response> {
    match state.session().submit() {
        SubmitOutcome::Accepted(submission) => Ok(submission),
        SubmitOutcome::Rejected(report) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(StatusResponse::error(report.summary_text())),
        )
            .into_response()),
    }
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Bytes::from(body),
    )
        .into_response()
}

fn file_stem(submission: &Submission) -> String {
    let stem = submission.study_name.trim().replace(' ', "_");
    if stem.is_empty() {
        "metadata".to_string()
    } else {
        stem
    }
}

fn export_error(e: Box<dyn std::error::Error>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(StatusResponse::error(e.to_string())),
    )
        .into_response()
}

async fn download_csv(State(state): State<Arc<AppState>>) -> Response {
    let submission = match accepted_submission(&state) {
        Ok(submission) => submission,
        Err(response) => return response,
    };
    match downloader::to_csv(&submission) {
        Ok(csv) => attachment(
            "text/csv",
            &format!("{}.csv", file_stem(&submission)),
            csv.into_bytes(),
        ),
        Err(e) => export_error(e),
    }
}

async fn download_xlsx(State(state): State<Arc<AppState>>) -> Response {
    let submission = match accepted_submission(&state) {
        Ok(submission) => submission,
        Err(response) => return response,
    };
    match downloader::to_xlsx(&submission) {
        Ok(xlsx) => attachment(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            &format!("{}.xlsx", file_stem(&submission)),
            xlsx,
        ),
        Err(e) => export_error(e),
    }
}

async fn download_wizard_file(State(state): State<Arc<AppState>>) -> Response {
    let submission = match accepted_submission(&state) {
        Ok(submission) => submission,
        Err(response) => return response,
    };
    match saving::to_bytes(&submission) {
        Ok(bytes) => attachment(
            "application/gzip",
            &format!("{}.wizard.json.gz", file_stem(&submission)),
            bytes,
        ),
        Err(e) => ApiError(e).into_response(),
    }
}
