//! Job control and execution log endpoints.

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Form, Query, State,
    },
    routing::{get, post},
    Router,
};
use crontab_store::{Job, JobLog};
use serde::Deserialize;

use crate::envelope::ResponseEnvelope;
use crate::error::{ApiError, ApiResult};
use crate::logs::PageParams;
use crate::AppState;

/// Job routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/job/save", post(save_job))
        .route("/job/delete", post(delete_job))
        .route("/job/list", get(list_jobs))
        .route("/job/kill", post(kill_job))
        .route("/job/log", get(list_job_log))
}

/// Form of `POST /job/save`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SaveJobForm {
    /// JSON encoded job.
    pub job: String,
}

/// Form of `POST /job/delete` and `POST /job/kill`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JobNameForm {
    pub name: String,
}

/// Query of `GET /job/log`.
///
/// `skip` and `limit` stay raw strings; unparseable values fall back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JobLogParams {
    pub name: String,
    pub skip: Option<String>,
    pub limit: Option<String>,
}

/// Decode a job from its form value.
pub fn parse_job(raw: &str) -> ApiResult<Job> {
    let job: Job = serde_json::from_str(raw)?;
    if job.name.is_empty() {
        return Err(ApiError::Deserialization("job name is empty".to_string()));
    }
    Ok(job)
}

/// A form that cannot be read at all counts as a form with every field
/// missing, so the failure surfaces as an envelope rather than a 4xx.
fn form_or_default<T: Default>(form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(value)) => value,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable form, treating fields as missing");
            T::default()
        }
    }
}

/// Save a job, answering with the job it replaced.
pub async fn save_job(
    State(state): State<AppState>,
    form: Result<Form<SaveJobForm>, FormRejection>,
) -> ApiResult<ResponseEnvelope<Job>> {
    let job = parse_job(&form_or_default(form).job)?;

    let previous = state
        .coordinator
        .save_job(&job)
        .await
        .map_err(ApiError::Coordination)?;

    tracing::info!(job = %job.name, replaced = previous.is_some(), "Job saved");
    Ok(ResponseEnvelope::success(previous))
}

/// Delete a job, answering with the deleted job.
///
/// The name is forwarded as-is, including an empty one.
pub async fn delete_job(
    State(state): State<AppState>,
    form: Result<Form<JobNameForm>, FormRejection>,
) -> ApiResult<ResponseEnvelope<Job>> {
    let name = form_or_default(form).name;

    let previous = state
        .coordinator
        .delete_job(&name)
        .await
        .map_err(ApiError::Coordination)?;

    tracing::info!(job = %name, existed = previous.is_some(), "Job deleted");
    Ok(ResponseEnvelope::success(previous))
}

/// List every stored job.
pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<ResponseEnvelope<Vec<Job>>> {
    let jobs = state
        .coordinator
        .list_jobs()
        .await
        .map_err(ApiError::Coordination)?;

    Ok(ResponseEnvelope::success(Some(jobs)))
}

/// Signal workers to kill the running instance of a job.
pub async fn kill_job(
    State(state): State<AppState>,
    form: Result<Form<JobNameForm>, FormRejection>,
) -> ApiResult<ResponseEnvelope<()>> {
    let name = form_or_default(form).name;

    state
        .coordinator
        .kill_job(&name)
        .await
        .map_err(ApiError::Coordination)?;

    tracing::info!(job = %name, "Kill signal sent");
    Ok(ResponseEnvelope::success(None))
}

/// Page through the execution log of a job, newest first.
pub async fn list_job_log(
    State(state): State<AppState>,
    params: Result<Query<JobLogParams>, QueryRejection>,
) -> ApiResult<ResponseEnvelope<Vec<JobLog>>> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let page = PageParams::parse(params.skip.as_deref(), params.limit.as_deref());

    let records = state
        .logs
        .list_log(&params.name, page.skip, page.limit)
        .await
        .map_err(ApiError::StoreQuery)?;

    Ok(ResponseEnvelope::success(Some(records)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job() {
        let job = parse_job(r#"{"name":"job1","command":"echo hi","cronExpr":"* * * * *"}"#).unwrap();
        assert_eq!(job, Job::new("job1", "echo hi", "* * * * *"));
    }

    #[test]
    fn test_parse_job_fills_missing_fields() {
        let job = parse_job(r#"{"name":"job1"}"#).unwrap();
        assert_eq!(job, Job::new("job1", "", ""));
    }

    #[test]
    fn test_parse_job_rejects_bad_payloads() {
        for raw in [
            "",
            "not json",
            r#"{"command":"echo hi"}"#,
            r#"{"name":"","command":"echo hi","cronExpr":"* * * * *"}"#,
        ] {
            let err = parse_job(raw).unwrap_err();
            assert!(matches!(err, ApiError::Deserialization(_)), "{raw}");
        }
    }

    #[test]
    fn test_form_rejection_falls_back_to_default() {
        let form: Result<Form<JobNameForm>, FormRejection> = Ok(Form(JobNameForm {
            name: "job1".to_string(),
        }));
        assert_eq!(form_or_default(form).name, "job1");
    }
}
