//! Report API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use uuid::Uuid;

use crate::core::ServerState;
use crate::db::models::ReportStatus;
use crate::db::repository::{report, store, system_state};
use crate::reports::ReportJob;
use crate::utils::{AppError, AppResult};

const REPORT_STATUS_HEADER: HeaderName = HeaderName::from_static("x-report-status");

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub report_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReportStatusBody {
    pub status: &'static str,
}

/// POST /trigger_report/{store_id} - 创建报告任务
pub async fn trigger(
    State(state): State<ServerState>,
    Path(store_id): Path<String>,
) -> AppResult<(StatusCode, Json<TriggerResponse>)> {
    let store_id = Uuid::parse_str(store_id.trim())
        .map_err(|_| AppError::validation(format!("Invalid store id: {store_id}")))?
        .to_string();

    store::find_by_id(&state.pool, &store_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Store {store_id} not found")))?;

    // 参考时间由导入写入；缺失说明尚未导入，属于服务端状态问题
    let reference = system_state::get_reference_time(&state.pool)
        .await
        .map_err(|e| AppError::internal(e.to_string()))?
        .ok_or_else(|| AppError::internal("Reference time not set, run ingestion first"))?;

    let report_id = Uuid::new_v4().to_string();
    report::create(&state.pool, &report_id, &store_id).await?;

    let job = ReportJob {
        report_id: report_id.clone(),
        store_id: store_id.clone(),
        reference,
    };
    if let Err(e) = state.queue.submit(job).await {
        report::mark_failed(&state.pool, &report_id).await?;
        return Err(AppError::internal(e.to_string()));
    }

    tracing::info!(report_id = %report_id, store_id = %store_id, "Report triggered");
    Ok((StatusCode::ACCEPTED, Json(TriggerResponse { report_id })))
}

/// GET /get_report/{report_id} - 查询报告状态 / 下载 CSV
pub async fn get(
    State(state): State<ServerState>,
    Path(report_id): Path<String>,
) -> AppResult<Response> {
    let report = report::find_by_id(&state.pool, &report_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Report {report_id} not found")))?;

    match report.status {
        ReportStatus::Pending | ReportStatus::Running => Ok((
            StatusCode::ACCEPTED,
            Json(ReportStatusBody { status: "running" }),
        )
            .into_response()),
        ReportStatus::Failed => Ok((
            StatusCode::GONE,
            Json(ReportStatusBody { status: "failed" }),
        )
            .into_response()),
        ReportStatus::Complete => {
            let path = report.report_file_path.ok_or_else(|| {
                AppError::internal(format!("Report {report_id} has no file path"))
            })?;
            let body = tokio::fs::read(&path).await.map_err(|e| {
                tracing::error!(report_id = %report_id, file = %path, error = %e, "Report file unreadable");
                AppError::internal(format!("Report {report_id} file is unavailable"))
            })?;

            let headers = [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"report_{report_id}.csv\""),
                ),
                (REPORT_STATUS_HEADER, "Complete".to_string()),
            ];
            Ok((StatusCode::OK, headers, body).into_response())
        }
    }
}
