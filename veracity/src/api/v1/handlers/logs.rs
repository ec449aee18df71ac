use axum::extract::{Query, State};
use axum::Json;

use crate::api::v1::dto::{ListLogsQuery, ListLogsResponse};
use crate::api::AppState;
use crate::error::Result;

/// `GET /api/v1/logs`
#[utoipa::path(
    get,
    path = "/api/v1/logs",
    tag = "logs",
    params(ListLogsQuery),
    responses(
        (status = 200, description = "Most recent corrected answers", body = ListLogsResponse),
        (status = 500, description = "Database failure"),
    )
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<ListLogsQuery>,
) -> Result<Json<ListLogsResponse>> {
    let Some(db) = &state.db else {
        return Ok(Json(ListLogsResponse {
            logging_enabled: false,
            logs: Vec::new(),
        }));
    };

    let entries = db.list_recent(query.limit()).await?;
    Ok(Json(ListLogsResponse {
        logging_enabled: true,
        logs: entries.into_iter().map(Into::into).collect(),
    }))
}
