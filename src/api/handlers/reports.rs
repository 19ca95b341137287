//! Report handlers: full report, loss buckets and player drill-down.
//!
//! Every request re-runs the pipeline over the session's current uploads.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    LossBucketDto, LossParams, LossReportResponse, PlayerParams, PlayerReportResponse,
    ReportResponse, rows_to_dto, status_str,
};
use crate::app_state::AppState;
use crate::domain::{GameLabel, Interval, LossView, PlayerScope, SessionId};
use crate::error::{ErrorResponse, ReportError};

/// `GET /sessions/:id/report`: Full report over the session's uploads.
///
/// # Errors
///
/// Returns [`ReportError::SessionNotFound`] if the session does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/report",
    tag = "Reports",
    summary = "Generate the report",
    description = "Ingests every uploaded file and returns per-file outcomes, coercion counts, the per-interval, per-game and per-player views and the grand total. Returns status `nothing_to_report` with empty tables when no file could be ingested.",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
    ),
    responses(
        (status = 200, description = "Report", body = ReportResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ReportError> {
    let report = state
        .report_service
        .report(SessionId::from_uuid(id))
        .await?;
    Ok(Json(ReportResponse::from(&report)))
}

/// `GET /sessions/:id/report/losses`: Loss-making buckets, worst first.
///
/// # Errors
///
/// Returns [`ReportError::InvalidRequest`] for an unknown `view` and
/// [`ReportError::SessionNotFound`] if the session does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/report/losses",
    tag = "Reports",
    summary = "List loss-making buckets",
    description = "Buckets whose summed net result is negative, sorted ascending, each with the players whose losing rows fall in it.",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
        LossParams,
    ),
    responses(
        (status = 200, description = "Loss buckets", body = LossReportResponse),
        (status = 400, description = "Unknown view", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn get_losses(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<LossParams>,
) -> Result<impl IntoResponse, ReportError> {
    let view = match params.view.as_deref() {
        Some(raw) => raw.parse::<LossView>().map_err(ReportError::InvalidRequest)?,
        None => LossView::default(),
    };
    let report = state
        .report_service
        .report(SessionId::from_uuid(id))
        .await?;

    let buckets = report
        .loss_buckets(view)
        .iter()
        .map(LossBucketDto::from)
        .collect();
    let view = match view {
        LossView::Intervals => "intervals",
        LossView::Daily => "daily",
    };
    Ok(Json(LossReportResponse {
        status: status_str(report.status).to_string(),
        view: view.to_string(),
        buckets,
    }))
}

/// `GET /sessions/:id/report/players`: Per-player sums in a scope.
///
/// # Errors
///
/// Returns [`ReportError::InvalidGameLabel`] for a blank `game`,
/// [`ReportError::InvalidRequest`] for a malformed `interval`, and
/// [`ReportError::SessionNotFound`] if the session does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/report/players",
    tag = "Reports",
    summary = "Player drill-down",
    description = "Per-player sums, optionally restricted to one game, one hourly interval and to losing rows.",
    params(
        ("id" = uuid::Uuid, Path, description = "Session UUID"),
        PlayerParams,
    ),
    responses(
        (status = 200, description = "Player rows", body = PlayerReportResponse),
        (status = 400, description = "Invalid game or interval", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn get_players(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<PlayerParams>,
) -> Result<impl IntoResponse, ReportError> {
    let scope = player_scope(&params)?;
    let report = state
        .report_service
        .report(SessionId::from_uuid(id))
        .await?;

    Ok(Json(PlayerReportResponse {
        status: status_str(report.status).to_string(),
        players: rows_to_dto(&report.players(&scope)),
    }))
}

/// Report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/{id}/report", get(get_report))
        .route("/sessions/{id}/report/losses", get(get_losses))
        .route("/sessions/{id}/report/players", get(get_players))
}

fn player_scope(params: &PlayerParams) -> Result<PlayerScope, ReportError> {
    let game = params
        .game
        .as_deref()
        .map(|raw| {
            GameLabel::new(raw)
                .ok_or_else(|| ReportError::InvalidGameLabel("must not be empty".to_string()))
        })
        .transpose()?;
    let interval = params
        .interval
        .as_deref()
        .map(|raw| {
            Interval::parse_label(raw)
                .ok_or_else(|| ReportError::InvalidRequest(format!("invalid interval: {raw:?}")))
        })
        .transpose()?;
    Ok(PlayerScope {
        game,
        interval,
        losing_rows_only: params.losing_rows_only,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn scope_from_query() {
        let params = PlayerParams {
            game: Some(" Roleta ".to_string()),
            interval: Some("09:00 - 10:00".to_string()),
            losing_rows_only: true,
        };
        let Ok(scope) = player_scope(&params) else {
            panic!("scope should parse");
        };
        assert_eq!(scope.game.as_ref().map(GameLabel::as_str), Some("Roleta"));
        assert_eq!(scope.interval.map(|i| i.start_hour()), Some(9));
        assert!(scope.losing_rows_only);
    }

    #[test]
    fn malformed_scope_is_rejected() {
        let bad_interval = PlayerParams {
            game: None,
            interval: Some("9h".to_string()),
            losing_rows_only: false,
        };
        assert!(matches!(
            player_scope(&bad_interval),
            Err(ReportError::InvalidRequest(_))
        ));

        let blank_game = PlayerParams {
            game: Some("  ".to_string()),
            interval: None,
            losing_rows_only: false,
        };
        assert!(matches!(
            player_scope(&blank_game),
            Err(ReportError::InvalidGameLabel(_))
        ));
    }
}
