//! Guest order tracking.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use lodra_core::schema::Order;
use lodra_core::{OrderStatus, TrackingCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::filters;
use crate::page::PageContext;
use crate::services::storage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub code: Option<String>,
}

/// One step of the delivery progress bar.
#[derive(Debug, Clone)]
pub struct StatusStep {
    pub label: &'static str,
    pub done: bool,
    pub current: bool,
}

/// Progress bar for an order. Cancelled orders have no steps.
#[must_use]
pub fn status_steps(status: OrderStatus) -> Vec<StatusStep> {
    if status == OrderStatus::Cancelled {
        return Vec::new();
    }
    let steps = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];
    let reached = steps.iter().position(|s| *s == status).unwrap_or(0);
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| StatusStep {
            label: step.label(),
            done: i <= reached,
            current: i == reached,
        })
        .collect()
}

/// Order tracking page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/track.html")]
pub struct TrackTemplate {
    pub page: PageContext,
    pub code: String,
    pub order: Option<Order>,
    pub steps: Vec<StatusStep>,
    pub error: Option<&'static str>,
}

/// Look up an order by tracking code.
///
/// Without `?code=` the form is prefilled with the last code placed from this
/// browser.
#[instrument(skip(state, session, page))]
pub async fn track(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Query(query): Query<TrackQuery>,
) -> TrackTemplate {
    let raw = query
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let Some(raw) = raw else {
        let code = storage::last_tracking_code(&session)
            .await
            .map(|c| c.as_str().to_string())
            .unwrap_or_default();
        return TrackTemplate {
            page,
            code,
            order: None,
            steps: Vec::new(),
            error: None,
        };
    };

    let mut template = TrackTemplate {
        page,
        code: raw.to_string(),
        order: None,
        steps: Vec::new(),
        error: None,
    };

    let Ok(code) = TrackingCode::parse(raw) else {
        template.error = Some("Kodi i gjurmimit nuk është i vlefshëm");
        return template;
    };

    match state.api().track_order(&code).await {
        Ok(order) => {
            template.steps = status_steps(order.status);
            template.order = Some(order);
        }
        Err(ApiError::NotFound(_)) => {
            template.error = Some("Nuk u gjet asnjë porosi me këtë kod");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Order tracking failed");
            template.error = Some("Gjurmimi nuk është i disponueshëm tani. Provoni përsëri.");
        }
    }
    template
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_mark_progress() {
        let steps = status_steps(OrderStatus::Shipped);
        assert_eq!(steps.len(), 4);
        assert!(steps[0].done && steps[1].done && steps[2].done);
        assert!(steps[2].current);
        assert!(!steps[3].done);
    }

    #[test]
    fn test_cancelled_has_no_steps() {
        assert!(status_steps(OrderStatus::Cancelled).is_empty());
    }
}
