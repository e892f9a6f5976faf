//! Session maintenance endpoints.

use axum::{Extension, Json, extract::State};
use filmoteka::User;
use serde::{Deserialize, Serialize};

use super::{AppState, error::ApiError};
use crate::metrics;

#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub purged: u64,
}

/// Delete every expired session row. Admin only.
///
/// Expired sessions are already rejected on lookup; this only reclaims space.
pub async fn purge_expired(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let purged = state.auth_manager.purge_expired_sessions().await?;
    metrics::sessions_purged_total(purged);
    tracing::info!(admin_id = admin.id, purged, "purged expired sessions");
    Ok(Json(PurgeResponse { purged }))
}
