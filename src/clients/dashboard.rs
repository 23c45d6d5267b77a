//! Dashboard statistics client (`/dashboard/estadisticas`).

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::models::DashboardEstadisticas;

#[derive(Clone)]
pub struct DashboardClient {
    api: Arc<ApiClient>,
}

impl DashboardClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn estadisticas(&self) -> Result<DashboardEstadisticas, ApiError> {
        self.api.get("/dashboard/estadisticas").await
    }
}
