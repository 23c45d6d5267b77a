//! Tables resource client (`/mesas`, `/estados`).

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::models::{Estado, Mesa, MesaPayload};

#[derive(Clone)]
pub struct MesasClient {
    api: Arc<ApiClient>,
}

impl MesasClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Mesa>, ApiError> {
        self.api.get("/mesas").await
    }

    pub async fn get(&self, id: i64) -> Result<Mesa, ApiError> {
        self.api.get(&format!("/mesas/{id}")).await
    }

    pub async fn create(&self, mesa: &MesaPayload) -> Result<Mesa, ApiError> {
        self.api.post("/mesas", mesa).await
    }

    pub async fn update(&self, id: i64, mesa: &MesaPayload) -> Result<Mesa, ApiError> {
        self.api.put(&format!("/mesas/{id}"), mesa).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("/mesas/{id}")).await
    }

    pub async fn occupy(&self, id: i64) -> Result<Mesa, ApiError> {
        self.api.put_empty(&format!("/mesas/{id}/ocupar")).await
    }

    pub async fn free(&self, id: i64) -> Result<Mesa, ApiError> {
        self.api.put_empty(&format!("/mesas/{id}/liberar")).await
    }

    pub async fn reserve(&self, id: i64) -> Result<Mesa, ApiError> {
        self.api.put_empty(&format!("/mesas/{id}/reservar")).await
    }

    /// Full status list; the table view filters it down to the statuses a
    /// table may actually hold.
    pub async fn states(&self) -> Result<Vec<Estado>, ApiError> {
        self.api.get("/estados").await
    }
}
