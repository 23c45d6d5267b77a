//! Categories resource client (`/categorias`).

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::models::Categoria;

#[derive(Clone)]
pub struct CategoriasClient {
    api: Arc<ApiClient>,
}

impl CategoriasClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Categoria>, ApiError> {
        self.api.get("/categorias").await
    }

    pub async fn create(&self, categoria: &Categoria) -> Result<Categoria, ApiError> {
        self.api.post("/categorias", categoria).await
    }

    pub async fn update(&self, id: i64, categoria: &Categoria) -> Result<Categoria, ApiError> {
        self.api.put(&format!("/categorias/{id}"), categoria).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("/categorias/{id}")).await
    }
}
