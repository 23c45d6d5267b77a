//! Products resource client (`/productos`).

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::models::{Producto, ProductoCreateRequest};

#[derive(Clone)]
pub struct ProductosClient {
    api: Arc<ApiClient>,
}

impl ProductosClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Raw product list. Category fields come back in the backend's mixed
    /// string-or-object shape; callers normalise against the category
    /// catalogue (see `models::resolver_categoria`).
    pub async fn list(&self) -> Result<Vec<Producto>, ApiError> {
        self.api.get("/productos").await
    }

    pub async fn create(&self, producto: &ProductoCreateRequest) -> Result<Producto, ApiError> {
        self.api.post("/productos/crear", producto).await
    }

    pub async fn update(&self, id: i64, producto: &Producto) -> Result<Producto, ApiError> {
        self.api.put(&format!("/productos/{id}"), producto).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("/productos/{id}")).await
    }

    pub async fn activate(&self, id: i64) -> Result<Producto, ApiError> {
        self.api.put_empty(&format!("/productos/{id}/activar")).await
    }

    pub async fn deactivate(&self, id: i64) -> Result<Producto, ApiError> {
        self.api
            .put_empty(&format!("/productos/{id}/desactivar"))
            .await
    }
}
