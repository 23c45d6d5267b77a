//! Orders resource client (`/comandas`, `/detalle-comandas`).
//!
//! Status transitions are dedicated PUT endpoints with empty bodies; the
//! compound table actions (`finalizar-y-liberar`, `pagar-todas`) are single
//! POSTs the server applies atomically from this client's perspective.

use std::sync::Arc;

use serde_json::Value;

use crate::api::{ApiClient, ApiError};
use crate::models::{
    Comanda, ComandaCreateRequest, DetalleCreateRequest, FacturacionMesa,
    FinalizarLiberarResultado, PagarTodasResultado,
};

#[derive(Clone)]
pub struct ComandasClient {
    api: Arc<ApiClient>,
}

impl ComandasClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Comanda>, ApiError> {
        self.api.get("/comandas").await
    }

    /// Create the order header; line items follow through [`add_detail`].
    ///
    /// [`add_detail`]: ComandasClient::add_detail
    pub async fn create(&self, comanda: &ComandaCreateRequest) -> Result<Comanda, ApiError> {
        self.api.post("/comandas/crear", comanda).await
    }

    pub async fn add_detail(&self, detalle: &DetalleCreateRequest) -> Result<Value, ApiError> {
        self.api.post("/detalle-comandas/crear", detalle).await
    }

    /// Pending → InPreparation; the one request carries the cook assignment.
    pub async fn mark_in_preparation(
        &self,
        id: i64,
        id_cocinero: &str,
    ) -> Result<Comanda, ApiError> {
        self.api
            .put_empty(&format!("/comandas/{id}/preparacion/{id_cocinero}"))
            .await
    }

    pub async fn mark_completed(&self, id: i64) -> Result<Comanda, ApiError> {
        self.api.put_empty(&format!("/comandas/{id}/completada")).await
    }

    pub async fn mark_cancelled(&self, id: i64) -> Result<Comanda, ApiError> {
        self.api.put_empty(&format!("/comandas/{id}/cancelada")).await
    }

    /// Cook reassignment independent of any status transition.
    pub async fn assign_cook(&self, id: i64, id_cocinero: &str) -> Result<Comanda, ApiError> {
        self.api
            .put_empty(&format!("/comandas/{id}/asignar-cocinero/{id_cocinero}"))
            .await
    }

    pub async fn billing(&self, id_mesa: i64) -> Result<FacturacionMesa, ApiError> {
        self.api
            .get(&format!("/comandas/mesa/{id_mesa}/facturacion"))
            .await
    }

    pub async fn finalize_and_release(
        &self,
        id_mesa: i64,
    ) -> Result<FinalizarLiberarResultado, ApiError> {
        self.api
            .post_empty(&format!("/comandas/mesa/{id_mesa}/finalizar-y-liberar"))
            .await
    }

    pub async fn mark_paid(&self, id: i64) -> Result<Comanda, ApiError> {
        self.api.put_empty(&format!("/comandas/{id}/pagar")).await
    }

    pub async fn mark_all_paid(&self, id_mesa: i64) -> Result<PagarTodasResultado, ApiError> {
        self.api
            .post_empty(&format!("/comandas/mesa/{id_mesa}/pagar-todas"))
            .await
    }
}
