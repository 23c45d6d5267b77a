//! Users resource client (`/usuarios`, `/roles`).

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::models::{Rol, Usuario};

#[derive(Clone)]
pub struct UsuariosClient {
    api: Arc<ApiClient>,
}

impl UsuariosClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Usuario>, ApiError> {
        self.api.get("/usuarios").await
    }

    pub async fn create(&self, usuario: &Usuario) -> Result<Usuario, ApiError> {
        self.api.post("/usuarios", usuario).await
    }

    pub async fn update(&self, id: &str, usuario: &Usuario) -> Result<Usuario, ApiError> {
        self.api.put(&format!("/usuarios/{id}"), usuario).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/usuarios/{id}")).await
    }

    /// Server-side name search (`GET /usuarios/buscar?nombre=`).
    pub async fn search(&self, nombre: &str) -> Result<Vec<Usuario>, ApiError> {
        self.api
            .get_query("/usuarios/buscar", &[("nombre", nombre)])
            .await
    }

    pub async fn roles(&self) -> Result<Vec<Rol>, ApiError> {
        self.api.get("/roles").await
    }
}
