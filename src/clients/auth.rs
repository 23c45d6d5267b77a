//! Login endpoint client.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::api::{ApiClient, ApiError};
use crate::session::SesionUsuario;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Clone)]
pub struct AuthClient {
    api: Arc<ApiClient>,
}

impl AuthClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// `POST /auth/login`. On success the whole response blob becomes the
    /// session (stored through the session store); a 2xx response without a
    /// token is still a failure. Auth-status errors from this call never
    /// trigger the forced-logout path — there is no session to expire yet.
    pub async fn login(&self, email: &str, password: &str) -> Result<SesionUsuario, ApiError> {
        let usuario: SesionUsuario = self
            .api
            .post("/auth/login", &LoginRequest { email, password })
            .await?;
        if usuario.token.trim().is_empty() {
            return Err(ApiError::Decode(
                "la respuesta de login no incluye token".to_string(),
            ));
        }
        self.api.session().set_usuario(usuario.clone());
        info!(nombre = %usuario.nombre, rol = %usuario.rol, "login successful");
        Ok(usuario)
    }
}
