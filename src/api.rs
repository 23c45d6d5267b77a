//! Restaurante backend API client.
//!
//! Shared authenticated HTTP plumbing for every resource client: base-URL
//! normalisation, bearer-token injection from the session store, and mapping
//! of transport and status failures into [`ApiError`].

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::session::SessionStore;

/// Default timeout for API requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the backend base URL:
/// - strip trailing slashes
/// - strip a trailing `/api` segment (the client re-appends it per request)
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single backend request. Local validation failures never
/// become `ApiError`s; they are surfaced as view notices before any request
/// is issued.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, TLS, ...).
    #[error("{0}")]
    Network(String),
    /// Non-2xx response. `message` prefers the body's `error`/`message`
    /// field so backend rejections surface verbatim.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// 2xx response whose body did not parse as the expected type.
    #[error("Respuesta inválida del servidor: {0}")]
    Decode(String),
}

impl ApiError {
    /// Authentication failure (HTTP 401/403): treated as session expiry by
    /// every reconciler except the login call itself.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ApiError::Status {
                status: 401 | 403,
                ..
            }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convert a `reqwest::Error` into a user-presentable message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("No se puede conectar con el servidor en {url}");
    }
    if err.is_timeout() {
        return format!("La conexión con {url} expiró");
    }
    if err.is_builder() {
        return format!("URL del servidor inválida: {url}");
    }
    format!("Error de red comunicando con {url}: {err}")
}

/// Fallback message for a status code when the body carries no error field.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Sesión expirada o token inválido".to_string(),
        403 => "Acceso denegado".to_string(),
        404 => "Recurso no encontrado".to_string(),
        s if s >= 500 => format!("Error del servidor (HTTP {s})"),
        s => format!("Respuesta inesperada del servidor (HTTP {s})"),
    }
}

/// Pull the backend's own message out of an error body, preferring the
/// `error` field, then `message`, then the status fallback.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = json
            .get("error")
            .or_else(|| json.get("message"))
            .and_then(Value::as_str)
        {
            let msg = msg.trim();
            if !msg.is_empty() {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('{') && !trimmed.starts_with('<') {
        return trimmed.to_string();
    }
    status_error(status)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated client for the backend's `/api` tree. Cheap to clone; the
/// underlying `reqwest::Client` pools connections.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionStore) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
            session,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, &[], None::<&()>).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, query, None::<&()>).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// POST with an empty JSON object body (compound backend actions).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::POST, path, &[], Some(&Value::Object(Default::default())))
            .await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    /// PUT with an empty JSON object body (status-transition endpoints).
    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::PUT, path, &[], Some(&Value::Object(Default::default())))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let _: Value = self.request(Method::DELETE, path, &[], None::<&()>).await?;
        Ok(())
    }

    async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "backend request");

        let mut req = self.http.request(method, &url);
        if !query.is_empty() {
            req = req.query(query);
        }
        // The login call has no token yet; everything else carries one.
        if let Some(token) = self.session.get_token() {
            let token = token.trim().to_string();
            if !token.is_empty() {
                req = req.bearer_auth(token);
            }
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Network(friendly_error(&self.base_url, &e)))?;
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: extract_error_message(status, &body_text),
            });
        }

        // 204-style empty bodies decode as JSON null.
        if body_text.trim().is_empty() {
            return serde_json::from_value(Value::Null)
                .map_err(|e| ApiError::Decode(e.to_string()));
        }
        serde_json::from_str(&body_text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SesionUsuario;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_with_token(token: &str) -> SessionStore {
        let session = SessionStore::ephemeral();
        session.set_usuario(SesionUsuario {
            token: token.into(),
            ..Default::default()
        });
        session
    }

    #[test]
    fn normaliza_base_url() {
        assert_eq!(
            normalize_base_url("localhost:8080"),
            "http://localhost:8080"
        );
        assert_eq!(
            normalize_base_url("http://localhost:8080/api/"),
            "http://localhost:8080"
        );
        assert_eq!(
            normalize_base_url("restaurante.example.com/"),
            "https://restaurante.example.com"
        );
    }

    #[tokio::test]
    async fn adjunta_bearer_cuando_hay_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/mesas"))
            .and(header("Authorization", "Bearer jwt-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), session_with_token("jwt-123")).unwrap();
        let mesas: Vec<crate::models::Mesa> = api.get("/mesas").await.unwrap();
        assert!(mesas.is_empty());
    }

    #[tokio::test]
    async fn sin_token_no_envia_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "t", "nombre": "Ana", "rol": "Administrador"
            })))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), SessionStore::ephemeral()).unwrap();
        let resp: Value = api
            .post("/auth/login", &serde_json::json!({"email": "a", "password": "b"}))
            .await
            .unwrap();
        assert_eq!(resp["nombre"], "Ana");

        let received = &server.received_requests().await.unwrap()[0];
        assert!(!received.headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn error_del_backend_sale_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/mesas/3/ocupar"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "La mesa ya está ocupada"
            })))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), session_with_token("t")).unwrap();
        let err = api.put_empty::<Value>("/mesas/3/ocupar").await.unwrap_err();
        assert_eq!(err.to_string(), "La mesa ya está ocupada");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_auth());
    }

    #[tokio::test]
    async fn cuerpo_sin_mensaje_usa_fallback_por_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/comandas"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), session_with_token("viejo")).unwrap();
        let err = api.get::<Value>("/comandas").await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "Sesión expirada o token inválido");
    }

    #[tokio::test]
    async fn json_invalido_es_error_de_decodificacion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/estados"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), session_with_token("t")).unwrap();
        let err = api
            .get::<Vec<crate::models::Estado>>("/estados")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
