//! Dashboard statistics reconciler.

use std::sync::Arc;
use tracing::warn;

use crate::api::ApiClient;
use crate::clients::DashboardClient;
use crate::models::DashboardEstadisticas;
use crate::reload::SeqGuard;

pub struct PanelView {
    dashboard_api: DashboardClient,
    reloads: SeqGuard,

    pub estadisticas: Option<DashboardEstadisticas>,
    pub cargando: bool,
    pub error: Option<String>,
}

impl PanelView {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            dashboard_api: DashboardClient::new(api),
            reloads: SeqGuard::new(),
            estadisticas: None,
            cargando: false,
            error: None,
        }
    }

    /// Single fetch of the aggregate; nullable money fields and absent
    /// collections are normalised on receipt so the presentation layer never
    /// sees a hole.
    pub async fn load(&mut self) {
        self.cargando = true;
        self.error = None;

        let ticket = self.reloads.issue();
        let resultado = self.dashboard_api.estadisticas().await;
        if !self.reloads.is_current(ticket) {
            return;
        }

        match resultado {
            Ok(datos) => self.estadisticas = Some(datos.normalizada()),
            Err(err) => {
                warn!(error = %err, "failed to load dashboard statistics");
                self.error = Some(match err.status() {
                    Some(403) => {
                        "Error de autenticación. Por favor, inicia sesión nuevamente.".to_string()
                    }
                    Some(401) => {
                        "Sesión expirada. Por favor, inicia sesión nuevamente.".to_string()
                    }
                    _ => format!("Error al cargar las estadísticas: {err}"),
                });
            }
        }

        self.cargando = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SesionUsuario, SessionStore};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn view(uri: &str) -> PanelView {
        let session = SessionStore::ephemeral();
        session.set_usuario(SesionUsuario {
            token: "jwt".into(),
            ..Default::default()
        });
        PanelView::new(Arc::new(ApiClient::new(uri, session).unwrap()))
    }

    #[tokio::test]
    async fn normaliza_campos_nulos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard/estadisticas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalMesas": 8,
                "mesasOcupadas": 3,
                "meserosActivos": 2,
                "ordenesEnPreparacion": 1,
                "ventasHoy": null,
                "ventasSemana": null,
                "totalProductos": 12
            })))
            .mount(&server)
            .await;

        let mut panel = view(&server.uri());
        panel.load().await;

        let stats = panel.estadisticas.unwrap();
        assert_eq!(stats.total_mesas, 8);
        assert_eq!(stats.ventas_hoy, Some(0.0));
        assert_eq!(stats.ventas_semana, Some(0.0));
        assert!(stats.comandas_recientes.is_empty());
        assert!(panel.error.is_none());
    }

    #[tokio::test]
    async fn distingue_401_de_403() {
        for (status, esperado) in [
            (403, "Error de autenticación. Por favor, inicia sesión nuevamente."),
            (401, "Sesión expirada. Por favor, inicia sesión nuevamente."),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/api/dashboard/estadisticas"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let mut panel = view(&server.uri());
            panel.load().await;
            assert_eq!(panel.error.as_deref(), Some(esperado));
        }
    }

    #[tokio::test]
    async fn otros_errores_incluyen_el_detalle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard/estadisticas"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "Base de datos no disponible"
            })))
            .mount(&server)
            .await;

        let mut panel = view(&server.uri());
        panel.load().await;
        assert_eq!(
            panel.error.as_deref(),
            Some("Error al cargar las estadísticas: Base de datos no disponible")
        );
    }
}
