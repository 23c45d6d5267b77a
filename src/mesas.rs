//! Table management reconciler.
//!
//! Owns the table screen's view state: the full table and status lists, the
//! filtered/sorted derived view with aggregate counts, the CRUD forms, and
//! the per-table billing workflow (historical orders, finalize-and-release,
//! payment marking). Lists are replaced wholesale on every reload; a mutation
//! never patches local state — it triggers a fresh fetch instead.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::clients::{ComandasClient, MesasClient};
use crate::models::{Estado, FacturacionMesa, Mesa, MesaPayload};
use crate::reload::SeqGuard;
use crate::session::SessionStore;
use crate::ui::{Confirm, Notice};

/// Statuses a table may hold; anything else the backend reports is tolerated
/// on read but never offered as a selectable option.
const ESTADOS_MESA_PERMITIDOS: &[&str] = &["disponible", "ocupado", "reservado"];

/// Pause between a successful billing fetch and flipping the modal-open flag,
/// so the presentation layer has mounted the modal body.
const MODAL_MOUNT_DELAY: Duration = Duration::from_millis(100);

pub const MSG_SESION_EXPIRADA: &str = "Sesión expirada. Por favor, inicia sesión nuevamente.";

/// Aggregate counts over the unfiltered table list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EstadisticasMesas {
    pub total: usize,
    pub disponibles: usize,
    pub ocupadas: usize,
    pub reservadas: usize,
}

/// Create/edit form state.
#[derive(Debug, Clone)]
pub struct MesaForm {
    pub capacidad: i64,
    pub ubicacion: String,
    pub estado: Option<Estado>,
}

impl Default for MesaForm {
    fn default() -> Self {
        Self {
            capacidad: 1,
            ubicacion: String::new(),
            estado: None,
        }
    }
}

pub struct MesasView {
    mesas_api: MesasClient,
    comandas_api: ComandasClient,
    session: SessionStore,
    confirm: Arc<dyn Confirm>,
    reloads: SeqGuard,

    pub mesas: Vec<Mesa>,
    pub estados: Vec<Estado>,
    /// Status list narrowed to the permitted table subset.
    pub estados_mesas: Vec<Estado>,
    pub mesas_filtradas: Vec<Mesa>,
    pub cargando: bool,
    pub error: Option<String>,
    pub notice: Option<Notice>,

    // Filters
    pub filtro_estado: Option<i64>,
    pub termino_busqueda: String,
    pub capacidad_minima: Option<i64>,
    pub estadisticas: EstadisticasMesas,

    // Forms and modal flags
    pub nueva_mesa: MesaForm,
    pub mesa_seleccionada: Option<Mesa>,
    pub mesa_eliminar: Option<Mesa>,
    pub is_nueva_modal_open: bool,
    pub is_editar_modal_open: bool,
    pub is_eliminar_modal_open: bool,

    // Billing
    pub facturacion: Option<FacturacionMesa>,
    pub cargando_facturacion: bool,
    pub is_comandas_modal_open: bool,
}

impl MesasView {
    pub fn new(api: Arc<ApiClient>, confirm: Arc<dyn Confirm>) -> Self {
        let session = api.session().clone();
        Self {
            mesas_api: MesasClient::new(Arc::clone(&api)),
            comandas_api: ComandasClient::new(api),
            session,
            confirm,
            reloads: SeqGuard::new(),
            mesas: Vec::new(),
            estados: Vec::new(),
            estados_mesas: Vec::new(),
            mesas_filtradas: Vec::new(),
            cargando: false,
            error: None,
            notice: None,
            filtro_estado: None,
            termino_busqueda: String::new(),
            capacidad_minima: None,
            estadisticas: EstadisticasMesas::default(),
            nueva_mesa: MesaForm::default(),
            mesa_seleccionada: None,
            mesa_eliminar: None,
            is_nueva_modal_open: false,
            is_editar_modal_open: false,
            is_eliminar_modal_open: false,
            facturacion: None,
            cargando_facturacion: false,
            is_comandas_modal_open: false,
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Fetch tables and statuses. The two requests run concurrently and fail
    /// independently: a status failure only empties the selectable subset,
    /// it never blocks the table data path.
    pub async fn load_all(&mut self) {
        self.cargando = true;
        self.error = None;

        if !self.session.has_token() {
            self.error = Some(MSG_SESION_EXPIRADA.to_string());
            self.cargando = false;
            self.session.schedule_forced_logout();
            return;
        }

        let ticket = self.reloads.issue();
        let (mesas, estados) = tokio::join!(self.mesas_api.list(), self.mesas_api.states());
        if !self.reloads.is_current(ticket) {
            return;
        }

        match mesas {
            Ok(lista) => {
                self.mesas = lista;
                self.apply_filters();
                self.compute_stats();
            }
            Err(err) if err.is_auth() => {
                warn!(error = %err, "table fetch rejected as unauthenticated");
                self.error = Some(MSG_SESION_EXPIRADA.to_string());
                self.session.schedule_forced_logout();
            }
            Err(err) => {
                warn!(error = %err, "failed to load tables");
                self.error = Some("Error al cargar las mesas".to_string());
            }
        }

        match estados {
            Ok(lista) => {
                self.estados_mesas = lista
                    .iter()
                    .filter(|e| {
                        ESTADOS_MESA_PERMITIDOS.contains(&e.nombre_normalizado().as_str())
                    })
                    .cloned()
                    .collect();
                self.estados = lista;
            }
            Err(err) => {
                // Degrade to an empty selectable set; table data stays usable.
                warn!(error = %err, "failed to load statuses");
                self.estados_mesas.clear();
            }
        }

        self.cargando = false;
    }

    // -----------------------------------------------------------------------
    // Filters and statistics
    // -----------------------------------------------------------------------

    /// Pure recomputation of the derived view over the in-memory list.
    pub fn apply_filters(&mut self) {
        let mut resultado = self.mesas.clone();

        if let Some(id) = self.filtro_estado {
            resultado.retain(|m| {
                m.estado.as_ref().and_then(|e| e.id_estado) == Some(id)
            });
        }

        let busqueda = self.termino_busqueda.trim().to_lowercase();
        if !busqueda.is_empty() {
            resultado.retain(|m| {
                m.ubicacion.to_lowercase().contains(&busqueda)
                    || m.id_mesa.to_string().contains(&busqueda)
            });
        }

        if let Some(minima) = self.capacidad_minima {
            if minima > 0 {
                resultado.retain(|m| m.capacidad >= minima);
            }
        }

        self.mesas_filtradas = resultado;
    }

    pub fn clear_filters(&mut self) {
        self.filtro_estado = None;
        self.termino_busqueda.clear();
        self.capacidad_minima = None;
        self.apply_filters();
    }

    fn compute_stats(&mut self) {
        self.estadisticas = EstadisticasMesas {
            total: self.mesas.len(),
            disponibles: self.mesas.iter().filter(|m| m.tiene_estado("disponible")).count(),
            ocupadas: self.mesas.iter().filter(|m| m.tiene_estado("ocupado")).count(),
            reservadas: self.mesas.iter().filter(|m| m.tiene_estado("reservado")).count(),
        };
    }

    // -----------------------------------------------------------------------
    // Quick status actions
    // -----------------------------------------------------------------------

    pub async fn occupy(&mut self, mesa: &Mesa) {
        let pregunta = format!(
            "¿Deseas ocupar la mesa {} ({})?",
            mesa.id_mesa, mesa.ubicacion
        );
        if !self.confirm.confirm(&pregunta) {
            return;
        }
        match self.mesas_api.occupy(mesa.id_mesa).await {
            Ok(_) => {
                self.notice = Some(Notice::Success("Mesa ocupada exitosamente".to_string()));
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_mesa = mesa.id_mesa, error = %err, "failed to occupy table");
                self.notice = Some(Notice::Error(format!("Error al ocupar la mesa: {err}")));
            }
        }
    }

    pub async fn free(&mut self, mesa: &Mesa) {
        let pregunta = format!(
            "¿Deseas liberar la mesa {} ({})?",
            mesa.id_mesa, mesa.ubicacion
        );
        if !self.confirm.confirm(&pregunta) {
            return;
        }
        match self.mesas_api.free(mesa.id_mesa).await {
            Ok(_) => {
                self.notice = Some(Notice::Success("Mesa liberada exitosamente".to_string()));
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_mesa = mesa.id_mesa, error = %err, "failed to free table");
                self.notice = Some(Notice::Error(format!("Error al liberar la mesa: {err}")));
            }
        }
    }

    pub async fn reserve(&mut self, mesa: &Mesa) {
        let pregunta = format!(
            "¿Deseas reservar la mesa {} ({})?",
            mesa.id_mesa, mesa.ubicacion
        );
        if !self.confirm.confirm(&pregunta) {
            return;
        }
        match self.mesas_api.reserve(mesa.id_mesa).await {
            Ok(_) => {
                self.notice = Some(Notice::Success("Mesa reservada exitosamente".to_string()));
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_mesa = mesa.id_mesa, error = %err, "failed to reserve table");
                self.notice = Some(Notice::Error(format!("Error al reservar la mesa: {err}")));
            }
        }
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    pub fn open_nueva_modal(&mut self) {
        self.nueva_mesa = MesaForm::default();
        self.is_nueva_modal_open = true;
    }

    pub fn open_editar_modal(&mut self, mesa: &Mesa) {
        self.mesa_seleccionada = Some(mesa.clone());
        self.is_editar_modal_open = true;
    }

    pub fn open_eliminar_modal(&mut self, mesa: &Mesa) {
        self.mesa_eliminar = Some(mesa.clone());
        self.is_eliminar_modal_open = true;
    }

    /// Select a status in the create form by id; unknown ids clear the
    /// selection instead of guessing.
    pub fn set_nueva_mesa_estado(&mut self, id_estado: Option<i64>) {
        self.nueva_mesa.estado = id_estado
            .filter(|id| *id != 0)
            .and_then(|id| {
                self.estados_mesas
                    .iter()
                    .find(|e| e.id_estado == Some(id))
                    .cloned()
            });
    }

    pub fn set_mesa_seleccionada_estado(&mut self, id_estado: i64) {
        if let Some(mesa) = self.mesa_seleccionada.as_mut() {
            if let Some(estado) = self
                .estados_mesas
                .iter()
                .find(|e| e.id_estado == Some(id_estado))
            {
                mesa.estado = Some(estado.clone());
            }
        }
    }

    fn validate_form(&mut self, ubicacion: &str, capacidad: i64, estado: Option<&Estado>) -> bool {
        if ubicacion.trim().is_empty() {
            self.notice = Some(Notice::Warning("La ubicación es obligatoria".to_string()));
            return false;
        }
        if capacidad < 1 {
            self.notice = Some(Notice::Warning(
                "La capacidad debe ser al menos 1".to_string(),
            ));
            return false;
        }
        if estado.and_then(|e| e.id_estado).unwrap_or(0) == 0 {
            self.notice = Some(Notice::Warning("Debes seleccionar un estado".to_string()));
            return false;
        }
        true
    }

    /// Resolve the form's status against the permitted subset; a status that
    /// is not selectable for tables fails validation.
    fn estado_permitido(&self, estado: Option<&Estado>) -> Option<Estado> {
        let id = estado.and_then(|e| e.id_estado)?;
        self.estados_mesas
            .iter()
            .find(|e| e.id_estado == Some(id))
            .cloned()
    }

    pub async fn create(&mut self) {
        let form = self.nueva_mesa.clone();
        if !self.validate_form(&form.ubicacion, form.capacidad, form.estado.as_ref()) {
            return;
        }
        let Some(estado) = self.estado_permitido(form.estado.as_ref()) else {
            self.notice = Some(Notice::Warning(
                "Debes seleccionar un estado válido para mesas (Disponible, Ocupado o Reservado)"
                    .to_string(),
            ));
            return;
        };

        let payload = MesaPayload {
            capacidad: form.capacidad,
            ubicacion: form.ubicacion.trim().to_string(),
            estado,
        };
        match self.mesas_api.create(&payload).await {
            Ok(creada) => {
                info!(id_mesa = creada.id_mesa, "table created");
                self.notice = Some(Notice::Success("Mesa creada exitosamente".to_string()));
                self.is_nueva_modal_open = false;
                self.nueva_mesa = MesaForm::default();
                self.load_all().await;
            }
            Err(err) => {
                // Modal stays open for correction.
                warn!(error = %err, "failed to create table");
                self.notice = Some(Notice::Error(format!("Error al crear la mesa: {err}")));
            }
        }
    }

    pub async fn update_selected(&mut self) {
        let Some(mesa) = self.mesa_seleccionada.clone() else {
            self.notice = Some(Notice::Warning("No hay mesa seleccionada".to_string()));
            return;
        };
        if !self.validate_form(&mesa.ubicacion, mesa.capacidad, mesa.estado.as_ref()) {
            return;
        }
        let Some(estado) = self.estado_permitido(mesa.estado.as_ref()) else {
            self.notice = Some(Notice::Warning(
                "Debes seleccionar un estado válido para mesas (Disponible, Ocupado o Reservado)"
                    .to_string(),
            ));
            return;
        };

        let payload = MesaPayload {
            capacidad: mesa.capacidad,
            ubicacion: mesa.ubicacion.trim().to_string(),
            estado,
        };
        match self.mesas_api.update(mesa.id_mesa, &payload).await {
            Ok(_) => {
                self.notice = Some(Notice::Success("Mesa actualizada exitosamente".to_string()));
                self.is_editar_modal_open = false;
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_mesa = mesa.id_mesa, error = %err, "failed to update table");
                self.notice = Some(Notice::Error(format!("Error al actualizar la mesa: {err}")));
            }
        }
    }

    pub async fn delete_selected(&mut self) {
        let Some(mesa) = self.mesa_eliminar.clone() else {
            return;
        };
        match self.mesas_api.delete(mesa.id_mesa).await {
            Ok(()) => {
                self.notice = Some(Notice::Success("Mesa eliminada exitosamente".to_string()));
                self.is_eliminar_modal_open = false;
                self.mesa_eliminar = None;
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_mesa = mesa.id_mesa, error = %err, "failed to delete table");
                self.notice = Some(Notice::Error(format!("Error al eliminar la mesa: {err}")));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Billing workflow
    // -----------------------------------------------------------------------

    /// Fetch the per-table billing aggregate and open the orders modal. An
    /// available table should have no active orders, so viewing its history
    /// asks for confirmation first — a sanity nudge, not a hard block.
    pub async fn view_orders(&mut self, mesa: &Mesa) {
        self.mesa_seleccionada = Some(mesa.clone());

        if mesa.tiene_estado("disponible") {
            let pregunta = format!(
                "La mesa {} ({}) está actualmente DISPONIBLE. ¿Deseas ver el historial de comandas de esta mesa?",
                mesa.id_mesa, mesa.ubicacion
            );
            if !self.confirm.confirm(&pregunta) {
                return;
            }
        }

        self.cargando_facturacion = true;
        self.facturacion = None;

        match self.comandas_api.billing(mesa.id_mesa).await {
            Ok(facturacion) => {
                self.facturacion = Some(facturacion);
                self.cargando_facturacion = false;
                sleep(MODAL_MOUNT_DELAY).await;
                self.is_comandas_modal_open = true;
            }
            Err(err) => {
                warn!(id_mesa = mesa.id_mesa, error = %err, "failed to load billing summary");
                self.notice = Some(Notice::Error(
                    "Error al cargar las comandas de la mesa".to_string(),
                ));
                self.cargando_facturacion = false;
            }
        }
    }

    /// Mark every pending order of the selected table completed and free the
    /// table in one compound request; the server applies both effects or
    /// neither. Checked against the session again here — this is a
    /// higher-consequence action than a page load.
    pub async fn finalize_and_release(&mut self) {
        let (Some(mesa), Some(facturacion)) =
            (self.mesa_seleccionada.clone(), self.facturacion.clone())
        else {
            return;
        };

        if !self.session.has_token() {
            self.notice = Some(Notice::Warning(
                "No hay sesión activa. Por favor, inicia sesión nuevamente.".to_string(),
            ));
            return;
        }

        let pregunta = format!(
            "¿Deseas finalizar todas las comandas pendientes de la mesa {} y liberarla? \
             Esto marcará {} comanda(s) como completada(s) y cambiará el estado de la mesa a \"Disponible\".",
            mesa.id_mesa, facturacion.comandas_pendientes
        );
        if !self.confirm.confirm(&pregunta) {
            return;
        }

        match self.comandas_api.finalize_and_release(mesa.id_mesa).await {
            Ok(resultado) => {
                info!(
                    id_mesa = mesa.id_mesa,
                    finalizadas = resultado.comandas_finalizadas,
                    liberada = resultado.mesa_liberada,
                    "table finalized and released"
                );
                self.notice = Some(Notice::Success(format!(
                    "{} Comandas finalizadas: {}. Mesa liberada: {}",
                    resultado.message,
                    resultado.comandas_finalizadas,
                    if resultado.mesa_liberada { "Sí" } else { "No" }
                )));
                self.is_comandas_modal_open = false;
                // Cleared so a re-open recomputes a fresh summary.
                self.facturacion = None;
                self.load_all().await;
            }
            Err(err) if err.is_auth() => {
                warn!(id_mesa = mesa.id_mesa, "finalize rejected as unauthenticated");
                self.notice = Some(Notice::Warning(
                    "Tu sesión ha expirado. Por favor, inicia sesión nuevamente.".to_string(),
                ));
            }
            Err(err) => {
                warn!(id_mesa = mesa.id_mesa, error = %err, "failed to finalize table");
                self.notice = Some(Notice::Error(format!(
                    "Error al finalizar las comandas y liberar la mesa: {err}"
                )));
            }
        }
    }

    pub async fn mark_order_paid(&mut self, id_comanda: i64) {
        let pregunta = format!("¿Deseas marcar la comanda #{id_comanda} como pagada?");
        if !self.confirm.confirm(&pregunta) {
            return;
        }
        match self.comandas_api.mark_paid(id_comanda).await {
            Ok(_) => {
                info!(id_comanda, "order marked paid");
                if let Some(mesa) = self.mesa_seleccionada.clone() {
                    self.view_orders(&mesa).await;
                }
            }
            Err(err) => {
                warn!(id_comanda, error = %err, "failed to mark order paid");
                self.notice = Some(Notice::Error(format!(
                    "Error al marcar la comanda como pagada: {err}"
                )));
            }
        }
    }

    /// Mark every completed-and-unpaid order of the selected table paid. The
    /// eligible count is computed client-side first; zero eligible orders
    /// means no request at all.
    pub async fn mark_all_paid(&mut self) {
        let (Some(mesa), Some(facturacion)) =
            (self.mesa_seleccionada.clone(), self.facturacion.clone())
        else {
            return;
        };

        let elegibles = facturacion
            .comandas
            .iter()
            .filter(|c| c.pendiente_de_pago())
            .count();
        if elegibles == 0 {
            self.notice = Some(Notice::Warning(
                "No hay comandas pendientes de pago".to_string(),
            ));
            return;
        }

        let pregunta = format!(
            "¿Deseas marcar todas las comandas completadas como pagadas? \
             Se marcarán {elegibles} comanda(s) como pagada(s)."
        );
        if !self.confirm.confirm(&pregunta) {
            return;
        }

        match self.comandas_api.mark_all_paid(mesa.id_mesa).await {
            Ok(resultado) => {
                self.notice = Some(Notice::Success(format!(
                    "{} Comandas marcadas como pagadas: {}",
                    resultado.message, resultado.comandas_pagadas
                )));
                self.view_orders(&mesa).await;
            }
            Err(err) => {
                warn!(id_mesa = mesa.id_mesa, error = %err, "failed to mark all orders paid");
                self.notice = Some(Notice::Error(format!(
                    "Error al marcar las comandas como pagadas: {err}"
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SesionUsuario;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mesa(id: i64, ubicacion: &str, capacidad: i64, estado: (i64, &str)) -> Mesa {
        Mesa {
            id_mesa: id,
            capacidad,
            ubicacion: ubicacion.to_string(),
            estado: Some(Estado {
                id_estado: Some(estado.0),
                nombre: Some(estado.1.to_string()),
                descripcion: None,
            }),
        }
    }

    fn view_with(uri: &str, logged_in: bool, accept: bool) -> MesasView {
        let session = SessionStore::ephemeral();
        if logged_in {
            session.set_usuario(SesionUsuario {
                token: "jwt".into(),
                ..Default::default()
            });
        }
        let api = Arc::new(ApiClient::new(uri, session).unwrap());
        MesasView::new(api, Arc::new(move |_: &str| accept))
    }

    fn offline_view() -> MesasView {
        view_with("localhost:8080", true, true)
    }

    #[test]
    fn filtro_por_estado_solo_deja_coincidencias() {
        let mut view = offline_view();
        view.mesas = vec![
            mesa(1, "Terraza", 4, (1, "Disponible")),
            mesa(2, "Interior", 2, (2, "Ocupado")),
        ];
        view.filtro_estado = Some(2);
        view.apply_filters();
        assert_eq!(view.mesas_filtradas.len(), 1);
        assert_eq!(view.mesas_filtradas[0].id_mesa, 2);

        view.clear_filters();
        assert_eq!(view.mesas_filtradas.len(), 2);
    }

    #[test]
    fn busqueda_cubre_ubicacion_e_identificador() {
        let mut view = offline_view();
        view.mesas = vec![
            mesa(1, "Terraza Norte", 4, (1, "Disponible")),
            mesa(21, "Interior", 2, (2, "Ocupado")),
        ];

        view.termino_busqueda = "TERRAZA".into();
        view.apply_filters();
        assert_eq!(view.mesas_filtradas.len(), 1);
        assert_eq!(view.mesas_filtradas[0].id_mesa, 1);

        view.termino_busqueda = "21".into();
        view.apply_filters();
        assert_eq!(view.mesas_filtradas.len(), 1);
        assert_eq!(view.mesas_filtradas[0].id_mesa, 21);
    }

    #[test]
    fn capacidad_minima_es_inclusiva() {
        let mut view = offline_view();
        view.mesas = vec![
            mesa(1, "A", 4, (1, "Disponible")),
            mesa(2, "B", 6, (1, "Disponible")),
            mesa(3, "C", 2, (1, "Disponible")),
        ];
        view.capacidad_minima = Some(4);
        view.apply_filters();
        let ids: Vec<i64> = view.mesas_filtradas.iter().map(|m| m.id_mesa).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn estadisticas_cuentan_por_nombre_exacto() {
        let mut view = offline_view();
        view.mesas = vec![
            mesa(1, "A", 4, (1, "Disponible")),
            mesa(2, "B", 4, (2, "Ocupado")),
            mesa(3, "C", 4, (2, "OCUPADO")),
            mesa(4, "D", 4, (3, "Reservado")),
        ];
        view.compute_stats();
        assert_eq!(
            view.estadisticas,
            EstadisticasMesas {
                total: 4,
                disponibles: 1,
                ocupadas: 2,
                reservadas: 1,
            }
        );
    }

    #[test]
    fn validacion_local_bloquea_sin_red() {
        let mut view = offline_view();
        view.nueva_mesa.ubicacion = "  ".into();
        assert!(!view.validate_form("  ", 1, None));
        assert!(matches!(view.notice, Some(Notice::Warning(_))));

        assert!(!view.validate_form("Terraza", 0, None));
        let estado = Estado {
            id_estado: Some(1),
            nombre: Some("Disponible".into()),
            descripcion: None,
        };
        assert!(view.validate_form("Terraza", 2, Some(&estado)));
    }

    #[tokio::test]
    async fn load_all_separa_fallos_de_estados_y_mesas() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/mesas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"idMesa": 1, "capacidad": 4, "ubicacion": "Terraza",
                 "estado": {"idEstado": 1, "nombre": "Disponible"}}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/estados"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true, true);
        view.load_all().await;

        assert!(view.error.is_none(), "status failure must not taint tables");
        assert_eq!(view.mesas.len(), 1);
        assert_eq!(view.estadisticas.disponibles, 1);
        assert!(view.estados_mesas.is_empty());
    }

    #[tokio::test]
    async fn load_all_filtra_estados_permitidos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/mesas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/estados"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"idEstado": 1, "nombre": "Disponible"},
                {"idEstado": 2, "nombre": "Ocupado"},
                {"idEstado": 3, "nombre": "Reservado"},
                {"idEstado": 4, "nombre": "Pendiente"},
                {"idEstado": 5, "nombre": null}
            ])))
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true, true);
        view.load_all().await;

        assert_eq!(view.estados.len(), 5);
        let nombres: Vec<_> = view
            .estados_mesas
            .iter()
            .map(|e| e.nombre.clone().unwrap())
            .collect();
        assert_eq!(nombres, vec!["Disponible", "Ocupado", "Reservado"]);
    }

    #[tokio::test]
    async fn rechazo_401_marca_sesion_expirada() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/mesas"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/estados"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true, true);
        view.load_all().await;
        assert_eq!(view.error.as_deref(), Some(MSG_SESION_EXPIRADA));
    }

    #[tokio::test]
    async fn sin_token_no_llama_al_backend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/mesas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), false, true);
        view.load_all().await;
        assert_eq!(view.error.as_deref(), Some(MSG_SESION_EXPIRADA));
        assert!(!view.cargando);
    }

    #[tokio::test]
    async fn ocupar_sin_confirmacion_no_llama() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/mesas/1/ocupar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "idMesa": 1, "capacidad": 4, "ubicacion": "Terraza",
                "estado": {"idEstado": 2, "nombre": "Ocupado"}
            })))
            .expect(0)
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true, false);
        let objetivo = mesa(1, "Terraza", 4, (1, "Disponible"));
        view.occupy(&objetivo).await;
        assert!(view.notice.is_none());
    }

    #[tokio::test]
    async fn ocupar_con_error_muestra_mensaje_del_backend() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/mesas/1/ocupar"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "error": "La mesa ya está ocupada"
            })))
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true, true);
        let objetivo = mesa(1, "Terraza", 4, (1, "Disponible"));
        view.occupy(&objetivo).await;
        assert_eq!(
            view.notice,
            Some(Notice::Error(
                "Error al ocupar la mesa: La mesa ya está ocupada".to_string()
            ))
        );
    }

    fn facturacion_con(comandas: Vec<serde_json::Value>) -> serde_json::Value {
        serde_json::json!({
            "idMesa": 1, "ubicacionMesa": "Terraza",
            "totalComandas": comandas.len(), "comandasCompletadas": 0,
            "comandasPendientes": 1, "comandasPagadas": 0,
            "todasCompletadas": false, "todasPagadas": false,
            "totalAPagar": 25.0, "comandas": comandas
        })
    }

    #[tokio::test]
    async fn marcar_todas_pagadas_sin_elegibles_no_llama() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/comandas/mesa/1/pagar-todas"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true, true);
        view.mesa_seleccionada = Some(mesa(1, "Terraza", 4, (2, "Ocupado")));
        view.facturacion = Some(
            serde_json::from_value(facturacion_con(vec![serde_json::json!({
                "idComanda": 9, "fecha": "2025-06-01T12:00:00", "estado": "Pendiente",
                "mesero": "Luis", "cocinero": "N/A", "total": 25.0,
                "cantidadProductos": 2, "pagada": false
            })]))
            .unwrap(),
        );

        view.mark_all_paid().await;
        assert_eq!(
            view.notice,
            Some(Notice::Warning("No hay comandas pendientes de pago".to_string()))
        );
    }

    #[tokio::test]
    async fn finalizar_y_liberar_cierra_modal_y_recarga() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/comandas/mesa/1/finalizar-y-liberar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Mesa finalizada.",
                "comandasFinalizadas": 2,
                "mesaLiberada": true
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/mesas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/estados"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true, true);
        view.mesa_seleccionada = Some(mesa(1, "Terraza", 4, (2, "Ocupado")));
        view.facturacion = Some(serde_json::from_value(facturacion_con(vec![])).unwrap());
        view.is_comandas_modal_open = true;

        view.finalize_and_release().await;

        assert!(!view.is_comandas_modal_open);
        assert!(view.facturacion.is_none(), "summary must recompute on re-open");
        match &view.notice {
            Some(Notice::Success(msg)) => {
                assert!(msg.contains("Mesa finalizada."));
                assert!(msg.contains("Comandas finalizadas: 2"));
            }
            other => panic!("expected success notice, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ver_comandas_de_mesa_disponible_pide_confirmacion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/comandas/mesa/1/facturacion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(facturacion_con(vec![])))
            .expect(0)
            .mount(&server)
            .await;

        // Declined confirmation on an available table: no fetch at all.
        let mut view = view_with(&server.uri(), true, false);
        let disponible = mesa(1, "Terraza", 4, (1, "Disponible"));
        view.view_orders(&disponible).await;
        assert!(view.facturacion.is_none());
        assert!(!view.is_comandas_modal_open);
    }

    #[tokio::test]
    async fn ver_comandas_abre_modal_tras_cargar() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/comandas/mesa/2/facturacion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "idMesa": 2, "ubicacionMesa": "Interior",
                "totalComandas": 0, "comandasCompletadas": 0,
                "comandasPendientes": 0, "comandasPagadas": 0,
                "todasCompletadas": true, "todasPagadas": true,
                "totalAPagar": 0.0, "comandas": []
            })))
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true, true);
        let ocupada = mesa(2, "Interior", 2, (2, "Ocupado"));
        view.view_orders(&ocupada).await;
        assert!(view.facturacion.is_some());
        assert!(view.is_comandas_modal_open);
        assert!(!view.cargando_facturacion);
    }
}
