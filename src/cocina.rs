//! Kitchen panel reconciler.
//!
//! Partitions the full order list into the four lifecycle buckets
//! (Pending → InPreparation → {Completed | Cancelled}), newest first, and
//! drives the status transitions. Bucketing matches the status name by
//! case-insensitive substring — the backend has drifted between gendered
//! spellings ("Completada"/"Completado") and the accented "Preparación" —
//! rather than a closed enumeration.

use std::sync::Arc;
use tracing::warn;

use crate::api::ApiClient;
use crate::clients::{ComandasClient, MesasClient, ProductosClient, UsuariosClient};
use crate::mesas::MSG_SESION_EXPIRADA;
use crate::models::{Comanda, Mesa, Producto, Usuario};
use crate::nueva_comanda::{NuevaComanda, SubmitOutcome};
use crate::reload::SeqGuard;
use crate::session::SessionStore;
use crate::ui::{Confirm, Notice};

/// Per-bucket counts over the full order list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EstadisticasComandas {
    pub total: usize,
    pub pendientes: usize,
    pub en_preparacion: usize,
    pub completadas: usize,
    pub canceladas: usize,
}

pub struct CocinaView {
    comandas_api: ComandasClient,
    usuarios_api: UsuariosClient,
    mesas_api: MesasClient,
    productos_api: ProductosClient,
    session: SessionStore,
    confirm: Arc<dyn Confirm>,
    reloads: SeqGuard,

    pub comandas: Vec<Comanda>,
    pub pendientes: Vec<Comanda>,
    pub en_preparacion: Vec<Comanda>,
    pub completadas: Vec<Comanda>,
    pub canceladas: Vec<Comanda>,
    pub estadisticas: EstadisticasComandas,

    /// Supporting reference lists for the selectors.
    pub cocineros: Vec<Usuario>,
    pub meseros: Vec<Usuario>,
    pub mesas: Vec<Mesa>,
    /// In-stock, active products only.
    pub productos: Vec<Producto>,

    pub cargando: bool,
    pub error: Option<String>,
    pub notice: Option<Notice>,

    pub comanda_seleccionada: Option<Comanda>,
    pub cocinero_seleccionado: String,
    pub is_detalles_modal_open: bool,
    pub is_asignar_modal_open: bool,
    pub is_nueva_modal_open: bool,
    pub nueva: NuevaComanda,
}

impl CocinaView {
    pub fn new(api: Arc<ApiClient>, confirm: Arc<dyn Confirm>) -> Self {
        let session = api.session().clone();
        Self {
            comandas_api: ComandasClient::new(Arc::clone(&api)),
            usuarios_api: UsuariosClient::new(Arc::clone(&api)),
            mesas_api: MesasClient::new(Arc::clone(&api)),
            productos_api: ProductosClient::new(api),
            session,
            confirm,
            reloads: SeqGuard::new(),
            comandas: Vec::new(),
            pendientes: Vec::new(),
            en_preparacion: Vec::new(),
            completadas: Vec::new(),
            canceladas: Vec::new(),
            estadisticas: EstadisticasComandas::default(),
            cocineros: Vec::new(),
            meseros: Vec::new(),
            mesas: Vec::new(),
            productos: Vec::new(),
            cargando: false,
            error: None,
            notice: None,
            comanda_seleccionada: None,
            cocinero_seleccionado: String::new(),
            is_detalles_modal_open: false,
            is_asignar_modal_open: false,
            is_nueva_modal_open: false,
            nueva: NuevaComanda::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Fetch orders plus the supporting reference lists. All four requests
    /// run concurrently; each failure is handled on its own and none blocks
    /// the others from updating the view.
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
        let (comandas, usuarios, mesas, productos) = tokio::join!(
            self.comandas_api.list(),
            self.usuarios_api.list(),
            self.mesas_api.list(),
            self.productos_api.list()
        );
        if !self.reloads.is_current(ticket) {
            return;
        }

        match comandas {
            Ok(lista) => {
                self.comandas = lista;
                self.organize_buckets();
                self.compute_stats();
            }
            Err(err) if err.is_auth() => {
                warn!(error = %err, "order fetch rejected as unauthenticated");
                self.error = Some(MSG_SESION_EXPIRADA.to_string());
                self.session.schedule_forced_logout();
            }
            Err(err) => {
                warn!(error = %err, "failed to load orders");
                self.error = Some("Error al cargar las comandas".to_string());
            }
        }

        match usuarios {
            Ok(lista) => {
                self.cocineros = lista
                    .iter()
                    .filter(|u| u.tiene_rol("cocinero"))
                    .cloned()
                    .collect();
                self.meseros = lista
                    .into_iter()
                    .filter(|u| u.tiene_rol("mesero"))
                    .collect();
            }
            Err(err) => {
                warn!(error = %err, "failed to load users");
                self.cocineros.clear();
                self.meseros.clear();
            }
        }

        match mesas {
            Ok(lista) => self.mesas = lista,
            Err(err) => {
                warn!(error = %err, "failed to load tables");
                self.mesas.clear();
            }
        }

        match productos {
            Ok(lista) => {
                self.productos = lista
                    .into_iter()
                    .filter(|p| p.estado && p.stock > 0)
                    .collect();
            }
            Err(err) => {
                warn!(error = %err, "failed to load products");
                self.productos.clear();
            }
        }

        self.cargando = false;
    }

    // -----------------------------------------------------------------------
    // Bucketing
    // -----------------------------------------------------------------------

    fn organize_buckets(&mut self) {
        self.pendientes.clear();
        self.en_preparacion.clear();
        self.completadas.clear();
        self.canceladas.clear();

        for comanda in &self.comandas {
            let estado = comanda.estado_normalizado();
            if estado.contains("pendiente") {
                self.pendientes.push(comanda.clone());
            } else if estado.contains("preparacion") || estado.contains("preparación") {
                self.en_preparacion.push(comanda.clone());
            } else if estado.contains("completada") || estado.contains("completado") {
                self.completadas.push(comanda.clone());
            } else if estado.contains("cancelada") || estado.contains("cancelado") {
                self.canceladas.push(comanda.clone());
            }
            // Anything else stays out of every bucket.
        }

        for bucket in [
            &mut self.pendientes,
            &mut self.en_preparacion,
            &mut self.completadas,
            &mut self.canceladas,
        ] {
            bucket.sort_by(|a, b| b.fecha.cmp(&a.fecha));
        }
    }

    fn compute_stats(&mut self) {
        self.estadisticas = EstadisticasComandas {
            total: self.comandas.len(),
            pendientes: self.pendientes.len(),
            en_preparacion: self.en_preparacion.len(),
            completadas: self.completadas.len(),
            canceladas: self.canceladas.len(),
        };
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Pending → InPreparation. Needs a cook: without one selected, the user
    /// is redirected into the cook-selection modal instead of failing. The
    /// single request carries both the transition and the assignment.
    pub async fn take_order(&mut self, comanda: &Comanda) {
        if self.cocinero_seleccionado.trim().is_empty() {
            self.notice = Some(Notice::Warning(
                "Debes seleccionar un cocinero primero".to_string(),
            ));
            self.open_asignar_modal(comanda);
            return;
        }

        let id_cocinero = self.cocinero_seleccionado.clone();
        match self
            .comandas_api
            .mark_in_preparation(comanda.id_comanda, &id_cocinero)
            .await
        {
            Ok(_) => {
                self.notice = Some(Notice::Success("Comanda tomada en preparación".to_string()));
                self.is_asignar_modal_open = false;
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_comanda = comanda.id_comanda, error = %err, "failed to take order");
                self.notice = Some(Notice::Error(format!("Error al tomar la comanda: {err}")));
            }
        }
    }

    pub async fn complete_order(&mut self, comanda: &Comanda) {
        let pregunta = format!(
            "¿Marcar la comanda #{} como completada?",
            comanda.id_comanda
        );
        if !self.confirm.confirm(&pregunta) {
            return;
        }
        match self.comandas_api.mark_completed(comanda.id_comanda).await {
            Ok(_) => {
                self.notice = Some(Notice::Success(
                    "Comanda marcada como completada".to_string(),
                ));
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_comanda = comanda.id_comanda, error = %err, "failed to complete order");
                self.notice = Some(Notice::Error(format!(
                    "Error al completar la comanda: {err}"
                )));
            }
        }
    }

    pub async fn cancel_order(&mut self, comanda: &Comanda) {
        let pregunta = format!("¿Cancelar la comanda #{}?", comanda.id_comanda);
        if !self.confirm.confirm(&pregunta) {
            return;
        }
        match self.comandas_api.mark_cancelled(comanda.id_comanda).await {
            Ok(_) => {
                self.notice = Some(Notice::Success("Comanda cancelada".to_string()));
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_comanda = comanda.id_comanda, error = %err, "failed to cancel order");
                self.notice = Some(Notice::Error(format!(
                    "Error al cancelar la comanda: {err}"
                )));
            }
        }
    }

    /// Reassign the cook without touching the order status.
    pub async fn assign_cook(&mut self) {
        let Some(comanda) = self.comanda_seleccionada.clone() else {
            self.notice = Some(Notice::Warning("Debes seleccionar un cocinero".to_string()));
            return;
        };
        if self.cocinero_seleccionado.trim().is_empty() {
            self.notice = Some(Notice::Warning("Debes seleccionar un cocinero".to_string()));
            return;
        }

        let id_cocinero = self.cocinero_seleccionado.clone();
        match self
            .comandas_api
            .assign_cook(comanda.id_comanda, &id_cocinero)
            .await
        {
            Ok(_) => {
                self.notice = Some(Notice::Success(
                    "Cocinero asignado exitosamente".to_string(),
                ));
                self.is_asignar_modal_open = false;
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_comanda = comanda.id_comanda, error = %err, "failed to assign cook");
                self.notice = Some(Notice::Error(format!("Error al asignar cocinero: {err}")));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Modals
    // -----------------------------------------------------------------------

    pub fn open_detalles_modal(&mut self, comanda: &Comanda) {
        self.comanda_seleccionada = Some(comanda.clone());
        self.is_detalles_modal_open = true;
    }

    pub fn open_asignar_modal(&mut self, comanda: &Comanda) {
        self.comanda_seleccionada = Some(comanda.clone());
        self.cocinero_seleccionado = comanda
            .cocinero
            .as_ref()
            .map(|c| c.id_usuario.clone())
            .unwrap_or_default();
        self.is_asignar_modal_open = true;
    }

    pub fn open_nueva_modal(&mut self) {
        self.nueva.reset();
        self.is_nueva_modal_open = true;
    }

    pub fn close_modals(&mut self) {
        self.is_detalles_modal_open = false;
        self.is_asignar_modal_open = false;
        self.is_nueva_modal_open = false;
    }

    // -----------------------------------------------------------------------
    // Order creation
    // -----------------------------------------------------------------------

    /// Drive the two-phase creation sequencer and reflect its outcome into
    /// the view. Both full and partial success reload the list — a partial
    /// order exists server-side and must become visible.
    pub async fn submit_nueva_comanda(&mut self) {
        match self.nueva.submit(&self.comandas_api).await {
            SubmitOutcome::Invalid(mensaje) => {
                self.notice = Some(Notice::Warning(mensaje));
            }
            SubmitOutcome::Failed(mensaje) => {
                self.notice = Some(Notice::Error(format!(
                    "Error al crear la comanda: {mensaje}"
                )));
            }
            SubmitOutcome::Partial => {
                self.notice = Some(Notice::Warning(
                    "Comanda creada pero hubo errores al agregar algunos productos. Por favor, verifica."
                        .to_string(),
                ));
                self.load_all().await;
            }
            SubmitOutcome::Success => {
                self.notice = Some(Notice::Success(
                    "Comanda creada exitosamente con todos los productos".to_string(),
                ));
                self.is_nueva_modal_open = false;
                self.load_all().await;
            }
        }
    }
}
