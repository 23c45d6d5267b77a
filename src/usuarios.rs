//! User administration reconciler.
//!
//! Users and roles load concurrently with independent failure handling; the
//! name search is server-side, with an empty term restoring the full load.
//! Create is the one mutation here that distinguishes auth failures: a
//! 401/403 surfaces a re-login message and schedules the forced logout.

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::clients::UsuariosClient;
use crate::models::{Rol, Usuario};
use crate::reload::SeqGuard;
use crate::session::SessionStore;
use crate::ui::{Confirm, Notice};

/// Create-form state; the role arrives as a bare id from the selector.
#[derive(Debug, Clone, Default)]
pub struct UsuarioForm {
    pub nombre: String,
    pub email: String,
    pub password: String,
    pub id_rol: i64,
}

pub struct UsuariosView {
    usuarios_api: UsuariosClient,
    session: SessionStore,
    confirm: Arc<dyn Confirm>,
    reloads: SeqGuard,

    pub usuarios: Vec<Usuario>,
    pub roles: Vec<Rol>,
    pub cargando: bool,
    pub error: Option<String>,
    pub notice: Option<Notice>,
    pub termino_busqueda: String,

    pub nuevo_usuario: UsuarioForm,
    pub usuario_seleccionado: Option<Usuario>,
    pub usuario_eliminar: Option<Usuario>,
    pub is_nuevo_modal_open: bool,
    pub is_editar_modal_open: bool,
    pub is_eliminar_modal_open: bool,
}

impl UsuariosView {
    pub fn new(api: Arc<ApiClient>, confirm: Arc<dyn Confirm>) -> Self {
        let session = api.session().clone();
        Self {
            usuarios_api: UsuariosClient::new(api),
            session,
            confirm,
            reloads: SeqGuard::new(),
            usuarios: Vec::new(),
            roles: Vec::new(),
            cargando: false,
            error: None,
            notice: None,
            termino_busqueda: String::new(),
            nuevo_usuario: UsuarioForm::default(),
            usuario_seleccionado: None,
            usuario_eliminar: None,
            is_nuevo_modal_open: false,
            is_editar_modal_open: false,
            is_eliminar_modal_open: false,
        }
    }

    // -----------------------------------------------------------------------
    // Loading and search
    // -----------------------------------------------------------------------

    pub async fn load_all(&mut self) {
        self.cargando = true;
        self.error = None;

        let ticket = self.reloads.issue();
        let (usuarios, roles) = tokio::join!(self.usuarios_api.list(), self.usuarios_api.roles());
        if !self.reloads.is_current(ticket) {
            return;
        }

        match usuarios {
            Ok(lista) => self.usuarios = lista,
            Err(err) => {
                warn!(error = %err, "failed to load users");
                self.error = Some("Error al cargar los usuarios".to_string());
            }
        }

        match roles {
            Ok(lista) => self.roles = lista,
            Err(err) => {
                warn!(error = %err, "failed to load roles");
            }
        }

        self.cargando = false;
    }

    /// Server-side name search; an empty term restores the full list.
    pub async fn search(&mut self) {
        let termino = self.termino_busqueda.trim().to_string();
        if termino.is_empty() {
            self.load_all().await;
            return;
        }

        self.cargando = true;
        let ticket = self.reloads.issue();
        let resultado = self.usuarios_api.search(&termino).await;
        if !self.reloads.is_current(ticket) {
            return;
        }
        match resultado {
            Ok(lista) => self.usuarios = lista,
            Err(err) => {
                warn!(termino = %termino, error = %err, "user search failed");
                self.error = Some("Error al buscar usuarios".to_string());
            }
        }
        self.cargando = false;
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    pub fn open_nuevo_modal(&mut self) {
        self.nuevo_usuario = UsuarioForm::default();
        self.is_nuevo_modal_open = true;
    }

    pub fn open_editar_modal(&mut self, usuario: &Usuario) {
        self.usuario_seleccionado = Some(usuario.clone());
        self.is_editar_modal_open = true;
    }

    pub fn open_eliminar_modal(&mut self, usuario: &Usuario) {
        self.usuario_eliminar = Some(usuario.clone());
        self.is_eliminar_modal_open = true;
    }

    fn validate_form(&mut self) -> bool {
        if self.nuevo_usuario.nombre.trim().is_empty() {
            self.notice = Some(Notice::Warning("El nombre es obligatorio".to_string()));
            return false;
        }
        if self.nuevo_usuario.email.trim().is_empty() {
            self.notice = Some(Notice::Warning("El email es obligatorio".to_string()));
            return false;
        }
        if self.nuevo_usuario.password.len() < 6 {
            self.notice = Some(Notice::Warning(
                "La contraseña debe tener al menos 6 caracteres".to_string(),
            ));
            return false;
        }
        if self.nuevo_usuario.id_rol == 0 {
            self.notice = Some(Notice::Warning("Debes seleccionar un rol".to_string()));
            return false;
        }
        true
    }

    pub async fn create(&mut self) {
        if !self.validate_form() {
            return;
        }
        let Some(rol) = self
            .roles
            .iter()
            .find(|r| r.id_rol == self.nuevo_usuario.id_rol)
            .cloned()
        else {
            self.notice = Some(Notice::Warning(
                "Debes seleccionar un rol válido".to_string(),
            ));
            return;
        };

        let usuario = Usuario {
            // The backend generates the id.
            id_usuario: String::new(),
            nombre: self.nuevo_usuario.nombre.trim().to_string(),
            email: self.nuevo_usuario.email.trim().to_lowercase(),
            password: Some(self.nuevo_usuario.password.clone()),
            fecha_registro: None,
            rol: Some(rol),
        };

        match self.usuarios_api.create(&usuario).await {
            Ok(creado) => {
                info!(id_usuario = %creado.id_usuario, "user created");
                self.notice = Some(Notice::Success("Usuario creado exitosamente".to_string()));
                self.is_nuevo_modal_open = false;
                self.load_all().await;
            }
            Err(err) if err.is_auth() => {
                let detalle = err.to_string();
                let mensaje = if detalle.contains("expirado") || detalle.contains("Token") {
                    "Tu sesión ha expirado. Por favor, inicia sesión nuevamente."
                } else {
                    "Error de autenticación. Por favor, inicia sesión nuevamente."
                };
                warn!(error = %detalle, "user create rejected as unauthenticated");
                self.notice = Some(Notice::Error(format!("Error: {mensaje}")));
                self.session.schedule_forced_logout();
            }
            Err(err) => {
                warn!(error = %err, "failed to create user");
                self.notice = Some(Notice::Error(format!("Error: {err}")));
            }
        }
    }

    /// Update the selected user; a blank password means "leave it alone" and
    /// is omitted from the payload.
    pub async fn update_selected(&mut self) {
        let Some(usuario) = self.usuario_seleccionado.clone() else {
            return;
        };
        if usuario.nombre.trim().is_empty() {
            self.notice = Some(Notice::Warning("El nombre es obligatorio".to_string()));
            return;
        }
        if usuario.email.trim().is_empty() {
            self.notice = Some(Notice::Warning("El email es obligatorio".to_string()));
            return;
        }
        let password = usuario
            .password
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if let Some(p) = password {
            if p.len() < 6 {
                self.notice = Some(Notice::Warning(
                    "La contraseña debe tener al menos 6 caracteres".to_string(),
                ));
                return;
            }
        }
        if usuario.rol.as_ref().map(|r| r.id_rol).unwrap_or(0) == 0 {
            self.notice = Some(Notice::Warning("Debes seleccionar un rol".to_string()));
            return;
        }

        let payload = Usuario {
            id_usuario: usuario.id_usuario.clone(),
            nombre: usuario.nombre.trim().to_string(),
            email: usuario.email.trim().to_lowercase(),
            password: password.map(str::to_string),
            fecha_registro: None,
            rol: usuario.rol.clone(),
        };

        match self
            .usuarios_api
            .update(&usuario.id_usuario, &payload)
            .await
        {
            Ok(_) => {
                self.notice = Some(Notice::Success(
                    "Usuario actualizado exitosamente".to_string(),
                ));
                self.is_editar_modal_open = false;
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_usuario = %usuario.id_usuario, error = %err, "failed to update user");
                self.notice = Some(Notice::Error(format!("Error: {err}")));
            }
        }
    }

    pub async fn delete_selected(&mut self) {
        let Some(usuario) = self.usuario_eliminar.clone() else {
            return;
        };
        let pregunta = format!("¿Estás seguro de eliminar al usuario {}?", usuario.nombre);
        if !self.confirm.confirm(&pregunta) {
            return;
        }

        match self.usuarios_api.delete(&usuario.id_usuario).await {
            Ok(()) => {
                self.notice = Some(Notice::Success(
                    "Usuario eliminado exitosamente".to_string(),
                ));
                self.is_eliminar_modal_open = false;
                self.usuario_eliminar = None;
                self.load_all().await;
            }
            Err(err) => {
                warn!(id_usuario = %usuario.id_usuario, error = %err, "failed to delete user");
                self.notice = Some(Notice::Error(format!("Error: {err}")));
            }
        }
    }
}
