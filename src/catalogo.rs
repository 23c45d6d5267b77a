//! Product catalogue reconciler.
//!
//! Loads categories strictly before products: the normalisation of the
//! backend's duck-typed category field (string, reference object, or bare
//! numeric id — see `models::resolver_categoria`) needs the category list in
//! memory as its lookup table, so the two fetches are never issued in
//! parallel. Also drives product administration (create, delete,
//! activate/deactivate, search).

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::clients::{CategoriasClient, ProductosClient};
use crate::models::{Categoria, Producto, ProductoCreateRequest};
use crate::reload::SeqGuard;
use crate::ui::{Confirm, Notice};

pub struct CatalogoView {
    productos_api: ProductosClient,
    categorias_api: CategoriasClient,
    confirm: Arc<dyn Confirm>,
    reloads: SeqGuard,

    pub categorias: Vec<Categoria>,
    /// Products with their category field already resolved.
    pub productos: Vec<Producto>,
    pub cargando_productos: bool,
    pub termino_busqueda: String,
    pub notice: Option<Notice>,

    pub nuevo_producto: ProductoCreateRequest,
    pub producto_eliminar: Option<Producto>,
    pub is_nuevo_modal_open: bool,
    pub is_eliminar_modal_open: bool,
}

impl CatalogoView {
    pub fn new(api: Arc<ApiClient>, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            productos_api: ProductosClient::new(Arc::clone(&api)),
            categorias_api: CategoriasClient::new(api),
            confirm,
            reloads: SeqGuard::new(),
            categorias: Vec::new(),
            productos: Vec::new(),
            cargando_productos: false,
            termino_busqueda: String::new(),
            notice: None,
            nuevo_producto: ProductoCreateRequest::default(),
            producto_eliminar: None,
            is_nuevo_modal_open: false,
            is_eliminar_modal_open: false,
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Categories first, then products. A category failure still lets the
    /// products load — they just normalise against an empty catalogue.
    pub async fn load(&mut self) {
        let ticket = self.reloads.issue();

        match self.categorias_api.list().await {
            Ok(lista) => {
                if !self.reloads.is_current(ticket) {
                    return;
                }
                self.categorias = lista;
            }
            Err(err) => {
                warn!(error = %err, "failed to load categories");
            }
        }

        self.load_productos_with(ticket).await;
    }

    /// Refetch only the product list, normalising against the categories
    /// already in memory.
    pub async fn reload_productos(&mut self) {
        let ticket = self.reloads.issue();
        self.load_productos_with(ticket).await;
    }

    async fn load_productos_with(&mut self, ticket: u64) {
        self.cargando_productos = true;
        let resultado = self.productos_api.list().await;
        if !self.reloads.is_current(ticket) {
            return;
        }
        match resultado {
            Ok(lista) => {
                self.productos = lista
                    .into_iter()
                    .map(|p| p.normalizar(&self.categorias))
                    .collect();
            }
            Err(err) => {
                warn!(error = %err, "failed to load products");
            }
        }
        self.cargando_productos = false;
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    /// Case-insensitive substring search over product name and resolved
    /// category name. An empty term returns the full list.
    pub fn search_products(&self) -> Vec<&Producto> {
        let termino = self.termino_busqueda.trim().to_lowercase();
        if termino.is_empty() {
            return self.productos.iter().collect();
        }
        self.productos
            .iter()
            .filter(|p| {
                p.nombre.to_lowercase().contains(&termino)
                    || p.nombre_categoria().to_lowercase().contains(&termino)
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    pub fn open_nuevo_modal(&mut self) {
        self.nuevo_producto = ProductoCreateRequest::default();
        self.is_nuevo_modal_open = true;
    }

    pub fn open_eliminar_modal(&mut self, producto: &Producto) {
        self.producto_eliminar = Some(producto.clone());
        self.is_eliminar_modal_open = true;
    }

    fn validate_form(&mut self) -> bool {
        if self.nuevo_producto.nombre.trim().is_empty() {
            self.notice = Some(Notice::Warning("El nombre es obligatorio".to_string()));
            return false;
        }
        if self.nuevo_producto.precio <= 0.0 {
            self.notice = Some(Notice::Warning(
                "El precio debe ser mayor a 0".to_string(),
            ));
            return false;
        }
        if self.nuevo_producto.stock < 0 {
            self.notice = Some(Notice::Warning(
                "El stock no puede ser negativo".to_string(),
            ));
            return false;
        }
        if self.nuevo_producto.id_categoria == 0 {
            self.notice = Some(Notice::Warning(
                "Debes seleccionar una categoría".to_string(),
            ));
            return false;
        }
        true
    }

    pub async fn create_producto(&mut self) {
        if !self.validate_form() {
            return;
        }
        let payload = ProductoCreateRequest {
            nombre: self.nuevo_producto.nombre.trim().to_string(),
            ..self.nuevo_producto.clone()
        };
        match self.productos_api.create(&payload).await {
            Ok(creado) => {
                info!(id_producto = creado.id_producto, "product created");
                self.notice = Some(Notice::Success("Producto creado exitosamente".to_string()));
                self.is_nuevo_modal_open = false;
                self.reload_productos().await;
            }
            Err(err) => {
                // Modal stays open for correction.
                warn!(error = %err, "failed to create product");
                self.notice = Some(Notice::Error(format!("Error al crear el producto: {err}")));
            }
        }
    }

    pub async fn delete_selected(&mut self) {
        let Some(producto) = self.producto_eliminar.clone() else {
            return;
        };
        match self.productos_api.delete(producto.id_producto).await {
            Ok(()) => {
                self.notice = Some(Notice::Success(
                    "Producto eliminado exitosamente".to_string(),
                ));
                self.is_eliminar_modal_open = false;
                self.producto_eliminar = None;
                self.reload_productos().await;
            }
            Err(err) => {
                warn!(id_producto = producto.id_producto, error = %err, "failed to delete product");
                self.notice = Some(Notice::Error(format!(
                    "Error al eliminar el producto: {err}"
                )));
            }
        }
    }

    /// Flip the active flag through the dedicated endpoints, mirroring the
    /// returned flag in place before the consistency reload.
    pub async fn toggle_estado(&mut self, producto: &Producto) {
        let accion = if producto.estado {
            "desactivar"
        } else {
            "activar"
        };
        let pregunta = format!(
            "¿Estás seguro de que deseas {accion} el producto \"{}\"?",
            producto.nombre
        );
        if !self.confirm.confirm(&pregunta) {
            return;
        }

        let resultado = if producto.estado {
            self.productos_api.deactivate(producto.id_producto).await
        } else {
            self.productos_api.activate(producto.id_producto).await
        };

        match resultado {
            Ok(actualizado) => {
                let hecho = if producto.estado {
                    "desactivado"
                } else {
                    "activado"
                };
                self.notice = Some(Notice::Success(format!(
                    "Producto {hecho} exitosamente"
                )));
                if let Some(local) = self
                    .productos
                    .iter_mut()
                    .find(|p| p.id_producto == producto.id_producto)
                {
                    local.estado = actualizado.estado;
                }
                self.reload_productos().await;
            }
            Err(err) => {
                warn!(id_producto = producto.id_producto, error = %err, "failed to toggle product");
                self.notice = Some(Notice::Error(format!(
                    "Error al {accion} el producto: {err}"
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SesionUsuario, SessionStore};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn view_with(uri: &str, accept: bool) -> CatalogoView {
        let session = SessionStore::ephemeral();
        session.set_usuario(SesionUsuario {
            token: "jwt".into(),
            ..Default::default()
        });
        let api = Arc::new(ApiClient::new(uri, session).unwrap());
        CatalogoView::new(api, Arc::new(move |_: &str| accept))
    }

    async fn mock_categorias(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/categorias"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"idCategoria": 5, "nombre": "Bebidas"},
                {"idCategoria": 7, "nombre": "Entradas"}
            ])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn load_normaliza_categorias_mixtas() {
        let server = MockServer::start().await;
        mock_categorias(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/productos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"idProducto": 1, "nombre": "Café", "precio": 2.5, "stock": 10,
                 "estado": true, "categoria": "Bebidas", "idCategoria": 5},
                {"idProducto": 2, "nombre": "Flan", "precio": 3.0, "stock": 4,
                 "estado": true, "categoria": "Postres"},
                {"idProducto": 3, "nombre": "Sopa", "precio": 6.0, "stock": 2,
                 "estado": true}
            ])))
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true);
        view.load().await;

        assert_eq!(view.categorias.len(), 2);
        assert_eq!(view.productos.len(), 3);
        assert_eq!(view.productos[0].nombre_categoria(), "Bebidas");
        // Unknown name keeps the backend string with id 0.
        assert_eq!(view.productos[1].nombre_categoria(), "Postres");
        assert_eq!(view.productos[2].nombre_categoria(), "Sin categoría");
    }

    #[tokio::test]
    async fn fallo_de_categorias_no_impide_productos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categorias"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/productos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"idProducto": 1, "nombre": "Café", "precio": 2.5, "stock": 10,
                 "estado": true, "categoria": "Bebidas"}
            ])))
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true);
        view.load().await;

        assert!(view.categorias.is_empty());
        assert_eq!(view.productos.len(), 1);
        // Empty catalogue: the bare name is kept as an id-0 reference.
        assert_eq!(view.productos[0].nombre_categoria(), "Bebidas");
    }

    #[tokio::test]
    async fn busqueda_cubre_nombre_y_categoria() {
        let server = MockServer::start().await;
        mock_categorias(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/productos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"idProducto": 1, "nombre": "Café", "precio": 2.5, "stock": 10,
                 "estado": true, "idCategoria": 5},
                {"idProducto": 2, "nombre": "Empanada", "precio": 3.0, "stock": 4,
                 "estado": true, "idCategoria": 7}
            ])))
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true);
        view.load().await;

        view.termino_busqueda = "bebidas".into();
        let resultado = view.search_products();
        assert_eq!(resultado.len(), 1);
        assert_eq!(resultado[0].nombre, "Café");

        view.termino_busqueda = "empa".into();
        assert_eq!(view.search_products().len(), 1);

        view.termino_busqueda.clear();
        assert_eq!(view.search_products().len(), 2);
    }

    #[tokio::test]
    async fn crear_producto_valida_localmente() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/productos/crear"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), true);
        view.nuevo_producto.nombre = "Café".into();
        view.nuevo_producto.precio = 0.0;
        view.create_producto().await;
        assert_eq!(
            view.notice,
            Some(Notice::Warning("El precio debe ser mayor a 0".to_string()))
        );

        view.nuevo_producto.precio = 2.5;
        view.nuevo_producto.id_categoria = 0;
        view.create_producto().await;
        assert_eq!(
            view.notice,
            Some(Notice::Warning("Debes seleccionar una categoría".to_string()))
        );
    }

    #[tokio::test]
    async fn toggle_sin_confirmacion_no_llama() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut view = view_with(&server.uri(), false);
        let producto = Producto {
            id_producto: 1,
            nombre: "Café".into(),
            precio: 2.5,
            stock: 10,
            estado: true,
            categoria: None,
            id_categoria: None,
        };
        view.toggle_estado(&producto).await;
        assert!(view.notice.is_none());
    }
}
