//! Client-side projections of the Restaurante backend resources.
//!
//! Field names mirror the backend JSON contract (Spanish, camelCase). Every
//! value here is a disposable copy: lists are replaced wholesale on each
//! reconciliation fetch and nothing is persisted across restarts except the
//! session blob (see `session`).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Tables and statuses
// ---------------------------------------------------------------------------

/// A status row from `GET /estados`. The backend also uses this shape inline
/// on tables and orders; ids and names are nullable on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estado {
    pub id_estado: Option<i64>,
    pub nombre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
}

impl Estado {
    /// Lowercased, trimmed status name for case-insensitive comparisons.
    pub fn nombre_normalizado(&self) -> String {
        self.nombre
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mesa {
    pub id_mesa: i64,
    pub capacidad: i64,
    pub ubicacion: String,
    pub estado: Option<Estado>,
}

impl Mesa {
    /// Whether this table currently carries the given status name
    /// (case-insensitive).
    pub fn tiene_estado(&self, nombre: &str) -> bool {
        self.estado
            .as_ref()
            .map(|e| e.nombre_normalizado() == nombre.to_lowercase())
            .unwrap_or(false)
    }
}

/// Flattened table reference embedded in order responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MesaSimple {
    pub id_mesa: i64,
    pub ubicacion: String,
    pub capacidad: i64,
    pub estado: Option<String>,
}

/// Create/update payload for `POST /mesas` and `PUT /mesas/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MesaPayload {
    pub capacidad: i64,
    pub ubicacion: String,
    pub estado: Estado,
}

// ---------------------------------------------------------------------------
// Users and roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rol {
    pub id_rol: i64,
    pub nombre: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub id_usuario: String,
    pub nombre: String,
    pub email: String,
    /// Only populated on create/update requests; never echoed back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_registro: Option<String>,
    #[serde(default)]
    pub rol: Option<Rol>,
}

impl Usuario {
    /// Whether this user holds the given role name (case-insensitive).
    pub fn tiene_rol(&self, nombre: &str) -> bool {
        self.rol
            .as_ref()
            .map(|r| r.nombre.trim().to_lowercase() == nombre.to_lowercase())
            .unwrap_or(false)
    }
}

/// Flattened user reference embedded in order responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsuarioSimple {
    pub id_usuario: String,
    pub nombre: String,
    pub email: String,
    pub rol: Option<String>,
}

// ---------------------------------------------------------------------------
// Categories and products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Categoria {
    pub id_categoria: i64,
    pub nombre: String,
}

/// Placeholder reference used when a product cannot be matched to any
/// catalogue entry.
pub fn sin_categoria() -> Categoria {
    Categoria {
        id_categoria: 0,
        nombre: "Sin categoría".to_string(),
    }
}

/// The backend is inconsistent about product categories: the `categoria`
/// field arrives either as a full reference object or as a bare name string,
/// and the numeric `idCategoria` may or may not be populated alongside it.
/// This variant captures the raw wire shape; `resolver_categoria` collapses
/// it into a proper [`Categoria`] once the category list is in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoriaRef {
    Referencia(Categoria),
    Nombre(String),
}

/// Resolve a raw category field against the fetched category catalogue.
///
/// Priority order:
/// 1. a positive `idCategoria` wins — looked up in the catalogue, or paired
///    with whatever name string the backend supplied;
/// 2. a non-empty name string is looked up by name, else kept with id 0;
/// 3. an already well-formed reference is left unchanged;
/// 4. anything else becomes the "Sin categoría" placeholder.
pub fn resolver_categoria(
    categoria: Option<&CategoriaRef>,
    id_categoria: Option<i64>,
    catalogo: &[Categoria],
) -> Categoria {
    // The bare name only counts when the field arrived as a string.
    let nombre_backend = match categoria {
        Some(CategoriaRef::Nombre(s)) if !s.trim().is_empty() => Some(s.trim()),
        _ => None,
    };

    if let Some(id) = id_categoria.filter(|id| *id > 0) {
        if let Some(encontrada) = catalogo.iter().find(|c| c.id_categoria == id) {
            return encontrada.clone();
        }
        return Categoria {
            id_categoria: id,
            nombre: nombre_backend.unwrap_or("Sin categoría").to_string(),
        };
    }

    if let Some(nombre) = nombre_backend {
        if let Some(encontrada) = catalogo.iter().find(|c| c.nombre == nombre) {
            return encontrada.clone();
        }
        return Categoria {
            id_categoria: 0,
            nombre: nombre.to_string(),
        };
    }

    if let Some(CategoriaRef::Referencia(c)) = categoria {
        return c.clone();
    }

    sin_categoria()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Producto {
    pub id_producto: i64,
    pub nombre: String,
    pub precio: f64,
    pub stock: i64,
    /// Active flag; inactive products are hidden from order entry.
    pub estado: bool,
    #[serde(default)]
    pub categoria: Option<CategoriaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_categoria: Option<i64>,
}

impl Producto {
    /// Replace the raw category field with its resolved reference.
    pub fn normalizar(mut self, catalogo: &[Categoria]) -> Self {
        let resuelta = resolver_categoria(self.categoria.as_ref(), self.id_categoria, catalogo);
        self.categoria = Some(CategoriaRef::Referencia(resuelta));
        self
    }

    /// Display name of the category, tolerant of an unresolved field.
    pub fn nombre_categoria(&self) -> &str {
        match &self.categoria {
            Some(CategoriaRef::Referencia(c)) if !c.nombre.is_empty() => &c.nombre,
            Some(CategoriaRef::Nombre(s)) if !s.trim().is_empty() => s,
            _ => "Sin categoría",
        }
    }
}

/// Payload for `POST /productos/crear`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductoCreateRequest {
    pub nombre: String,
    pub precio: f64,
    pub stock: i64,
    pub id_categoria: i64,
}

impl Default for ProductoCreateRequest {
    fn default() -> Self {
        Self {
            nombre: String::new(),
            precio: 0.0,
            stock: 0,
            id_categoria: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// One line item of an order, as returned inside a [`Comanda`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetalleComanda {
    pub id_detalle: i64,
    pub nombre_producto: String,
    pub cantidad: i64,
    pub precio_unitario: f64,
    pub subtotal: f64,
    #[serde(default)]
    pub estado: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comanda {
    pub id_comanda: i64,
    /// Backend timestamps carry no zone; comparisons stay in naive time.
    pub fecha: NaiveDateTime,
    pub mesa: Option<MesaSimple>,
    pub mesero: Option<UsuarioSimple>,
    pub cocinero: Option<UsuarioSimple>,
    pub estado: Option<Estado>,
    #[serde(default)]
    pub productos: Option<Vec<DetalleComanda>>,
    #[serde(default)]
    pub total: f64,
}

impl Comanda {
    /// Lowercased status name for substring bucketing.
    pub fn estado_normalizado(&self) -> String {
        self.estado
            .as_ref()
            .map(|e| e.nombre_normalizado())
            .unwrap_or_default()
    }
}

/// Header payload for `POST /comandas/crear`; line items follow through
/// `POST /detalle-comandas/crear`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComandaCreateRequest {
    pub id_mesa: i64,
    pub id_mesero: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetalleCreateRequest {
    pub id_comanda: i64,
    pub id_producto: i64,
    pub cantidad: i64,
    pub precio_unitario: f64,
}

// ---------------------------------------------------------------------------
// Billing summary
// ---------------------------------------------------------------------------

/// One order row inside the per-table billing aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComandaFacturacion {
    pub id_comanda: i64,
    pub fecha: NaiveDateTime,
    pub estado: String,
    pub mesero: String,
    pub cocinero: String,
    pub total: f64,
    pub cantidad_productos: i64,
    pub pagada: bool,
}

impl ComandaFacturacion {
    /// Eligible for "mark all paid": completed and not yet paid. The backend
    /// has drifted between "Completado" and "Completada"; both count.
    pub fn pendiente_de_pago(&self) -> bool {
        !self.pagada && (self.estado == "Completado" || self.estado == "Completada")
    }
}

/// Per-table billing aggregate from `GET /comandas/mesa/{id}/facturacion`.
/// Never persisted client-side; recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacturacionMesa {
    pub id_mesa: i64,
    pub ubicacion_mesa: String,
    pub total_comandas: i64,
    pub comandas_completadas: i64,
    pub comandas_pendientes: i64,
    pub comandas_pagadas: i64,
    pub todas_completadas: bool,
    pub todas_pagadas: bool,
    pub total_a_pagar: f64,
    pub comandas: Vec<ComandaFacturacion>,
}

/// Response of `POST /comandas/mesa/{id}/finalizar-y-liberar`. The server
/// applies both effects (complete pending orders, free the table) in one
/// request; these counts are whatever it reports back.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizarLiberarResultado {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub comandas_finalizadas: i64,
    #[serde(default)]
    pub mesa_liberada: bool,
}

/// Response of `POST /comandas/mesa/{id}/pagar-todas`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagarTodasResultado {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub comandas_pagadas: i64,
}

// ---------------------------------------------------------------------------
// Dashboard statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComandaReciente {
    pub id: i64,
    pub fecha: String,
    pub mesa: Option<i64>,
    pub mesero: Option<String>,
    pub estado: Option<String>,
    #[serde(default)]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductoMasVendido {
    pub id: i64,
    pub nombre: String,
    pub cantidad_vendida: i64,
    pub precio: f64,
}

/// Aggregate from `GET /dashboard/estadisticas`. Money fields may arrive as
/// explicit nulls and the collections may be absent entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardEstadisticas {
    pub total_mesas: i64,
    pub mesas_ocupadas: i64,
    pub meseros_activos: i64,
    pub ordenes_en_preparacion: i64,
    pub ventas_hoy: Option<f64>,
    pub ventas_semana: Option<f64>,
    pub total_productos: i64,
    pub comandas_recientes: Vec<ComandaReciente>,
    pub productos_mas_vendidos: Vec<ProductoMasVendido>,
    pub comandas_por_estado: HashMap<String, i64>,
}

impl DashboardEstadisticas {
    /// Force nullable money fields to zero so the presentation layer never
    /// sees a hole.
    pub fn normalizada(mut self) -> Self {
        self.ventas_hoy = Some(self.ventas_hoy.unwrap_or(0.0));
        self.ventas_semana = Some(self.ventas_semana.unwrap_or(0.0));
        self
    }
}
