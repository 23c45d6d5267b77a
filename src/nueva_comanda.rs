//! Order-creation sequencer.
//!
//! The backend models an order and its line items as separate creation
//! endpoints, so a new order takes two network phases: the header first
//! (strict dependency — line items need the generated order id), then one
//! request per cart entry, issued concurrently and awaited as a whole. A
//! failed header aborts everything; a failed line item after a created
//! header is an accepted inconsistency window that is reported, never
//! hidden and never rolled back automatically.

use tracing::{info, warn};

use crate::clients::ComandasClient;
use crate::models::{ComandaCreateRequest, DetalleCreateRequest, Producto};

/// One cart entry: a product reference plus the requested quantity.
#[derive(Debug, Clone)]
pub struct ItemCarrito {
    pub producto: Producto,
    pub cantidad: i64,
}

impl ItemCarrito {
    pub fn subtotal(&self) -> f64 {
        self.producto.precio * self.cantidad as f64
    }
}

/// Final state of a `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Local validation failed; no request was issued.
    Invalid(String),
    /// The order header could not be created; zero line-item calls were made.
    Failed(String),
    /// Header created but at least one line item failed. The order exists
    /// server-side with a partial item set; the caller must still reload.
    Partial,
    /// Header and every line item created; the cart has been cleared.
    Success,
}

#[derive(Debug, Default)]
pub struct NuevaComanda {
    pub id_mesa: i64,
    pub id_mesero: String,
    pub items: Vec<ItemCarrito>,
    pub producto_seleccionado: Option<Producto>,
    pub cantidad: i64,
}

impl NuevaComanda {
    pub fn new() -> Self {
        Self {
            cantidad: 1,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Pick the product for the next cart addition out of the in-stock
    /// catalogue; `None` or an unknown id clears the selection.
    pub fn select_product(&mut self, id_producto: Option<i64>, catalogo: &[Producto]) {
        self.producto_seleccionado = id_producto
            .and_then(|id| catalogo.iter().find(|p| p.id_producto == id))
            .cloned();
    }

    /// Move the current selection into the cart. A product already present
    /// accumulates quantity; the total per product is capped by its stock
    /// count, whether the request is new or cumulative.
    pub fn add_to_cart(&mut self) -> Result<(), String> {
        let Some(producto) = self.producto_seleccionado.clone() else {
            return Err("Debes seleccionar un producto y una cantidad válida".to_string());
        };
        if self.cantidad < 1 {
            return Err("Debes seleccionar un producto y una cantidad válida".to_string());
        }
        if self.cantidad > producto.stock {
            return Err(format!(
                "No hay suficiente stock. Stock disponible: {}",
                producto.stock
            ));
        }

        if let Some(existente) = self
            .items
            .iter_mut()
            .find(|i| i.producto.id_producto == producto.id_producto)
        {
            let acumulada = existente.cantidad + self.cantidad;
            if acumulada > producto.stock {
                return Err(format!(
                    "No hay suficiente stock. Stock disponible: {}",
                    producto.stock
                ));
            }
            existente.cantidad = acumulada;
        } else {
            self.items.push(ItemCarrito {
                producto,
                cantidad: self.cantidad,
            });
        }

        self.producto_seleccionado = None;
        self.cantidad = 1;
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(ItemCarrito::subtotal).sum()
    }

    fn validate(&self) -> Result<(), String> {
        if self.id_mesa == 0 {
            return Err("Debes seleccionar una mesa".to_string());
        }
        if self.id_mesero.trim().is_empty() {
            return Err("Debes seleccionar un mesero".to_string());
        }
        if self.items.is_empty() {
            return Err("Debes agregar al menos un producto a la comanda".to_string());
        }
        Ok(())
    }

    /// Run the two-phase creation. Line-item requests are issued
    /// concurrently; completion is only declared once all have settled.
    pub async fn submit(&mut self, comandas: &ComandasClient) -> SubmitOutcome {
        if let Err(mensaje) = self.validate() {
            return SubmitOutcome::Invalid(mensaje);
        }

        let header = ComandaCreateRequest {
            id_mesa: self.id_mesa,
            id_mesero: self.id_mesero.trim().to_string(),
        };
        let creada = match comandas.create(&header).await {
            Ok(comanda) => comanda,
            Err(err) => {
                warn!(error = %err, "failed to create order header");
                return SubmitOutcome::Failed(err.to_string());
            }
        };
        info!(
            id_comanda = creada.id_comanda,
            items = self.items.len(),
            "order header created"
        );

        let mut llamadas = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let detalle = DetalleCreateRequest {
                id_comanda: creada.id_comanda,
                id_producto: item.producto.id_producto,
                cantidad: item.cantidad,
                precio_unitario: item.producto.precio,
            };
            let cliente = comandas.clone();
            llamadas.push(tokio::spawn(async move {
                cliente.add_detail(&detalle).await
            }));
        }

        let mut fallidos = 0usize;
        for llamada in llamadas {
            match llamada.await {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    warn!(id_comanda = creada.id_comanda, error = %err, "line item failed");
                    fallidos += 1;
                }
                Err(err) => {
                    warn!(id_comanda = creada.id_comanda, error = %err, "line item task died");
                    fallidos += 1;
                }
            }
        }

        if fallidos == 0 {
            self.reset();
            SubmitOutcome::Success
        } else {
            warn!(
                id_comanda = creada.id_comanda,
                fallidos, "order created with incomplete line items"
            );
            SubmitOutcome::Partial
        }
    }
}
