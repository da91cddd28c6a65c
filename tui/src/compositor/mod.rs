//! Layered Compositor
//!
//! Manages z-ordered layers for rendering. Each console panel draws into
//! its own layer buffer; menus are opaque layers stacked on top.
//!
//! The compositor composites all visible layers into a final output buffer.

mod layer;

use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

pub use layer::Layer;

/// Unique identifier for a layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(u32);

/// The compositor manages all layers and composites them together
#[derive(Debug)]
pub struct Compositor {
    /// All layers by ID
    layers: HashMap<LayerId, Layer>,
    /// Layers sorted by z-index for rendering
    render_order: Vec<LayerId>,
    /// Next layer ID to assign
    next_id: u32,
    /// Output buffer (composited result)
    output: Buffer,
    /// Total area
    area: Rect,
}

impl Compositor {
    /// Create a new compositor for the given area
    pub fn new(area: Rect) -> Self {
        Self {
            layers: HashMap::new(),
            render_order: Vec::new(),
            next_id: 0,
            output: Buffer::empty(area),
            area,
        }
    }

    /// Create a new layer and return its ID
    pub fn create_layer(&mut self, name: &'static str, bounds: Rect, z_index: i32) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;

        self.layers.insert(id, Layer::new(id, name, bounds, z_index));
        self.update_render_order();

        id
    }

    /// Create an opaque layer (menus and dialogs)
    pub fn create_opaque_layer(
        &mut self,
        name: &'static str,
        bounds: Rect,
        z_index: i32,
    ) -> LayerId {
        let id = self.create_layer(name, bounds, z_index);
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.opaque = true;
        }
        id
    }

    /// Get mutable access to a layer's buffer for rendering
    pub fn layer_buffer_mut(&mut self, id: LayerId) -> Option<&mut Buffer> {
        self.layers.get_mut(&id).map(|l| &mut l.buffer)
    }

    /// Screen bounds of a layer
    pub fn bounds(&self, id: LayerId) -> Option<Rect> {
        self.layers.get(&id).map(|l| l.bounds)
    }

    /// Move and resize a layer in one step
    ///
    /// The buffer is only reallocated when the size changes.
    pub fn set_bounds(&mut self, id: LayerId, bounds: Rect) {
        if let Some(layer) = self.layers.get_mut(&id) {
            let resized =
                layer.bounds.width != bounds.width || layer.bounds.height != bounds.height;
            layer.bounds = bounds;
            if resized {
                layer.buffer = Buffer::empty(Rect::new(0, 0, bounds.width, bounds.height));
            }
        }
    }

    /// Set layer visibility
    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.visible = visible;
        }
    }

    /// Whether a layer is visible
    pub fn is_visible(&self, id: LayerId) -> bool {
        self.layers.get(&id).is_some_and(|l| l.visible)
    }

    /// Resize the entire compositor
    pub fn resize(&mut self, area: Rect) {
        self.area = area;
        self.output = Buffer::empty(area);
    }

    /// Composite all visible layers into the output buffer
    pub fn composite(&mut self) -> &Buffer {
        self.output.reset();

        // Back to front
        for id in &self.render_order {
            if let Some(layer) = self.layers.get(id) {
                if layer.visible {
                    Self::blit_layer(&mut self.output, &self.area, layer);
                }
            }
        }

        &self.output
    }

    /// Blit a layer onto the output buffer
    ///
    /// Blank cells of a transparent layer let lower layers show through.
    fn blit_layer(output: &mut Buffer, area: &Rect, layer: &Layer) {
        let lb = &layer.bounds;

        for ly in 0..lb.height {
            for lx in 0..lb.width {
                let dst_x = lb.x.saturating_add(lx);
                let dst_y = lb.y.saturating_add(ly);
                if dst_x >= area.width || dst_y >= area.height {
                    continue;
                }

                let src_idx = layer.buffer.index_of(lx, ly);
                let Some(src_cell) = layer.buffer.content.get(src_idx) else {
                    continue;
                };

                if layer.opaque || src_cell.symbol() != " " {
                    let dst_idx = output.index_of(dst_x, dst_y);
                    if let Some(dst) = output.content.get_mut(dst_idx) {
                        *dst = src_cell.clone();
                    }
                }
            }
        }
    }

    /// Find the topmost visible layer at a given position (for mouse events)
    pub fn layer_at(&self, x: u16, y: u16) -> Option<LayerId> {
        self.render_order.iter().rev().copied().find(|id| {
            self.layers
                .get(id)
                .is_some_and(|layer| layer.visible && layer.contains(x, y))
        })
    }

    /// Update render order based on z-indices
    fn update_render_order(&mut self) {
        let mut order: Vec<LayerId> = self.layers.keys().copied().collect();
        order.sort_by_key(|id| (self.layers.get(id).map_or(0, |l| l.z_index), id.0));
        self.render_order = order;
    }
}
