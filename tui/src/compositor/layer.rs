//! Layer - A single compositable layer

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use super::LayerId;

/// A single layer in the compositor
#[derive(Debug)]
pub struct Layer {
    /// Unique identifier
    pub id: LayerId,
    /// Name for logs and debugging
    pub name: &'static str,
    /// Z-order (higher = in front)
    pub z_index: i32,
    /// Position and size
    pub bounds: Rect,
    /// Whether the layer is visible
    pub visible: bool,
    /// Opaque layers hide everything beneath their bounds, blanks included
    pub opaque: bool,
    /// The layer's render buffer
    pub buffer: Buffer,
}

impl Layer {
    /// Create a new layer
    pub fn new(id: LayerId, name: &'static str, bounds: Rect, z_index: i32) -> Self {
        // Buffer uses origin coordinates (0,0) internally
        let buffer_area = Rect::new(0, 0, bounds.width, bounds.height);
        Self {
            id,
            name,
            z_index,
            bounds,
            visible: true,
            opaque: false,
            buffer: Buffer::empty(buffer_area),
        }
    }

    /// Check if a point is within this layer's bounds
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.bounds.x
            && x < self.bounds.x.saturating_add(self.bounds.width)
            && y >= self.bounds.y
            && y < self.bounds.y.saturating_add(self.bounds.height)
    }
}
