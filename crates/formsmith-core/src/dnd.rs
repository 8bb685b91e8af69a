//! Drop-position resolution for drag-and-drop
//!
//! Geometry is read fresh from the rendered field blocks on every drop, so
//! nothing here keeps state between events.

/// Vertical extent of one rendered field block, relative to the top of the
/// field container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldBox {
    pub top: f64,
    pub height: f64,
}

impl FieldBox {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Index at which a dropped field should be inserted: before the first box
/// whose midpoint lies below `pointer_y`, or `boxes.len()` to append.
pub fn resolve_insert_index(pointer_y: f64, boxes: &[FieldBox]) -> usize {
    boxes
        .iter()
        .position(|b| pointer_y < b.midpoint())
        .unwrap_or(boxes.len())
}

/// Everything a drop event exposes about where it landed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DropGeometry {
    /// Viewport y of the field container's top edge.
    pub container_top: Option<f64>,
    /// Viewport y of the pointer at drop time.
    pub pointer_client_y: Option<f64>,
    /// Rendered field blocks in display order.
    pub boxes: Vec<FieldBox>,
}

impl DropGeometry {
    pub fn new(container_top: f64, pointer_client_y: f64, boxes: Vec<FieldBox>) -> Self {
        Self {
            container_top: Some(container_top),
            pointer_client_y: Some(pointer_client_y),
            boxes,
        }
    }

    /// `None` when the container or pointer offset could not be read; the
    /// drop is then abandoned.
    pub fn resolve(&self) -> Option<usize> {
        let top = self.container_top?;
        let pointer = self.pointer_client_y?;
        Some(resolve_insert_index(pointer - top, &self.boxes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_boxes() -> Vec<FieldBox> {
        // midpoints at 100, 200, 300
        vec![FieldBox::new(50.0, 100.0), FieldBox::new(150.0, 100.0), FieldBox::new(250.0, 100.0)]
    }

    #[test]
    fn test_drop_between_fields() {
        assert_eq!(resolve_insert_index(150.0, &three_boxes()), 1);
    }

    #[test]
    fn test_drop_below_all_appends() {
        assert_eq!(resolve_insert_index(350.0, &three_boxes()), 3);
    }

    #[test]
    fn test_drop_above_all_prepends() {
        assert_eq!(resolve_insert_index(10.0, &three_boxes()), 0);
        assert_eq!(resolve_insert_index(42.0, &[]), 0);
    }

    #[test]
    fn test_pointer_on_midpoint_goes_after() {
        assert_eq!(resolve_insert_index(200.0, &three_boxes()), 2);
    }

    #[test]
    fn test_geometry_offsets_pointer_by_container() {
        let geometry = DropGeometry::new(400.0, 550.0, three_boxes());
        assert_eq!(geometry.resolve(), Some(1));
    }

    #[test]
    fn test_missing_geometry_abandons_drop() {
        let geometry = DropGeometry {
            container_top: None,
            pointer_client_y: Some(120.0),
            boxes: three_boxes(),
        };
        assert_eq!(geometry.resolve(), None);
        assert_eq!(DropGeometry::default().resolve(), None);
    }
}
