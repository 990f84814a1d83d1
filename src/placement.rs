use crate::Placement;

#[derive(Debug, Clone, Default)]
pub struct PlacementTracker {
    placement: Placement,
}

// The anchor only advances when a move is accepted, so a pointer that
// overshoots the canvas edge has to come back before the layer follows again.
#[derive(Debug, Clone, Default)]
pub struct DragGesture {
    anchor: Option<(i32, i32)>,
}

impl PlacementTracker {
    pub fn centered(canvas: (u32, u32), layer: (u32, u32)) -> Self {
        let mut tracker = Self::default();
        tracker.recenter(canvas, layer);
        tracker
    }

    pub fn current(&self) -> Placement {
        self.placement
    }

    pub fn recenter(&mut self, canvas: (u32, u32), layer: (u32, u32)) -> Placement {
        self.placement = Placement {
            x: (canvas.0 as i32 - layer.0 as i32) / 2,
            y: (canvas.1 as i32 - layer.1 as i32) / 2,
        };
        self.placement
    }

    /// Moves the layer by `delta` if it stays fully inside the canvas.
    /// A rejected move returns `None` and keeps the current placement.
    pub fn drag_by(
        &mut self,
        delta: (i64, i64),
        canvas: (u32, u32),
        layer: (u32, u32),
    ) -> Option<Placement> {
        let x1 = self.placement.x as i64 + delta.0;
        let y1 = self.placement.y as i64 + delta.1;
        let (x2, y2) = (x1 + layer.0 as i64, y1 + layer.1 as i64);

        let inside = x1 >= 0 && y1 >= 0 && x2 <= canvas.0 as i64 && y2 <= canvas.1 as i64;
        if !inside {
            log::debug!(
                "Rejected drag by {:?}: ({}, {})-({}, {}) leaves {}x{} canvas",
                delta,
                x1,
                y1,
                x2,
                y2,
                canvas.0,
                canvas.1
            );
            return None;
        }

        let moved = Placement {
            x: i32::try_from(x1).ok()?,
            y: i32::try_from(y1).ok()?,
        };
        self.placement = moved;
        Some(moved)
    }
}

impl DragGesture {
    pub fn begin(&mut self, x: i32, y: i32) {
        self.anchor = Some((x, y));
    }

    pub fn delta_to(&self, x: i32, y: i32) -> Option<(i64, i64)> {
        self.anchor.map(|(ax, ay)| (x as i64 - ax as i64, y as i64 - ay as i64))
    }

    pub fn accept(&mut self, x: i32, y: i32) {
        if self.anchor.is_some() {
            self.anchor = Some((x, y));
        }
    }

    pub fn end(&mut self) {
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: (u32, u32) = (200, 100);

    #[test]
    fn recenter_uses_layer_size() {
        let mut tracker = PlacementTracker::default();
        assert_eq!(tracker.recenter(CANVAS, (50, 20)), Placement::new(75, 40));
        assert_eq!(tracker.recenter(CANVAS, (0, 0)), Placement::new(100, 50));
        // Oversized layers are centered too, hanging over both edges.
        assert_eq!(tracker.recenter(CANVAS, (260, 100)), Placement::new(-30, 0));
    }

    #[test]
    fn drag_inside_canvas_is_accepted() {
        let mut tracker = PlacementTracker::centered(CANVAS, (50, 20));
        assert_eq!(tracker.drag_by((10, -5), CANVAS, (50, 20)), Some(Placement::new(85, 35)));
        assert_eq!(tracker.current(), Placement::new(85, 35));
    }

    #[test]
    fn drag_past_left_edge_is_rejected() {
        let mut tracker = PlacementTracker::centered(CANVAS, (50, 20));
        tracker.drag_by((-75, 0), CANVAS, (50, 20)).unwrap();
        assert_eq!(tracker.current().x, 0);

        assert_eq!(tracker.drag_by((-5, 0), CANVAS, (50, 20)), None);
        assert_eq!(tracker.current(), Placement::new(0, 40));
    }

    #[test]
    fn drag_flush_to_far_edges_is_allowed() {
        let mut tracker = PlacementTracker::centered(CANVAS, (50, 20));
        assert_eq!(
            tracker.drag_by((75, 40), CANVAS, (50, 20)),
            Some(Placement::new(150, 80))
        );
        assert_eq!(tracker.drag_by((1, 0), CANVAS, (50, 20)), None);
        assert_eq!(tracker.drag_by((0, 1), CANVAS, (50, 20)), None);
    }

    #[test]
    fn overshooting_move_is_rejected_wholesale() {
        let mut tracker = PlacementTracker::centered(CANVAS, (50, 20));
        // Horizontal part would fit, vertical part would not: nothing moves.
        assert_eq!(tracker.drag_by((10, 100), CANVAS, (50, 20)), None);
        assert_eq!(tracker.current(), Placement::new(75, 40));
    }

    #[test]
    fn extreme_pointer_coordinates_do_not_wrap() {
        let mut gesture = DragGesture::default();
        gesture.begin(i32::MAX, 10);
        let delta = gesture.delta_to(i32::MIN, 10).unwrap();
        assert_eq!(delta, (i32::MIN as i64 - i32::MAX as i64, 0));

        let mut tracker = PlacementTracker::centered(CANVAS, (50, 20));
        assert_eq!(tracker.drag_by(delta, CANVAS, (50, 20)), None);
        assert_eq!(tracker.drag_by((i64::from(i32::MAX), 0), CANVAS, (50, 20)), None);
        assert_eq!(tracker.current(), Placement::new(75, 40));
    }

    #[test]
    fn gesture_anchor_only_advances_on_accept() {
        let mut gesture = DragGesture::default();
        assert_eq!(gesture.delta_to(5, 5), None);

        gesture.begin(10, 10);
        assert_eq!(gesture.delta_to(15, 8), Some((5, -2)));
        assert_eq!(gesture.delta_to(20, 10), Some((10, 0)));

        gesture.accept(20, 10);
        assert_eq!(gesture.delta_to(21, 10), Some((1, 0)));

        gesture.end();
        gesture.accept(0, 0);
        assert_eq!(gesture.delta_to(1, 1), None);
    }
}
