use bevy::prelude::*;

/// Bitmask restricting raycasts to categories of scene objects. The drawing
/// cursor, outline vertices, room volumes and the building mesh overlap in
/// screen space, so queries select by category rather than z-order alone.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickLayers(u32);

impl PickLayers {
    pub const NONE: PickLayers = PickLayers(0);
    /// The flattened architectural mesh.
    pub const ARCHITECTURE: PickLayers = PickLayers(1 << 0);
    /// Extruded room volumes (hover/click targets).
    pub const ROOM_VOLUMES: PickLayers = PickLayers(1 << 1);
    /// Clickable vertex markers of the outline widget.
    pub const OUTLINE_VERTICES: PickLayers = PickLayers(1 << 2);
    /// Pure visuals (cursor sphere, outline lines) that no raycast may hit.
    pub const WIDGETS: PickLayers = PickLayers(1 << 3);
    pub const ALL: PickLayers = PickLayers(u32::MAX);

    pub fn intersects(self, mask: PickLayers) -> bool {
        self.0 & mask.0 != 0
    }

    pub fn union(self, other: PickLayers) -> PickLayers {
        PickLayers(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_disjoint() {
        assert!(!PickLayers::ARCHITECTURE.intersects(PickLayers::ROOM_VOLUMES));
        assert!(!PickLayers::ROOM_VOLUMES.intersects(PickLayers::OUTLINE_VERTICES));
        assert!(!PickLayers::WIDGETS.intersects(PickLayers::ARCHITECTURE));
    }

    #[test]
    fn all_matches_every_category_and_none_matches_nothing() {
        for layer in [
            PickLayers::ARCHITECTURE,
            PickLayers::ROOM_VOLUMES,
            PickLayers::OUTLINE_VERTICES,
            PickLayers::WIDGETS,
        ] {
            assert!(layer.intersects(PickLayers::ALL));
            assert!(!layer.intersects(PickLayers::NONE));
        }
    }

    #[test]
    fn union_combines_categories() {
        let mask = PickLayers::ROOM_VOLUMES.union(PickLayers::OUTLINE_VERTICES);
        assert!(PickLayers::ROOM_VOLUMES.intersects(mask));
        assert!(PickLayers::OUTLINE_VERTICES.intersects(mask));
        assert!(!PickLayers::ARCHITECTURE.intersects(mask));
    }
}
