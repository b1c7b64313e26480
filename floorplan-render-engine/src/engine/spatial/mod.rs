use bevy::prelude::*;
use bevy::render::mesh::VertexAttributeValues;

use crate::engine::picking::raycast::{RayHit, ray_triangle_hit_t};

/// Nearest mesh vertex to a query point, with its distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    pub point: Vec3,
    pub distance: f32,
}

/// The architectural model's triangle geometry baked into a single world
/// space coordinate frame. Built once when the scene instance finishes
/// loading: each submesh's accumulated world transform is applied to its
/// vertices eagerly, so spatial queries never re-walk the scene hierarchy.
///
/// Empty until the model has loaded; every query degrades to "no result"
/// in that state, which callers treat as a normal startup condition.
#[derive(Resource, Default)]
pub struct FlattenedGeometry {
    positions: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
}

impl FlattenedGeometry {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.triangles.clear();
    }

    /// Bake one mesh's positions under its world transform. Returns the
    /// world-space bounds of the added vertices, used for region tests.
    pub fn push_positions(
        &mut self,
        positions: &[[f32; 3]],
        indices: Option<&[u32]>,
        transform: &GlobalTransform,
    ) -> Option<(Vec3, Vec3)> {
        if positions.is_empty() {
            return None;
        }

        let base = self.positions.len() as u32;
        let mut min = Vec3::INFINITY;
        let mut max = Vec3::NEG_INFINITY;
        for position in positions {
            let world = transform.transform_point(Vec3::from_array(*position));
            min = min.min(world);
            max = max.max(world);
            self.positions.push(world);
        }

        match indices {
            Some(indices) => {
                for triangle in indices.chunks_exact(3) {
                    self.triangles
                        .push([base + triangle[0], base + triangle[1], base + triangle[2]]);
                }
            }
            None => {
                // Non-indexed meshes are already a triangle soup.
                for i in (0..positions.len() as u32).step_by(3) {
                    if i + 2 < positions.len() as u32 {
                        self.triangles.push([base + i, base + i + 1, base + i + 2]);
                    }
                }
            }
        }

        Some((min, max))
    }

    /// Bake a bevy mesh. Returns `None` (and adds nothing) when the mesh has
    /// no float position attribute.
    pub fn push_mesh(&mut self, mesh: &Mesh, transform: &GlobalTransform) -> Option<(Vec3, Vec3)> {
        let positions = match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(positions)) => positions.as_slice(),
            _ => return None,
        };
        let indices: Option<Vec<u32>> = mesh
            .indices()
            .map(|indices| indices.iter().map(|i| i as u32).collect());
        self.push_positions(positions, indices.as_deref(), transform)
    }

    /// Nearest baked vertex to the query point. Linear scan over every
    /// vertex; callers throttle this to ~10 Hz.
    pub fn nearest_vertex(&self, query: Vec3) -> Option<SnapResult> {
        let mut best: Option<SnapResult> = None;
        for position in &self.positions {
            let distance = position.distance(query);
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(SnapResult {
                    point: *position,
                    distance,
                });
            }
        }
        best
    }

    /// Nearest intersection of a ray with the baked triangles.
    pub fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let mut best: Option<f32> = None;
        for [a, b, c] in &self.triangles {
            let (a, b, c) = (
                self.positions[*a as usize],
                self.positions[*b as usize],
                self.positions[*c as usize],
            );
            if let Some(t) = ray_triangle_hit_t(origin, direction, a, b, c) {
                if best.is_none_or(|b| t < b) {
                    best = Some(t);
                }
            }
        }
        best.map(|t| RayHit {
            point: origin + direction * t,
            distance: t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> (Vec<[f32; 3]>, Vec<u32>) {
        (
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn queries_degrade_to_no_result_before_the_model_loads() {
        let geometry = FlattenedGeometry::default();
        assert!(geometry.nearest_vertex(Vec3::ZERO).is_none());
        assert!(geometry.raycast(Vec3::Y, Vec3::NEG_Y).is_none());
    }

    #[test]
    fn nearest_vertex_scans_across_all_baked_meshes() {
        let mut geometry = FlattenedGeometry::default();
        let (positions, indices) = unit_quad();
        geometry.push_positions(&positions, Some(&indices), &GlobalTransform::IDENTITY);
        geometry.push_positions(
            &positions,
            Some(&indices),
            &GlobalTransform::from(Transform::from_xyz(10.0, 0.0, 0.0)),
        );

        let snap = geometry.nearest_vertex(Vec3::new(10.9, 0.0, 0.05)).unwrap();
        assert_eq!(snap.point, Vec3::new(11.0, 0.0, 0.0));
        assert!(snap.distance < 0.2);
    }

    #[test]
    fn baking_applies_the_world_transform_once() {
        let mut geometry = FlattenedGeometry::default();
        let (positions, indices) = unit_quad();
        let lifted = GlobalTransform::from(Transform::from_xyz(0.0, 2.0, 0.0));
        let (min, max) = geometry
            .push_positions(&positions, Some(&indices), &lifted)
            .unwrap();

        assert_eq!(min.y, 2.0);
        assert_eq!(max.y, 2.0);

        let hit = geometry.raycast(Vec3::new(0.5, 5.0, 0.5), Vec3::NEG_Y).unwrap();
        assert!((hit.point.y - 2.0).abs() < 1e-5);
        assert!((hit.distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn raycast_returns_the_nearest_surface() {
        let mut geometry = FlattenedGeometry::default();
        let (positions, indices) = unit_quad();
        // Two stacked floors; the ray from above must hit the upper one.
        geometry.push_positions(&positions, Some(&indices), &GlobalTransform::IDENTITY);
        geometry.push_positions(
            &positions,
            Some(&indices),
            &GlobalTransform::from(Transform::from_xyz(0.0, 1.5, 0.0)),
        );

        let hit = geometry.raycast(Vec3::new(0.5, 5.0, 0.5), Vec3::NEG_Y).unwrap();
        assert!((hit.point.y - 1.5).abs() < 1e-5);
    }
}
