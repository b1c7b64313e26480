use bevy::prelude::*;

use super::pick_layers::PickLayers;

/// A ray intersection, nearest-first ordering key included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
}

/// Slab-method ray-AABB intersection, returns the entry parameter or None.
pub fn ray_aabb_hit_t(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = Vec3::new(
        if direction.x != 0.0 { 1.0 / direction.x } else { f32::INFINITY },
        if direction.y != 0.0 { 1.0 / direction.y } else { f32::INFINITY },
        if direction.z != 0.0 { 1.0 / direction.z } else { f32::INFINITY },
    );

    let (mut tmin, mut tmax) = ((min.x - origin.x) * inv.x, (max.x - origin.x) * inv.x);
    if tmin > tmax {
        std::mem::swap(&mut tmin, &mut tmax);
    }

    let (mut tymin, mut tymax) = ((min.y - origin.y) * inv.y, (max.y - origin.y) * inv.y);
    if tymin > tymax {
        std::mem::swap(&mut tymin, &mut tymax);
    }

    if tmin > tymax || tymin > tmax {
        return None;
    }
    tmin = tmin.max(tymin);
    tmax = tmax.min(tymax);

    let (mut tzmin, mut tzmax) = ((min.z - origin.z) * inv.z, (max.z - origin.z) * inv.z);
    if tzmin > tzmax {
        std::mem::swap(&mut tzmin, &mut tzmax);
    }

    if tmin > tzmax || tzmin > tmax {
        return None;
    }
    tmin = tmin.max(tzmin);
    tmax = tmax.min(tzmax);

    if tmax < 0.0 {
        return None;
    }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

/// Moeller-Trumbore ray-triangle intersection, front and back faces alike.
pub fn ray_triangle_hit_t(origin: Vec3, direction: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let ab = b - a;
    let ac = c - a;
    let p = direction.cross(ac);
    let det = ab.dot(p);
    if det.abs() < EPSILON {
        return None; // Ray parallel to the triangle plane.
    }

    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(ab);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = ac.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

/// Ray-sphere intersection, returns the nearest positive parameter.
pub fn ray_sphere_hit_t(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let proj = to_center.dot(direction);
    let closest_sq = to_center.length_squared() - proj * proj;
    let radius_sq = radius * radius;
    if closest_sq > radius_sq {
        return None;
    }

    let half_chord = (radius_sq - closest_sq).sqrt();
    let t = proj - half_chord;
    if t > 0.0 {
        Some(t)
    } else {
        let t = proj + half_chord;
        (t > 0.0).then_some(t)
    }
}

/// Raycastable shape of a pickable entity, in local space.
#[derive(Debug, Clone)]
pub enum PickShape {
    Sphere(f32),
    Triangles(Vec<[Vec3; 3]>),
}

/// Pick geometry carried by an entity: a category mask plus an explicit
/// local-space shape. Raycasts call [`Pickable::hit_test`] directly instead
/// of relying on any scene-graph dispatch.
#[derive(Component, Debug, Clone)]
pub struct Pickable {
    pub layers: PickLayers,
    pub shape: PickShape,
}

impl Pickable {
    pub fn sphere(radius: f32, layers: PickLayers) -> Self {
        Self {
            layers,
            shape: PickShape::Sphere(radius),
        }
    }

    pub fn triangles(triangles: Vec<[Vec3; 3]>, layers: PickLayers) -> Self {
        Self {
            layers,
            shape: PickShape::Triangles(triangles),
        }
    }

    /// Nearest intersection of a world-space ray with this shape under the
    /// given transform, if any.
    pub fn hit_test(&self, origin: Vec3, direction: Vec3, transform: &GlobalTransform) -> Option<RayHit> {
        match &self.shape {
            PickShape::Sphere(radius) => {
                let center = transform.translation();
                ray_sphere_hit_t(origin, direction, center, *radius).map(|t| RayHit {
                    point: origin + direction * t,
                    distance: t,
                })
            }
            PickShape::Triangles(triangles) => {
                let mut best: Option<f32> = None;
                for [a, b, c] in triangles {
                    let (a, b, c) = (
                        transform.transform_point(*a),
                        transform.transform_point(*b),
                        transform.transform_point(*c),
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
    }
}

/// A pickable hit with its owning entity.
#[derive(Debug, Clone, Copy)]
pub struct PickHit {
    pub entity: Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Raycast a set of pickable entities restricted to a layer mask, returning
/// hits sorted nearest-first. Pure query, no side effects.
pub fn raycast_pickables<'a>(
    origin: Vec3,
    direction: Vec3,
    items: impl IntoIterator<Item = (Entity, &'a GlobalTransform, &'a Pickable)>,
    mask: PickLayers,
) -> Vec<PickHit> {
    let mut hits: Vec<PickHit> = items
        .into_iter()
        .filter(|(_, _, pickable)| pickable.layers.intersects(mask))
        .filter_map(|(entity, transform, pickable)| {
            pickable.hit_test(origin, direction, transform).map(|hit| PickHit {
                entity,
                point: hit.point,
                distance: hit.distance,
            })
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Builds a world-space ray from the pointer position through the camera.
pub fn pointer_ray(
    camera: &Camera,
    camera_transform: &GlobalTransform,
    cursor_position: Vec2,
) -> Option<Ray3d> {
    camera.viewport_to_world(camera_transform, cursor_position).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray() -> (Vec3, Vec3) {
        (Vec3::new(0.5, 5.0, 0.5), Vec3::NEG_Y)
    }

    #[test]
    fn aabb_slab_hits_and_misses() {
        let (origin, dir) = down_ray();
        let t = ray_aabb_hit_t(origin, dir, Vec3::ZERO, Vec3::ONE).unwrap();
        assert!((t - 4.0).abs() < 1e-5);

        assert!(ray_aabb_hit_t(Vec3::new(3.0, 5.0, 0.5), dir, Vec3::ZERO, Vec3::ONE).is_none());
        // Box entirely behind the origin.
        assert!(ray_aabb_hit_t(Vec3::new(0.5, -2.0, 0.5), dir, Vec3::ZERO, Vec3::ONE).is_none());
    }

    #[test]
    fn triangle_hit_inside_and_miss_outside() {
        let (a, b, c) = (Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));

        let t = ray_triangle_hit_t(Vec3::new(0.25, 2.0, 0.25), Vec3::NEG_Y, a, b, c).unwrap();
        assert!((t - 2.0).abs() < 1e-5);

        assert!(ray_triangle_hit_t(Vec3::new(0.9, 2.0, 0.9), Vec3::NEG_Y, a, b, c).is_none());
    }

    #[test]
    fn sphere_hit_from_outside() {
        let t = ray_sphere_hit_t(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, Vec3::ZERO, 1.0).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert!(ray_sphere_hit_t(Vec3::new(3.0, 0.0, -5.0), Vec3::Z, Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn pickable_hits_come_back_nearest_first_and_masked() {
        let near = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, 2.0));
        let far = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, 6.0));
        let near_sphere = Pickable::sphere(0.5, PickLayers::OUTLINE_VERTICES);
        let far_sphere = Pickable::sphere(0.5, PickLayers::ROOM_VOLUMES);

        let items = [
            (Entity::from_raw(1), &far, &far_sphere),
            (Entity::from_raw(2), &near, &near_sphere),
        ];

        let all = raycast_pickables(Vec3::ZERO, Vec3::Z, items, PickLayers::ALL);
        assert_eq!(all.len(), 2);
        assert!(all[0].distance < all[1].distance);
        assert_eq!(all[0].entity, Entity::from_raw(2));

        let rooms_only = raycast_pickables(Vec3::ZERO, Vec3::Z, items, PickLayers::ROOM_VOLUMES);
        assert_eq!(rooms_only.len(), 1);
        assert_eq!(rooms_only[0].entity, Entity::from_raw(1));
    }

    #[test]
    fn triangle_pickable_respects_its_transform() {
        let pickable = Pickable::triangles(
            vec![[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)]],
            PickLayers::ROOM_VOLUMES,
        );
        let lifted = GlobalTransform::from(Transform::from_xyz(0.0, 3.0, 0.0));

        let hit = pickable
            .hit_test(Vec3::new(0.2, 10.0, 0.2), Vec3::NEG_Y, &lifted)
            .unwrap();
        assert!((hit.point.y - 3.0).abs() < 1e-5);
    }
}
