use bevy::prelude::*;

/// One inch in meters. The architectural model is exported from a CAD tool
/// that works in inches; all engine-side coordinates are meters.
pub const CAD_UNIT_SCALE: f32 = 0.0254;

/// Fixed translation aligning the CAD export with model space, applied after
/// scaling. Tuned against the surveyed building origin.
pub const MODEL_ALIGNMENT_OFFSET: [f32; 3] = [-90.0, 2.0, -20.0];

/// The CAD export is Z-up; model space is Y-up.
pub const MODEL_ALIGNMENT_ROTATION_X: f32 = -std::f32::consts::FRAC_PI_2;

/// Transform placing the raw architectural scene into model space:
/// inch-to-meter scale, Z-up to Y-up rotation, then the survey offset.
pub fn model_alignment_transform() -> Transform {
    Transform {
        translation: Vec3::from_array(MODEL_ALIGNMENT_OFFSET),
        rotation: Quat::from_rotation_x(MODEL_ALIGNMENT_ROTATION_X),
        scale: Vec3::splat(CAD_UNIT_SCALE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_scales_inches_to_meters() {
        let transform = model_alignment_transform();
        // A point one inch along the CAD X axis lands 0.0254 m from the
        // aligned origin.
        let origin = transform.transform_point(Vec3::ZERO);
        let one_inch = transform.transform_point(Vec3::X);
        assert!((one_inch.distance(origin) - CAD_UNIT_SCALE).abs() < 1e-6);
    }

    #[test]
    fn alignment_maps_cad_up_to_model_up() {
        let transform = model_alignment_transform();
        let origin = transform.transform_point(Vec3::ZERO);
        let up = transform.transform_point(Vec3::Z);
        let delta = up - origin;
        assert!(delta.y > 0.0);
        assert!(delta.x.abs() < 1e-6 && delta.z.abs() < 1e-6);
    }
}
