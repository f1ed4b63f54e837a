use nalgebra::{Point3, Vector3};

/// A light infinitely far away (the moon). Rays are parallel.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels, not necessarily normalized.
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

/// An omnidirectional light with distance attenuation.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub position: Point3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

/// A cone light. Cutoff angles are in degrees; programs receive their cosines.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    pub position: Point3<f32>,
    pub direction: Vector3<f32>,
    pub cut_off: f32,
    pub outer_cut_off: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

/// Every light in the scene. Programs pick the subset they consume.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    pub directional: Option<DirectionalLight>,
    /// The two table lamps. At most two are ever bound.
    pub points: Vec<PointLight>,
    pub spot: Option<SpotLight>,
}

/// Material and geometry at a shaded fragment.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint {
    pub position: Point3<f32>,
    /// Unit surface normal.
    pub normal: Vector3<f32>,
    /// Unit vector from the fragment towards the eye.
    pub view_dir: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,
}

/// `1 / (c + l*d + q*d^2)`
#[inline]
pub fn attenuation(constant: f32, linear: f32, quadratic: f32, distance: f32) -> f32 {
    1.0 / (constant + linear * distance + quadratic * distance * distance)
}

/// Soft cone edge: 1 inside the inner cone, 0 outside the outer one.
#[inline]
pub fn spot_intensity(theta: f32, cos_inner: f32, cos_outer: f32) -> f32 {
    let epsilon = cos_inner - cos_outer;
    if epsilon.abs() < f32::EPSILON {
        return if theta >= cos_inner { 1.0 } else { 0.0 };
    }
    ((theta - cos_outer) / epsilon).clamp(0.0, 1.0)
}

/// Ambient, diffuse and specular Phong terms for a unit `light_dir` pointing
/// from the fragment to the light. Returned separately so callers can scale
/// them.
fn phong_terms(
    light_dir: Vector3<f32>,
    ambient: &Vector3<f32>,
    diffuse: &Vector3<f32>,
    specular: &Vector3<f32>,
    s: &SurfacePoint,
) -> [Vector3<f32>; 3] {
    let diff = s.normal.dot(&light_dir).max(0.0);
    let reflect_dir = reflect(-light_dir, s.normal);
    let spec = s.view_dir.dot(&reflect_dir).max(0.0).powf(s.shininess);

    [
        ambient.component_mul(&s.diffuse),
        diffuse.component_mul(&s.diffuse) * diff,
        specular.component_mul(&s.specular) * spec,
    ]
}

#[inline]
fn reflect(incident: Vector3<f32>, normal: Vector3<f32>) -> Vector3<f32> {
    incident - normal * 2.0 * normal.dot(&incident)
}

impl DirectionalLight {
    /// Unit direction from any surface towards the light.
    pub fn direction_to_light(&self) -> Vector3<f32> {
        (-self.direction).normalize()
    }

    pub fn shade(&self, s: &SurfacePoint) -> Vector3<f32> {
        let [a, d, sp] = phong_terms(
            self.direction_to_light(),
            &self.ambient,
            &self.diffuse,
            &self.specular,
            s,
        );
        a + d + sp
    }
}

impl PointLight {
    pub fn shade(&self, s: &SurfacePoint) -> Vector3<f32> {
        let to_light = self.position - s.position;
        let distance = to_light.norm();
        let light_dir = to_light / distance.max(f32::EPSILON);
        let att = attenuation(self.constant, self.linear, self.quadratic, distance);

        let [a, d, sp] = phong_terms(light_dir, &self.ambient, &self.diffuse, &self.specular, s);
        (a + d + sp) * att
    }
}

impl SpotLight {
    /// `(cos(cut_off), cos(outer_cut_off))`, angles taken in degrees.
    pub fn cutoff_cosines(&self) -> (f32, f32) {
        (
            self.cut_off.to_radians().cos(),
            self.outer_cut_off.to_radians().cos(),
        )
    }

    /// Shades with cutoff cosines that have already been uploaded to a program.
    pub fn shade_with_cutoffs(&self, s: &SurfacePoint, cos_inner: f32, cos_outer: f32) -> Vector3<f32> {
        let to_light = self.position - s.position;
        let distance = to_light.norm();
        let light_dir = to_light / distance.max(f32::EPSILON);
        let att = attenuation(self.constant, self.linear, self.quadratic, distance);

        let theta = light_dir.dot(&(-self.direction).normalize());
        let intensity = spot_intensity(theta, cos_inner, cos_outer);

        let [a, d, sp] = phong_terms(light_dir, &self.ambient, &self.diffuse, &self.specular, s);
        (a + d + sp) * att * intensity
    }
}

impl Default for LightRig {
    /// Moonlight, two table lamps and the ceiling spot.
    fn default() -> Self {
        let lamp = |x: f32| PointLight {
            position: Point3::new(x, 0.882, -3.268),
            ambient: Vector3::repeat(0.6),
            diffuse: Vector3::repeat(0.6),
            specular: Vector3::repeat(0.4),
            constant: 1.0,
            linear: 1.0,
            quadratic: 1.0,
        };

        Self {
            directional: Some(DirectionalLight {
                direction: Vector3::new(-3.75, 3.35, -30.95),
                ambient: Vector3::repeat(0.1),
                diffuse: Vector3::repeat(0.6),
                specular: Vector3::repeat(0.5),
            }),
            points: vec![lamp(0.984), lamp(-0.984)],
            spot: Some(SpotLight {
                position: Point3::new(-0.76, 2.379, 0.95),
                direction: Vector3::new(0.0, -1.0, 0.0),
                cut_off: 70.0,
                outer_cut_off: 110.0,
                constant: 1.0,
                linear: 1.0,
                quadratic: 1.0,
                ambient: Vector3::repeat(1.0),
                diffuse: Vector3::repeat(0.8),
                specular: Vector3::repeat(0.6),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn surface_at(position: Point3<f32>) -> SurfacePoint {
        SurfacePoint {
            position,
            normal: Vector3::y(),
            view_dir: Vector3::y(),
            diffuse: Vector3::repeat(1.0),
            specular: Vector3::repeat(1.0),
            shininess: 32.0,
        }
    }

    #[test]
    fn attenuation_follows_quadratic_falloff() {
        assert_relative_eq!(attenuation(1.0, 1.0, 1.0, 0.0), 1.0);
        assert_relative_eq!(attenuation(1.0, 1.0, 1.0, 2.0), 1.0 / 7.0);
    }

    #[test]
    fn spot_intensity_is_clamped() {
        assert_eq!(spot_intensity(1.0, 0.9, 0.8), 1.0);
        assert_eq!(spot_intensity(0.5, 0.9, 0.8), 0.0);
        assert_relative_eq!(spot_intensity(0.85, 0.9, 0.8), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn default_spot_cutoffs() {
        let rig = LightRig::default();
        let spot = rig.spot.as_ref().unwrap();
        let (inner, outer) = spot.cutoff_cosines();
        assert_relative_eq!(inner, 0.342_020_14, epsilon = 1e-6);
        assert_relative_eq!(outer, -0.342_020_14, epsilon = 1e-6);
    }

    #[test]
    fn point_light_fades_with_distance() {
        let rig = LightRig::default();
        let lamp = &rig.points[0];
        let near = lamp.shade(&surface_at(lamp.position + Vector3::new(0.0, -0.1, 0.0)));
        let far = lamp.shade(&surface_at(lamp.position + Vector3::new(0.0, -3.0, 0.0)));
        assert!(near.x > far.x);
    }

    #[test]
    fn directional_light_ignores_position() {
        let moon = LightRig::default().directional.unwrap();
        let a = moon.shade(&surface_at(Point3::origin()));
        let b = moon.shade(&surface_at(Point3::new(20.0, 0.0, -20.0)));
        assert_relative_eq!(a, b);
    }

    #[test]
    fn spot_light_is_dark_behind_the_outer_cone() {
        let spot = SpotLight {
            outer_cut_off: 30.0,
            cut_off: 20.0,
            ..LightRig::default().spot.unwrap()
        };
        let (inner, outer) = spot.cutoff_cosines();
        let beside = Point3::new(spot.position.x + 5.0, spot.position.y, spot.position.z);
        let lit = spot.shade_with_cutoffs(&surface_at(beside), inner, outer);
        assert_relative_eq!(lit, Vector3::zeros());
    }
}
