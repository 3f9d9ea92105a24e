//! Axis-aligned bounding volumes and fitting a model to a target height.

use cgmath::{Point3, Vector3};

use crate::data_structures::instance::Instance;

/// The minimal axis-aligned box enclosing a set of points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut aabb = Aabb {
            min: first,
            max: first,
        };
        for point in points {
            aabb.extend(point);
        }
        Some(aabb)
    }

    pub fn extend(&mut self, p: Point3<f32>) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    pub fn union(self, other: Aabb) -> Aabb {
        let mut merged = self;
        merged.extend(other.min);
        merged.extend(other.max);
        merged
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// The transform that scales the box uniformly to `target_height` and moves it
    /// so it is centered on the Y axis with its base at `y = 0`.
    ///
    /// A flat box (zero height) cannot be scaled to a height; it keeps scale 1
    /// and is only recentered.
    pub fn fit_to_height(&self, target_height: f32) -> Instance {
        let height = self.size().y;
        let scale = if height > f32::EPSILON {
            target_height / height
        } else {
            log::warn!("model has no height; keeping its original scale");
            1.0
        };
        let center = self.center();
        Instance {
            position: Vector3::new(-center.x * scale, -self.min.y * scale, -center.z * scale),
            scale: Vector3::new(scale, scale, scale),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    fn unit_box_at(offset: Vector3<f32>, height: f32) -> Aabb {
        Aabb::from_points([
            Point3::new(-1.0, 0.0, -1.0) + offset,
            Point3::new(1.0, height, 1.0) + offset,
        ])
        .unwrap()
    }

    #[test]
    fn no_points_no_box() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn fitted_box_has_target_height_and_base_on_origin() {
        let aabb = unit_box_at(Vector3::new(10.0, -3.0, 5.0), 8.0);
        let fit = aabb.fit_to_height(4.0);

        let lo = fit.transform_point(Vector3::new(aabb.min.x, aabb.min.y, aabb.min.z));
        let hi = fit.transform_point(Vector3::new(aabb.max.x, aabb.max.y, aabb.max.z));

        assert!((fit.scale.x - 0.5).abs() < 1e-6);
        assert!(lo.y.abs() < 1e-5);
        assert!((hi.y - 4.0).abs() < 1e-5);
        // Centered on the Y axis
        assert!(((lo + hi) * 0.5 - Vector3::new(0.0, 2.0, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn flat_box_keeps_scale() {
        let aabb = unit_box_at(Vector3::new(0.0, 2.0, 0.0), 0.0);
        let fit = aabb.fit_to_height(4.0);
        assert_eq!(fit.scale, Vector3::new(1.0, 1.0, 1.0));
        assert!((fit.position.y + 2.0).abs() < 1e-6);
    }

    #[test]
    fn union_covers_both() {
        let a = unit_box_at(Vector3::new(0.0, 0.0, 0.0), 1.0);
        let b = unit_box_at(Vector3::new(5.0, 5.0, 5.0), 1.0);
        let both = a.union(b);
        assert_eq!(both.min, a.min);
        assert_eq!(both.max, b.max);
    }
}
