use cgmath::{Rad, Vector3};

use crate::{
    data_structures::instance::Instance,
    scene::labels::LabelPlacement,
};

/// The model and its labels, rotating together about the Y axis.
#[derive(Clone, Debug)]
pub struct SceneGroup {
    rotation: Rad<f32>,
    /// Fit of the loaded model inside the group; `None` until it loads.
    model: Option<Instance>,
    labels: Vec<LabelPlacement>,
}

impl Default for SceneGroup {
    fn default() -> Self {
        Self {
            rotation: Rad(0.0),
            model: None,
            labels: Vec::new(),
        }
    }
}

impl SceneGroup {
    pub fn rotate(&mut self, delta: Rad<f32>) {
        self.rotation += delta;
    }

    pub fn rotation(&self) -> Rad<f32> {
        self.rotation
    }

    pub fn transform(&self) -> Instance {
        Instance::yaw(self.rotation)
    }

    pub fn set_model(&mut self, fit: Instance) {
        self.model = Some(fit);
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// World transform of the model.
    pub fn model_transform(&self) -> Option<Instance> {
        self.model.as_ref().map(|fit| &self.transform() * fit)
    }

    pub fn set_labels(&mut self, labels: Vec<LabelPlacement>) {
        self.labels = labels;
    }

    pub fn labels(&self) -> &[LabelPlacement] {
        &self.labels
    }

    /// World positions of the label centers, in label order.
    pub fn label_centers(&self) -> Vec<Vector3<f32>> {
        let transform = self.transform();
        self.labels
            .iter()
            .map(|label| transform.transform_point(label.position))
            .collect()
    }

    /// Number of objects in the group: the model (if loaded) and every label.
    pub fn child_count(&self) -> usize {
        usize::from(self.model.is_some()) + self.labels.len()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use cgmath::InnerSpace;

    use super::*;
    use crate::names::Name;

    #[test]
    fn labels_turn_with_the_group() {
        let mut group = SceneGroup::default();
        group.set_labels(vec![LabelPlacement {
            name: Name::from("Ana"),
            position: Vector3::new(1.0, 2.0, 0.0),
        }]);
        group.rotate(Rad(FRAC_PI_2));
        let center = group.label_centers()[0];
        // A quarter turn about +Y takes +X to -Z
        assert!((center - Vector3::new(0.0, 2.0, -1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn model_fit_is_applied_inside_the_rotation() {
        let mut group = SceneGroup::default();
        assert_eq!(group.model_transform(), None);
        group.set_model(Instance {
            position: Vector3::new(0.0, 1.0, 0.0),
            scale: Vector3::new(2.0, 2.0, 2.0),
            ..Default::default()
        });
        group.rotate(Rad(0.5));
        let world = group.model_transform().unwrap();
        assert!((world.position - Vector3::new(0.0, 1.0, 0.0)).magnitude() < 1e-5);
        assert_eq!(world.scale, Vector3::new(2.0, 2.0, 2.0));
        assert_eq!(group.child_count(), 1);
    }
}
