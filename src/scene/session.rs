//! One lifecycle run of the scene, without any GPU state.
//!
//! A session is created by [`SceneSession::start`] and consumed by
//! [`SceneSession::dispose`]. Everything it owns (camera, controls, the
//! rotating group) lives exactly as long as the run.

use cgmath::{Deg, Point3, Rad};
use winit::event::WindowEvent;

use crate::{
    camera::{CameraUniform, OrbitControls, Projection},
    config::{LabelStyle, SceneSettings},
    data_structures::bounds::Aabb,
    names::Name,
    pipelines::light::LightUniform,
    scene::{
        group::SceneGroup,
        labels::{LabelPlacement, RandomSource, plan_labels},
        mount::{Mount, SessionId},
    },
};

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

#[derive(Debug)]
pub struct SceneSession {
    id: SessionId,
    /// Names as they were when the run started; later submissions wait for the next run.
    names: Vec<Name>,
    settings: SceneSettings,
    label_style: LabelStyle,
    group: SceneGroup,
    controls: OrbitControls,
    projection: Projection,
    viewport: (u32, u32),
}

impl SceneSession {
    /// Clear `mount`, attach a new session to it and set up camera, controls
    /// and an empty group. Loading the model is up to the caller.
    pub fn start(
        id: SessionId,
        mount: &mut Mount,
        names: &[Name],
        viewport: (u32, u32),
        settings: &SceneSettings,
        label_style: &LabelStyle,
    ) -> Self {
        let stale = mount.clear();
        if !stale.is_empty() {
            log::info!("detached {} stale session(s) before starting {id}", stale.len());
        }
        mount.attach(id);

        let [x, y, z] = settings.eye;
        let controls = OrbitControls::new(
            Point3::new(x, y, z),
            Point3::new(0.0, 0.0, 0.0),
            settings.damping_factor,
        );
        let projection = Projection::new(
            viewport.0,
            viewport.1,
            Deg(settings.fov_y_degrees),
            settings.z_near,
            settings.z_far,
        );
        log::info!("{id} started with {} name(s)", names.len());

        Self {
            id,
            names: names.to_vec(),
            settings: settings.clone(),
            label_style: label_style.clone(),
            group: SceneGroup::default(),
            controls,
            projection,
            viewport,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn names(&self) -> &[Name] {
        &self.names
    }

    pub fn group(&self) -> &SceneGroup {
        &self.group
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Whether a model load started by run `id` may still land in this session.
    pub fn accepts_load(&self, id: SessionId, mount: &Mount) -> bool {
        self.id == id && mount.is_attached(id)
    }

    /// Fit the model to the target height with its base on the origin, aim the
    /// controls at its mid-height and place one label per captured name.
    pub fn on_model_loaded(
        &mut self,
        bounds: &Aabb,
        rng: &mut dyn RandomSource,
    ) -> &[LabelPlacement] {
        let height = self.settings.target_height;
        self.group.set_model(bounds.fit_to_height(height));
        self.controls.set_target(Point3::new(0.0, height / 2.0, 0.0));
        self.controls.update();

        let labels = plan_labels(&self.names, &self.label_style, height, rng);
        log::info!("{}: model ready, {} label(s)", self.id, labels.len());
        self.group.set_labels(labels);
        self.group.labels()
    }

    /// Advance one displayed frame.
    pub fn frame(&mut self) {
        self.group.rotate(Rad(self.settings.rotation_per_frame));
        self.controls.update();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.projection.resize(width, height);
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            _ => self.controls.handle_window_event(event, self.viewport.1),
        }
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&self.controls, &self.projection);
        uniform
    }

    pub fn light_uniform(&self) -> LightUniform {
        LightUniform::new(
            self.settings.light_position,
            WHITE,
            self.settings.light_intensity,
            WHITE,
            self.settings.ambient_intensity,
        )
    }

    /// End the run and detach everything from `mount`.
    pub fn dispose(self, mount: &mut Mount) {
        let detached = mount.clear();
        log::info!(
            "{} disposed, {} child(ren) detached from the mount",
            self.id,
            detached.len()
        );
    }
}
