//! The 3D scene: a model decorated with one label per name, turning slowly.
//!
//! [`SceneFlow`] drives the lifecycle. The first run starts once the name list
//! has loaded; pressing F5 disposes the running session and starts a new one
//! with the names known at that moment. Each run loads the model on its own
//! and places labels when the load resolves; a load that resolves after its
//! run ended is dropped.

use instant::Duration;
use winit::{
    event::{ElementState, WindowEvent},
    keyboard::{Key, NamedKey},
};

use crate::{
    app::{AppModel, Event},
    config::Config,
    context::Context,
    data_structures::texture::srgb8_to_linear,
    flow::{GraphicsFlow, Out},
    names::Name,
    render::Render,
    resources::{LoadedModel, load_model_gltf},
};

pub mod group;
pub mod labels;
pub mod mount;
pub mod renderer;
pub mod session;

pub use labels::{LabelPainter, LabelPlacement, RandomSource};
pub use mount::{Mount, SessionId};
pub use renderer::SceneRenderer;
pub use session::SceneSession;

/// A session and the GPU resources it draws with.
#[derive(Debug)]
pub struct RunningScene {
    pub session: SceneSession,
    pub renderer: SceneRenderer,
}

#[derive(Debug, Default)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Running(Box<RunningScene>),
    Disposed,
}

impl Lifecycle {
    pub fn session(&self) -> Option<&SceneSession> {
        match self {
            Lifecycle::Running(running) => Some(&running.session),
            Lifecycle::Uninitialized | Lifecycle::Disposed => None,
        }
    }

    /// Only the running session accepts its own model load; anything that
    /// resolves after its run ended is dropped.
    pub fn accepts(&self, id: SessionId, mount: &Mount) -> bool {
        self.session()
            .is_some_and(|session| session.accepts_load(id, mount))
    }
}

#[derive(Debug)]
pub struct SceneFlow {
    config: Config,
    mount: Mount,
    lifecycle: Lifecycle,
    last_session: SessionId,
    rng: fastrand::Rng,
    painter: LabelPainter,
    restart_requested: bool,
}

impl SceneFlow {
    pub async fn new(config: Config) -> Self {
        let painter = LabelPainter::load(&config.assets.font, config.label.clone()).await;
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            config,
            mount: Mount::new(),
            lifecycle: Lifecycle::Uninitialized,
            last_session: SessionId::new(0),
            rng,
            painter,
            restart_requested: false,
        }
    }

    fn start_run(&mut self, ctx: &Context, names: &[Name]) -> Out<AppModel, Event> {
        self.dispose_current();

        let id = self.last_session.next();
        self.last_session = id;
        let session = SceneSession::start(
            id,
            &mut self.mount,
            names,
            ctx.size(),
            &self.config.scene,
            &self.config.label,
        );
        let renderer = SceneRenderer::new(
            &ctx.device,
            ctx.config.format,
            &session,
            self.config.label.sprite_size,
        );
        self.lifecycle = Lifecycle::Running(Box::new(RunningScene { session, renderer }));

        let device = ctx.device.clone();
        let queue = ctx.queue.clone();
        let file_name = self.config.assets.model.clone();
        Out::event(async move {
            let result = load_model_gltf(&file_name, &device, &queue).await;
            Event::SceneLoaded {
                session: id,
                result: result.map(Box::new),
            }
        })
    }

    fn dispose_current(&mut self) {
        if let Lifecycle::Running(running) = std::mem::replace(&mut self.lifecycle, Lifecycle::Disposed) {
            let RunningScene { session, renderer } = *running;
            drop(renderer);
            session.dispose(&mut self.mount);
        }
    }

    fn finish_load(
        &mut self,
        ctx: &Context,
        session: SessionId,
        result: anyhow::Result<Box<LoadedModel>>,
    ) {
        if !self.lifecycle.accepts(session, &self.mount) {
            log::info!("discarding the model loaded for {session}: it is no longer running");
            return;
        }
        let Lifecycle::Running(running) = &mut self.lifecycle else {
            return;
        };

        let loaded = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                log::error!("{} failed to load: {e:#}", self.config.assets.model);
                return;
            }
        };
        let LoadedModel { model, bounds } = *loaded;

        let placements = running.session.on_model_loaded(&bounds, &mut self.rng);
        let canvases: Vec<_> = placements
            .iter()
            .map(|placement| self.painter.paint(&placement.name))
            .collect();
        running
            .renderer
            .set_model(&ctx.device, model, &running.session);
        running
            .renderer
            .set_labels(&ctx.device, &ctx.queue, &canvases, &running.session);
    }
}

impl GraphicsFlow<AppModel, Event> for SceneFlow {
    fn on_init(&mut self, ctx: &mut Context, _state: &mut AppModel) -> Out<AppModel, Event> {
        let [r, g, b] = self.config.scene.background;
        ctx.clear_colour = wgpu::Color {
            r: srgb8_to_linear(r),
            g: srgb8_to_linear(g),
            b: srgb8_to_linear(b),
            a: 1.0,
        };
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, state: &mut AppModel, _dt: Duration) -> Out<AppModel, Event> {
        let should_start = match self.lifecycle {
            Lifecycle::Uninitialized => state.board.is_loaded(),
            Lifecycle::Running(_) | Lifecycle::Disposed => self.restart_requested,
        };
        if should_start {
            self.restart_requested = false;
            return self.start_run(ctx, state.board.names());
        }

        if let Lifecycle::Running(running) = &mut self.lifecycle {
            running.session.frame();
            running.renderer.update(&ctx.queue, &running.session);
        }
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _ctx: &Context,
        _state: &mut AppModel,
        event: &WindowEvent,
    ) -> Out<AppModel, Event> {
        match event {
            WindowEvent::KeyboardInput { event: key, .. }
                if key.state == ElementState::Pressed
                    && !key.repeat
                    && key.logical_key == Key::Named(NamedKey::F5) =>
            {
                log::info!("rebuilding the scene");
                self.restart_requested = true;
            }
            WindowEvent::CloseRequested => self.dispose_current(),
            _ => {
                if let Lifecycle::Running(running) = &mut self.lifecycle {
                    running.session.handle_window_event(event);
                }
            }
        }
        Out::Empty
    }

    fn on_custom_events(&mut self, ctx: &Context, _state: &mut AppModel, event: Event) -> Option<Event> {
        match event {
            Event::SceneLoaded { session, result } => {
                self.finish_load(ctx, session, result);
                None
            }
            other => Some(other),
        }
    }

    fn on_render(&self) -> Render<'_> {
        match &self.lifecycle {
            Lifecycle::Running(running) => {
                Render::custom(move |_, pass| running.renderer.draw(pass))
            }
            Lifecycle::Uninitialized | Lifecycle::Disposed => Render::None,
        }
    }
}
