//! Wiring: the shared model, the custom events and the two flows.

use std::fmt;

use crate::{
    config::Config,
    flow::{self, FlowConstructor, GraphicsFlow},
    names::{NameStore, RemoteNameStore, StoreError},
    resources::LoadedModel,
    scene::{SceneFlow, SessionId},
    view::{NameBoard, ViewFlow},
};

/// State shared by the view and the scene.
#[derive(Debug, Default)]
pub struct AppModel {
    pub board: NameBoard,
}

/// Results of asynchronous work, delivered back to the flows.
pub enum Event {
    NameStored(Result<(), StoreError>),
    SceneLoaded {
        session: SessionId,
        result: anyhow::Result<Box<LoadedModel>>,
    },
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameStored(result) => f.debug_tuple("NameStored").field(result).finish(),
            Self::SceneLoaded { session, result } => f
                .debug_struct("SceneLoaded")
                .field("session", session)
                .field("loaded", &result.is_ok())
                .finish(),
        }
    }
}

/// Start the application with configuration from the environment.
pub fn run() -> anyhow::Result<()> {
    flow::init_logging();
    let config = Config::from_env();
    log::info!("starting with {:?}", config.assets);

    let store: Box<dyn NameStore> = Box::new(RemoteNameStore::new(&config.store)?);
    let view_config = config.clone();
    let view: FlowConstructor<AppModel, Event> = Box::new(move || {
        Box::pin(async move {
            Box::new(ViewFlow::new(store, &view_config)) as Box<dyn GraphicsFlow<_, _>>
        })
    });
    let scene: FlowConstructor<AppModel, Event> = Box::new(move || {
        Box::pin(async move { Box::new(SceneFlow::new(config).await) as Box<dyn GraphicsFlow<_, _>> })
    });
    flow::run(vec![view, scene])
}
