//! The name form.
//!
//! [`ViewFlow`] fetches the stored names once at startup into the shared
//! [`NameBoard`], turns submissions into local appends plus a remote insert,
//! and arms the audio gate. In the browser the form is the page's
//! `#name-input`/`#name-submit` pair; natively keystrokes edit the pending text
//! and the window title shows it.

use instant::Duration;
use winit::event::WindowEvent;
#[cfg(not(target_arch = "wasm32"))]
use winit::{
    event::{ElementState, KeyEvent},
    keyboard::{Key, NamedKey},
};

#[cfg(not(target_arch = "wasm32"))]
use crate::audio::{AudioGate, Silent};
use crate::{
    app::{AppModel, Event},
    config::Config,
    context::Context,
    flow::{GraphicsFlow, Out},
    names::NameStore,
    render::Render,
};

pub mod board;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use board::NameBoard;

pub struct ViewFlow {
    store: Box<dyn NameStore>,
    #[cfg(not(target_arch = "wasm32"))]
    gate: AudioGate<Silent>,
    #[cfg(target_arch = "wasm32")]
    inbox: web::Inbox,
    #[cfg(target_arch = "wasm32")]
    _form: Option<web::NameForm>,
    #[cfg(target_arch = "wasm32")]
    _audio: Option<crate::audio::web::PointerListener>,
}

impl ViewFlow {
    pub fn new(store: Box<dyn NameStore>, config: &Config) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            let inbox = web::Inbox::default();
            let form = web::bind_form(inbox.clone())
                .map_err(|e| log::error!("the name form is unavailable: {e:#}"))
                .ok();
            Self {
                store,
                inbox,
                _form: form,
                _audio: web::arm_audio(config),
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Self {
                store,
                gate: AudioGate::new(Some(Silent), config.scene.audio_volume),
            }
        }
    }

    /// Submit the pending text. Returns the remote insert to run, if any.
    ///
    /// Natively the insert is driven with `block_on` on the event-loop thread,
    /// so a slow store stalls the window for up to the client timeout.
    pub(crate) fn submit(&self, board: &mut NameBoard) -> Option<Box<dyn Future<Output = Event>>> {
        let name = board.submit()?;
        log::info!("added {name:?}, {} name(s) known", board.names().len());
        let insert = self.store.add_name(name);
        Some(Box::new(async move { Event::NameStored(insert.await) }))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn on_key(&self, ctx: &Context, board: &mut NameBoard, key: &KeyEvent) -> Out<AppModel, Event> {
        let out = match &key.logical_key {
            Key::Named(NamedKey::Enter) => match self.submit(board) {
                Some(insert) => Out::FutEvent(vec![insert]),
                None => Out::Empty,
            },
            Key::Named(NamedKey::Backspace) => {
                board.pop_char();
                Out::Empty
            }
            _ => {
                if let Some(text) = &key.text {
                    let typed: String = text.chars().filter(|c| !c.is_control()).collect();
                    board.push_str(&typed);
                }
                Out::Empty
            }
        };
        ctx.set_title(&window_title(board.pending()));
        out
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn window_title(pending: &str) -> String {
    if pending.is_empty() {
        "name-tree: type a name, Enter adds it".to_string()
    } else {
        format!("name-tree: {pending}")
    }
}

impl GraphicsFlow<AppModel, Event> for ViewFlow {
    fn on_init(&mut self, _ctx: &mut Context, _state: &mut AppModel) -> Out<AppModel, Event> {
        #[cfg(not(target_arch = "wasm32"))]
        _ctx.set_title(&window_title(_state.board.pending()));

        let fetch = self.store.list_names();
        Out::mutate(async move {
            let fetched = fetch.await;
            Box::new(move |state: &mut AppModel| state.board.apply_loaded(fetched))
                as Box<dyn FnOnce(&mut AppModel)>
        })
    }

    #[cfg_attr(not(target_arch = "wasm32"), allow(unused_variables))]
    fn on_update(&mut self, _ctx: &Context, state: &mut AppModel, _dt: Duration) -> Out<AppModel, Event> {
        #[cfg(target_arch = "wasm32")]
        {
            let submitted: Vec<String> = self.inbox.borrow_mut().drain(..).collect();
            let inserts: Vec<_> = submitted
                .into_iter()
                .filter_map(|text| {
                    state.board.set_pending(text);
                    self.submit(&mut state.board)
                })
                .collect();
            if !inserts.is_empty() {
                return Out::FutEvent(inserts);
            }
        }
        Out::Empty
    }

    #[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
    fn on_window_events(
        &mut self,
        ctx: &Context,
        state: &mut AppModel,
        event: &WindowEvent,
    ) -> Out<AppModel, Event> {
        match event {
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => {
                self.gate.on_pointer_down();
            }
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::KeyboardInput { event: key, .. } if key.state == ElementState::Pressed => {
                return self.on_key(ctx, &mut state.board, key);
            }
            _ => {}
        }
        Out::Empty
    }

    fn on_custom_events(&mut self, _ctx: &Context, _state: &mut AppModel, event: Event) -> Option<Event> {
        match event {
            Event::NameStored(Ok(())) => {
                log::debug!("name stored");
                None
            }
            Event::NameStored(Err(e)) => {
                log::error!("could not store the name: {e}");
                None
            }
            other => Some(other),
        }
    }

    fn on_render(&self) -> Render<'_> {
        Render::None
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use futures::executor::block_on;

    use super::*;
    use crate::names::{Name, StoreError, StoreFuture};

    #[derive(Clone, Default)]
    struct CountingStore {
        adds: Rc<Cell<u32>>,
        failing: bool,
    }

    impl NameStore for CountingStore {
        fn list_names(&self) -> StoreFuture<Vec<Name>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn add_name(&self, _name: Name) -> StoreFuture<()> {
            self.adds.set(self.adds.get() + 1);
            let failing = self.failing;
            Box::pin(async move {
                if failing {
                    Err(StoreError::NotConfigured)
                } else {
                    Ok(())
                }
            })
        }
    }

    fn view(store: &CountingStore) -> ViewFlow {
        ViewFlow::new(Box::new(store.clone()), &Config::default())
    }

    fn run_insert(insert: Box<dyn Future<Output = Event>>) -> Result<(), StoreError> {
        match block_on(Box::into_pin(insert)) {
            Event::NameStored(result) => result,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn empty_submit_makes_no_remote_call() {
        let store = CountingStore::default();
        let view = view(&store);
        let mut board = NameBoard::default();

        assert!(view.submit(&mut board).is_none());

        assert_eq!(store.adds.get(), 0);
        assert!(board.names().is_empty());
    }

    #[test]
    fn submit_appends_once_and_inserts_once() {
        let store = CountingStore::default();
        let view = view(&store);
        let mut board = NameBoard::default();
        board.set_pending("Ana");

        let insert = view.submit(&mut board).expect("an insert for a non-empty name");

        assert_eq!(store.adds.get(), 1);
        assert_eq!(board.names(), &[Name::from("Ana")]);
        assert!(run_insert(insert).is_ok());
    }

    #[test]
    fn failed_insert_keeps_the_local_name() {
        let store = CountingStore {
            failing: true,
            ..CountingStore::default()
        };
        let view = view(&store);
        let mut board = NameBoard::default();

        for text in ["Luz", "Pedro"] {
            board.set_pending(text);
            let insert = view.submit(&mut board).expect("an insert for a non-empty name");
            assert!(run_insert(insert).is_err());
        }

        assert_eq!(store.adds.get(), 2);
        assert_eq!(board.names(), &[Name::from("Luz"), Name::from("Pedro")]);
    }
}
