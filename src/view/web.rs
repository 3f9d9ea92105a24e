//! Browser side of the view: the name form and the audio gate.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use anyhow::Context as _;
use wasm_bindgen::{JsCast, closure::Closure};

use crate::{
    audio::{
        AudioGate,
        web::{HtmlAudio, PointerListener, install},
    },
    config::Config,
    resources::texture::format_url,
};

pub const INPUT_ID: &str = "name-input";
pub const SUBMIT_ID: &str = "name-submit";

/// Texts submitted through the form, drained by the view every frame.
pub type Inbox = Rc<RefCell<VecDeque<String>>>;

/// Keeps the submit button's click listener alive.
pub struct NameForm {
    _click: Closure<dyn FnMut(web_sys::Event)>,
}

impl std::fmt::Debug for NameForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NameForm")
    }
}

/// Bind `#name-input` and `#name-submit`. A click moves the input's text
/// into `inbox` and clears the input.
pub fn bind_form(inbox: Inbox) -> anyhow::Result<NameForm> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .context("no browser document")?;
    let input = document
        .get_element_by_id(INPUT_ID)
        .with_context(|| format!("no #{INPUT_ID} element"))?
        .dyn_into::<web_sys::HtmlInputElement>()
        .map_err(|_| anyhow::anyhow!("#{INPUT_ID} is not an <input>"))?;
    let button = document
        .get_element_by_id(SUBMIT_ID)
        .with_context(|| format!("no #{SUBMIT_ID} element"))?;

    let click = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
        let text = input.value();
        if text.is_empty() {
            return;
        }
        input.set_value("");
        inbox.borrow_mut().push_back(text);
    });
    button
        .add_event_listener_with_callback("click", click.as_ref().unchecked_ref())
        .map_err(|e| anyhow::anyhow!("cannot listen for clicks on #{SUBMIT_ID}: {e:?}"))?;

    Ok(NameForm { _click: click })
}

/// Create the background track once and arm the document-wide gate for it.
pub fn arm_audio(config: &Config) -> Option<PointerListener> {
    let playback = match format_url(&config.assets.audio) {
        Ok(url) => match HtmlAudio::new(url.as_str()) {
            Ok(audio) => Some(audio),
            Err(e) => {
                log::error!("cannot create the background audio: {e}");
                None
            }
        },
        Err(e) => {
            log::error!("cannot resolve {}: {e:#}", config.assets.audio);
            None
        }
    };

    match install(AudioGate::new(playback, config.scene.audio_volume)) {
        Ok(listener) => Some(listener),
        Err(e) => {
            log::error!("cannot arm the audio gate: {e}");
            None
        }
    }
}
