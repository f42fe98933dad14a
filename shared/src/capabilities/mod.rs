//! Effects the core asks the shell to perform.
//!
//! Render and Http come straight from Crux; Delay is our own timer
//! capability used by the preview fade cycle.

mod delay;
mod http;

pub use self::delay::{Delay, DelayOperation};
pub use self::http::{gists_url, page_result, FetchError, GISTS_PATH, GITHUB_ACCEPT};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub delay: Delay<Event>,
}
