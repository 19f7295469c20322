//! Companion client for a media-control server.
//!
//! Polls the server's `now-playing` endpoint, downloads cover art, and
//! composites it onto a handheld-style two-screen layout previewed in the
//! terminal. The render loop never blocks on the network: fetches run on
//! background tasks and are merged in when they complete.

pub mod client;
pub mod config;
pub mod display;
pub mod extract;
pub mod refresh;
pub mod renderer;
pub mod state;
