//! King of the Hill game mode with a dedicated simulation host
//!
//! The mode itself lives in [`game`]; [`session`], [`http`] and [`app`]
//! make up the host binary that runs a simulated lobby and serves its
//! standings.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod net;
pub mod session;
pub mod util;
