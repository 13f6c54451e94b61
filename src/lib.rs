pub mod app;
pub mod assets;
pub mod body;
pub mod camera3d;
pub mod cli;
pub mod config;
pub mod ecs;
pub mod events;
pub mod flare;
pub mod info;
pub mod overlay;
pub mod state;
pub mod time;
pub mod timeline;

pub use app::{run, run_with_overrides, App};
