pub mod animation;
pub mod canvas;
pub mod config;
pub mod frame;
pub mod palette;
pub mod renderer;
