pub mod assets;
pub mod camera;
pub mod core;
pub mod errors;
pub mod loading;
pub mod map;
