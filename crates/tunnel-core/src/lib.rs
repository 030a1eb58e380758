pub mod camera;
pub mod color;
pub mod constants;
pub mod engine;
pub mod frame;
pub mod geometry;
pub mod material;
pub mod params;
pub mod rings;
pub mod shapes;
pub mod tweak;

pub use camera::*;
pub use color::*;
pub use constants::*;
pub use engine::*;
pub use frame::*;
pub use geometry::*;
pub use material::*;
pub use params::*;
pub use rings::*;
pub use shapes::*;
pub use tweak::*;

// Shaders bundled as string constants
pub static TUNNEL_WGSL: &str = include_str!("../shaders/tunnel.wgsl");
