//! WebGPU rendering module
//!
//! The scene is assembled and projected on the CPU (`scene`), then drawn as
//! one alpha-blended triangle list (`pipeline`).

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use scene::Camera;
pub use vertex::Vertex;
