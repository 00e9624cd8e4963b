//! WebGPU rendering module
//!
//! The scene is tessellated on the CPU into a single vertex-coloured triangle
//! list and drawn with one pipeline.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use scene::{WorldView, build_scene};
pub use vertex::{Palette, Vertex};
