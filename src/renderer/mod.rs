//! Rendering module
//!
//! Flat-shaded silhouettes painted back to front (painter's algorithm).
//! `draw` is platform independent; `canvas` paints onto a 2D canvas.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod draw;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;
pub use draw::{DrawCmd, Shape, draw_list};
