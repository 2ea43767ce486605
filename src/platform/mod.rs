//! Platform bindings
//!
//! The browser layer mounts a game on a canvas and drives it with
//! `requestAnimationFrame`. Native builds have no display; see `run_headless`.

#[cfg(target_arch = "wasm32")]
pub mod web;
