//! wgpu backend for the debug overlay.
//!
//! Implements `DebugBackend` with three pipelines (lines, icons, joints) and
//! replays each frame's overlay draws into a load-only pass.
//!
//! # Invariants
//! - The overlay pass never clears its attachments.
//! - Camera motion writes into the component store; the overlay only reads it.

mod camera;
mod gpu;
mod shaders;

pub use camera::FlyCamera;
pub use gpu::{
    DEPTH_FORMAT, MeshHandle, TextureHandle, WgpuDebugBackend, clear_frame, create_depth_view,
};
