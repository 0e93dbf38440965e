//! Debug overlay core: renderer-agnostic visualization of live scene state.
//!
//! # Invariants
//! - The overlay reads the component store; it never writes to it.
//! - Static geometry is built once; only per-draw transforms change per frame.
//! - Drawing appends to the current frame and never clears the target.
//!
//! GPU work goes through the [`DebugBackend`] trait. [`FrameRecorder`]
//! implements it headlessly; the wgpu implementation lives in
//! `debugview-render-wgpu`.

mod backend;
mod config;
mod error;
pub mod geometry;
mod icons;
mod recorder;
pub mod skeleton;
mod system;
pub mod transforms;
mod visibility;

pub use backend::{ColorMode, DebugBackend, DebugProgram, LineUniforms};
pub use config::{DEFAULT_PALETTE, DebugConfig, GridConfig, IconConfig};
pub use error::{ConfigError, DebugError, IconError};
pub use geometry::{Geometry, IconVertex, LineVertex};
pub use icons::{IconImage, IconKind};
pub use recorder::{DrawCall, FrameRecorder, MeshInfo, RecordedMesh, RecordedTexture};
pub use skeleton::{SkeletonCache, SkeletonEntry, SyncReport};
pub use system::{DebugSystem, FrameStats};
pub use visibility::{DebugCategory, Visibility};

pub fn crate_info() -> &'static str {
    "debugview-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
