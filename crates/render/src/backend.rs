use crate::error::DebugError;
use crate::geometry::{Geometry, IconVertex, LineVertex};
use crate::icons::IconImage;
use glam::Mat4;
use serde::{Deserialize, Serialize};

/// The three shader programs the overlay switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebugProgram {
    Lines,
    Icons,
    Joints,
}

/// Palette override for a line draw. `Vertex` keeps each vertex's own colour index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ColorMode {
    Vertex = 0,
    Red = 1,
    Green = 2,
    Blue = 3,
}

impl ColorMode {
    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Per-draw inputs of the line program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineUniforms {
    pub mvp: Mat4,
    pub color_mode: ColorMode,
}

/// Rendering collaborator. The debug system creates all static resources
/// through it once, then issues draws every frame.
///
/// Draw calls are only valid after `use_program` selected the matching
/// program. Implementations never clear the target; overlay draws are
/// appended to whatever the frame already contains.
pub trait DebugBackend {
    type Mesh;
    type Texture;

    fn create_line_mesh(&mut self, label: &str, geometry: &Geometry<LineVertex>) -> Self::Mesh;

    fn create_icon_mesh(&mut self, label: &str, geometry: &Geometry<IconVertex>) -> Self::Mesh;

    /// Joint meshes hold `joint_count` origin vertices; real joint positions
    /// arrive per draw as model matrices indexed by vertex.
    fn create_joint_mesh(&mut self, label: &str, joint_count: u32, indices: &[u32]) -> Self::Mesh;

    fn release_mesh(&mut self, mesh: Self::Mesh);

    fn create_texture(&mut self, label: &str, image: &IconImage)
    -> Result<Self::Texture, DebugError>;

    /// Upload the four-entry line palette.
    fn set_palette(&mut self, palette: &[[f32; 3]; 4]);

    fn use_program(&mut self, program: DebugProgram);

    fn draw_lines(&mut self, mesh: &Self::Mesh, uniforms: LineUniforms, index_count: u32);

    fn draw_icon(&mut self, mesh: &Self::Mesh, texture: &Self::Texture, mvp: Mat4);

    /// `joint_models` holds 16 column-major floats per joint, at `16 * joint.index`.
    fn draw_joints(
        &mut self,
        mesh: &Self::Mesh,
        view_projection: Mat4,
        joint_models: &[f32],
        index_count: u32,
    );
}
