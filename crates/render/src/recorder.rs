//! Headless backend that records draw calls instead of touching a GPU.
//!
//! Useful for CLI output, logging, and testing the overlay without a device.

use crate::backend::{DebugBackend, DebugProgram, LineUniforms};
use crate::error::DebugError;
use crate::geometry::{Geometry, IconVertex, LineVertex};
use crate::icons::IconImage;
use glam::Mat4;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordedMesh(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordedTexture(u32);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshInfo {
    pub label: String,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// One recorded backend command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCall {
    UseProgram {
        program: DebugProgram,
    },
    Lines {
        mesh: String,
        color_mode: u32,
        index_count: u32,
        mvp: Mat4,
    },
    Icon {
        mesh: String,
        texture: String,
        mvp: Mat4,
    },
    Joints {
        mesh: String,
        index_count: u32,
        view_projection: Mat4,
        joint_models: Vec<f32>,
    },
}

impl DrawCall {
    pub fn is_draw(&self) -> bool {
        !matches!(self, Self::UseProgram { .. })
    }
}

impl std::fmt::Display for DrawCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UseProgram { program } => write!(f, "program {program:?}"),
            Self::Lines {
                mesh,
                color_mode,
                index_count,
                mvp,
            } => {
                let o = mvp.w_axis;
                write!(
                    f,
                    "  lines {mesh:<8} color={color_mode} indices={index_count} origin=({:.2}, {:.2}, {:.2}, {:.2})",
                    o.x, o.y, o.z, o.w
                )
            }
            Self::Icon { mesh, texture, mvp } => {
                let o = mvp.w_axis;
                write!(
                    f,
                    "  icon  {mesh:<8} texture={texture} clip=({:.2}, {:.2}, {:.2}, {:.2})",
                    o.x, o.y, o.z, o.w
                )
            }
            Self::Joints {
                mesh,
                index_count,
                joint_models,
                ..
            } => write!(
                f,
                "  joints {mesh} joints={} indices={index_count}",
                joint_models.len() / 16
            ),
        }
    }
}

/// Records every call made through [`DebugBackend`].
#[derive(Debug, Default)]
pub struct FrameRecorder {
    meshes: Vec<Option<MeshInfo>>,
    textures: Vec<String>,
    palette: Option<[[f32; 3]; 4]>,
    calls: Vec<DrawCall>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Drain the calls recorded since the last take.
    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Draw calls, excluding program switches.
    pub fn draw_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_draw()).count()
    }

    pub fn mesh(&self, mesh: RecordedMesh) -> Option<&MeshInfo> {
        self.meshes.get(mesh.0 as usize).and_then(Option::as_ref)
    }

    pub fn live_mesh_count(&self) -> usize {
        self.meshes.iter().filter(|m| m.is_some()).count()
    }

    pub fn texture_labels(&self) -> &[String] {
        &self.textures
    }

    pub fn palette(&self) -> Option<&[[f32; 3]; 4]> {
        self.palette.as_ref()
    }

    fn register(&mut self, label: &str, vertex_count: usize, index_count: usize) -> RecordedMesh {
        let id = RecordedMesh(self.meshes.len() as u32);
        self.meshes.push(Some(MeshInfo {
            label: label.to_string(),
            vertex_count: vertex_count as u32,
            index_count: index_count as u32,
        }));
        id
    }

    fn label(&self, mesh: &RecordedMesh) -> String {
        self.mesh(*mesh)
            .map(|m| m.label.clone())
            .unwrap_or_else(|| format!("released#{}", mesh.0))
    }
}

impl DebugBackend for FrameRecorder {
    type Mesh = RecordedMesh;
    type Texture = RecordedTexture;

    fn create_line_mesh(&mut self, label: &str, geometry: &Geometry<LineVertex>) -> RecordedMesh {
        self.register(label, geometry.vertices.len(), geometry.indices.len())
    }

    fn create_icon_mesh(&mut self, label: &str, geometry: &Geometry<IconVertex>) -> RecordedMesh {
        self.register(label, geometry.vertices.len(), geometry.indices.len())
    }

    fn create_joint_mesh(&mut self, label: &str, joint_count: u32, indices: &[u32]) -> RecordedMesh {
        self.register(label, joint_count as usize, indices.len())
    }

    fn release_mesh(&mut self, mesh: RecordedMesh) {
        if let Some(slot) = self.meshes.get_mut(mesh.0 as usize) {
            *slot = None;
        }
    }

    fn create_texture(
        &mut self,
        label: &str,
        _image: &IconImage,
    ) -> Result<RecordedTexture, DebugError> {
        let id = RecordedTexture(self.textures.len() as u32);
        self.textures.push(label.to_string());
        Ok(id)
    }

    fn set_palette(&mut self, palette: &[[f32; 3]; 4]) {
        self.palette = Some(*palette);
    }

    fn use_program(&mut self, program: DebugProgram) {
        self.calls.push(DrawCall::UseProgram { program });
    }

    fn draw_lines(&mut self, mesh: &RecordedMesh, uniforms: LineUniforms, index_count: u32) {
        let mesh = self.label(mesh);
        self.calls.push(DrawCall::Lines {
            mesh,
            color_mode: uniforms.color_mode.index(),
            index_count,
            mvp: uniforms.mvp,
        });
    }

    fn draw_icon(&mut self, mesh: &RecordedMesh, texture: &RecordedTexture, mvp: Mat4) {
        let mesh = self.label(mesh);
        let texture = self
            .textures
            .get(texture.0 as usize)
            .cloned()
            .unwrap_or_default();
        self.calls.push(DrawCall::Icon { mesh, texture, mvp });
    }

    fn draw_joints(
        &mut self,
        mesh: &RecordedMesh,
        view_projection: Mat4,
        joint_models: &[f32],
        index_count: u32,
    ) {
        let mesh = self.label(mesh);
        self.calls.push(DrawCall::Joints {
            mesh,
            index_count,
            view_projection,
            joint_models: joint_models.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ColorMode;
    use crate::geometry::unit_cube;

    #[test]
    fn records_meshes_and_draws() {
        let mut rec = FrameRecorder::new();
        let cube = rec.create_line_mesh("cube", &unit_cube());
        assert_eq!(rec.mesh(cube).unwrap().index_count, 24);

        rec.use_program(DebugProgram::Lines);
        rec.draw_lines(
            &cube,
            LineUniforms {
                mvp: Mat4::IDENTITY,
                color_mode: ColorMode::Green,
            },
            24,
        );
        assert_eq!(rec.calls().len(), 2);
        assert_eq!(rec.draw_count(), 1);
        assert!(matches!(
            &rec.calls()[1],
            DrawCall::Lines { mesh, color_mode: 2, index_count: 24, .. } if mesh == "cube"
        ));

        let taken = rec.take_calls();
        assert_eq!(taken.len(), 2);
        assert!(rec.calls().is_empty());
    }

    #[test]
    fn released_meshes_are_not_live() {
        let mut rec = FrameRecorder::new();
        let a = rec.create_joint_mesh("a", 3, &[0, 1, 1, 2]);
        let b = rec.create_joint_mesh("b", 2, &[0, 1]);
        rec.release_mesh(a);
        assert_eq!(rec.live_mesh_count(), 1);
        assert!(rec.mesh(a).is_none());
        assert_eq!(rec.mesh(b).unwrap().vertex_count, 2);
    }

    #[test]
    fn display_is_one_line_per_call() {
        let call = DrawCall::Joints {
            mesh: "joints_x".into(),
            index_count: 4,
            view_projection: Mat4::IDENTITY,
            joint_models: vec![0.0; 48],
        };
        assert_eq!(call.to_string(), "  joints joints_x joints=3 indices=4");
    }
}
