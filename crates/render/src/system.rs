//! Per-frame debug overlay orchestration.
//!
//! # Invariants
//! - The system never mutates the component store; it receives it by shared
//!   reference every frame.
//! - Draw order is fixed: line program (grid, frusta, colliders), icon
//!   program (lights, then cameras), joint program.
//! - Nothing is drawn while the master switch is off.
//! - Static GPU resources are created once in `late_initialize`; per-frame
//!   resource creation is limited to skeleton cache reconciliation.

use crate::backend::{ColorMode, DebugBackend, DebugProgram, LineUniforms};
use crate::config::DebugConfig;
use crate::error::DebugError;
use crate::geometry;
use crate::icons::{IconImage, IconKind};
use crate::skeleton::{SkeletonCache, joint_world_matrices};
use crate::transforms::{billboard, collider_matrix, frustum_matrix};
use crate::visibility::{DebugCategory, Visibility};
use debugview_ecs::{Collider, ComponentStore};
use serde::Serialize;

/// A static mesh plus the number of indices drawn from it.
struct StaticMesh<M> {
    mesh: M,
    index_count: u32,
}

/// Everything built in `late_initialize`.
struct Resources<B: DebugBackend> {
    grid: StaticMesh<B::Mesh>,
    cube: StaticMesh<B::Mesh>,
    ray: StaticMesh<B::Mesh>,
    quad: B::Mesh,
    light_icon: B::Texture,
    camera_icon: B::Texture,
}

/// Draw calls issued by one `update`, per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub grid: usize,
    pub frusta: usize,
    pub colliders: usize,
    pub icons: usize,
    pub joints: usize,
}

impl FrameStats {
    pub fn count(&self, category: DebugCategory) -> usize {
        match category {
            DebugCategory::Grid => self.grid,
            DebugCategory::Frusta => self.frusta,
            DebugCategory::Colliders => self.colliders,
            DebugCategory::Icons => self.icons,
            DebugCategory::Joints => self.joints,
        }
    }

    pub fn total(&self) -> usize {
        DebugCategory::ALL.into_iter().map(|c| self.count(c)).sum()
    }
}

/// The debug visualization engine.
///
/// Lifecycle: [`DebugSystem::initialize`] with a backend, then
/// [`DebugSystem::late_initialize`] once the scene is loaded, then
/// [`DebugSystem::update`] once per frame during the render phase.
pub struct DebugSystem<B: DebugBackend> {
    backend: B,
    config: DebugConfig,
    visibility: Visibility,
    resources: Option<Resources<B>>,
    skeletons: SkeletonCache<B::Mesh>,
    joint_scratch: Vec<f32>,
}

impl<B: DebugBackend> DebugSystem<B> {
    /// Store the backend and config. No resources are created yet and every
    /// category starts hidden.
    pub fn initialize(backend: B, config: DebugConfig) -> Self {
        Self {
            backend,
            config,
            visibility: Visibility::new(),
            resources: None,
            skeletons: SkeletonCache::new(),
            joint_scratch: Vec::new(),
        }
    }

    /// Build static geometry, upload the palette and icon textures, build the
    /// skeleton cache for the current skinned meshes, then apply
    /// `start_active`. Calling it again is a no-op.
    pub fn late_initialize(&mut self, store: &ComponentStore) -> Result<(), DebugError> {
        if self.resources.is_some() {
            tracing::debug!("debug system already initialized");
            return Ok(());
        }

        let grid = geometry::grid(self.config.grid.size, self.config.grid.divisions);
        let cube = geometry::unit_cube();
        let ray = geometry::unit_ray();
        let quad = geometry::billboard_quad();

        let light_image =
            IconImage::load_or_placeholder(self.config.icons.light.as_deref(), IconKind::Light);
        let camera_image =
            IconImage::load_or_placeholder(self.config.icons.camera.as_deref(), IconKind::Camera);
        let light_icon = self
            .backend
            .create_texture(IconKind::Light.label(), &light_image)?;
        let camera_icon = self
            .backend
            .create_texture(IconKind::Camera.label(), &camera_image)?;

        self.backend.set_palette(&self.config.palette);

        let resources = Resources {
            grid: StaticMesh {
                mesh: self.backend.create_line_mesh("grid", &grid),
                index_count: grid.index_count(),
            },
            cube: StaticMesh {
                mesh: self.backend.create_line_mesh("cube", &cube),
                index_count: cube.index_count(),
            },
            ray: StaticMesh {
                mesh: self.backend.create_line_mesh("ray", &ray),
                index_count: ray.index_count(),
            },
            quad: self.backend.create_icon_mesh("quad", &quad),
            light_icon,
            camera_icon,
        };
        self.resources = Some(resources);

        let report = self.skeletons.sync(&mut self.backend, store.skinned_meshes());
        self.set_active(self.config.start_active);

        tracing::info!(
            grid_vertices = grid.vertices.len(),
            skeletons = report.built,
            active = self.config.start_active,
            "debug overlay initialized"
        );
        Ok(())
    }

    /// Issue every enabled debug draw for the current frame.
    pub fn update(&mut self, _dt: f32, store: &ComponentStore) -> FrameStats {
        let mut stats = FrameStats::default();
        if !self.visibility.is_active() {
            return stats;
        }
        let Some(resources) = self.resources.as_ref() else {
            tracing::trace!("debug update before late initialization");
            return stats;
        };
        let (Some(main_id), Some(main)) = (store.main_camera_id(), store.main_camera()) else {
            tracing::warn!("no main camera, skipping debug overlay");
            return stats;
        };
        let view_projection = main.view_projection;
        let visibility = self.visibility;
        let backend = &mut self.backend;

        if visibility.draws_lines() {
            backend.use_program(DebugProgram::Lines);

            if visibility.draws(DebugCategory::Grid) {
                backend.draw_lines(
                    &resources.grid.mesh,
                    LineUniforms {
                        mvp: view_projection,
                        color_mode: ColorMode::Vertex,
                    },
                    resources.grid.index_count,
                );
                stats.grid += 1;
            }

            if visibility.draws(DebugCategory::Frusta) {
                for (_, camera) in store.cameras().iter().filter(|(id, _)| **id != main_id) {
                    backend.draw_lines(
                        &resources.cube.mesh,
                        LineUniforms {
                            mvp: frustum_matrix(view_projection, camera),
                            color_mode: ColorMode::Red,
                        },
                        resources.cube.index_count,
                    );
                    stats.frusta += 1;
                }
            }

            if visibility.draws(DebugCategory::Colliders) {
                for (id, collider) in store.colliders() {
                    let Some(global) = store.global_matrix(*id) else {
                        tracing::debug!(entity = %id, "collider without transform");
                        continue;
                    };
                    let (mesh, color_mode) = match collider {
                        Collider::Box { .. } => (&resources.cube, ColorMode::Green),
                        Collider::Ray { .. } => (&resources.ray, ColorMode::Blue),
                    };
                    backend.draw_lines(
                        &mesh.mesh,
                        LineUniforms {
                            mvp: view_projection * collider_matrix(global, collider),
                            color_mode,
                        },
                        mesh.index_count,
                    );
                    stats.colliders += 1;
                }
            }
        }

        if visibility.draws(DebugCategory::Icons) {
            backend.use_program(DebugProgram::Icons);
            let owners = store
                .lights()
                .keys()
                .map(|id| (*id, &resources.light_icon))
                .chain(store.cameras().keys().map(|id| (*id, &resources.camera_icon)));
            for (id, texture) in owners {
                let Some(global) = store.global_matrix(id) else {
                    tracing::debug!(entity = %id, "icon owner without transform");
                    continue;
                };
                backend.draw_icon(&resources.quad, texture, billboard(view_projection * global));
                stats.icons += 1;
            }
        }

        if visibility.draws(DebugCategory::Joints) {
            self.skeletons.sync(&mut *backend, store.skinned_meshes());
            backend.use_program(DebugProgram::Joints);
            for (id, mesh) in store.skinned_meshes() {
                let (Some(skeleton), Some(entry)) = (mesh.skeleton.as_ref(), self.skeletons.get(*id))
                else {
                    continue;
                };
                if entry.index_count == 0 {
                    continue;
                }
                joint_world_matrices(skeleton, &mut self.joint_scratch);
                backend.draw_joints(
                    &entry.mesh,
                    view_projection,
                    &self.joint_scratch,
                    entry.index_count,
                );
                stats.joints += 1;
            }
        }

        stats
    }

    /// Master switch. Forces every category to `active`.
    pub fn set_active(&mut self, active: bool) {
        self.visibility.set_active(active);
        tracing::debug!(active, "debug overlay master switch");
    }

    pub fn is_active(&self) -> bool {
        self.visibility.is_active()
    }

    pub fn set_visible(&mut self, category: DebugCategory, visible: bool) {
        self.visibility.set_visible(category, visible);
    }

    pub fn is_visible(&self, category: DebugCategory) -> bool {
        self.visibility.is_visible(category)
    }

    /// Flip one category, returning its new state.
    pub fn toggle(&mut self, category: DebugCategory) -> bool {
        self.visibility.toggle(category)
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn config(&self) -> &DebugConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    pub fn skeleton_cache_len(&self) -> usize {
        self.skeletons.len()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Release the skeleton cache and hand the backend back.
    pub fn into_backend(mut self) -> B {
        self.skeletons.clear(&mut self.backend);
        self.backend
    }
}
