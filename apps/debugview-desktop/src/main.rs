use anyhow::{Context, Result};
use clap::Parser;
use debugview_common::EntityId;
use debugview_ecs::sample::{SampleScene, pose_arm, sample_scene, spawn_arm};
use debugview_render::{DebugCategory, DebugConfig, DebugSystem, FrameStats};
use debugview_render_wgpu::{
    DEPTH_FORMAT, FlyCamera, WgpuDebugBackend, clear_frame, create_depth_view,
};
use egui::Context as EguiContext;
use glam::Vec3;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.15,
    a: 1.0,
};

#[derive(Parser)]
#[command(name = "debugview-desktop", about = "Debug overlay viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Overlay config (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Overlay controls bound to keys.
enum OverlayKey {
    Master,
    Toggle(DebugCategory),
}

fn overlay_key(key: KeyCode) -> Option<OverlayKey> {
    let category = match key {
        KeyCode::F2 => return Some(OverlayKey::Master),
        KeyCode::Digit1 => DebugCategory::Grid,
        KeyCode::Digit2 => DebugCategory::Frusta,
        KeyCode::Digit3 => DebugCategory::Colliders,
        KeyCode::Digit4 => DebugCategory::Icons,
        KeyCode::Digit5 => DebugCategory::Joints,
        _ => return None,
    };
    Some(OverlayKey::Toggle(category))
}

/// Scene and viewer state, independent of the GPU.
struct AppState {
    scene: SampleScene,
    camera: FlyCamera,
    show_panel: bool,
    animate: bool,
    time: f32,
    stats: FrameStats,
    keys_held: HashSet<KeyCode>,
    mouse_captured: bool,
    last_frame: Instant,
}

impl AppState {
    fn new() -> Self {
        let scene = sample_scene(16.0 / 9.0);
        let camera = scene
            .store
            .transform(scene.main_camera)
            .map(|t| FlyCamera::from_pose(t.position, t.rotation))
            .unwrap_or_default();
        Self {
            scene,
            camera,
            show_panel: true,
            animate: true,
            time: 0.0,
            stats: FrameStats::default(),
            keys_held: HashSet::new(),
            mouse_captured: false,
            last_frame: Instant::now(),
        }
    }

    fn update(&mut self, dt: f32) {
        let held = |key: KeyCode| self.keys_held.contains(&key);
        let axis = |pos: KeyCode, neg: KeyCode| held(pos) as i32 as f32 - held(neg) as i32 as f32;
        let direction = Vec3::new(
            axis(KeyCode::KeyD, KeyCode::KeyA),
            axis(KeyCode::Space, KeyCode::ControlLeft),
            axis(KeyCode::KeyW, KeyCode::KeyS),
        );
        let speed_mult = if held(KeyCode::ShiftLeft) { 3.0 } else { 1.0 };
        if direction != Vec3::ZERO {
            self.camera.translate(direction, dt * speed_mult);
        }
        self.camera
            .apply(&mut self.scene.store, self.scene.main_camera);

        if self.animate {
            self.time += dt;
            for arm in &self.scene.arms {
                pose_arm(&mut self.scene.store, *arm, self.time);
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }
        if pressed && key == KeyCode::F1 {
            self.show_panel = !self.show_panel;
        }
    }

    fn add_arm(&mut self) {
        let ahead = self.camera.position + self.camera.forward() * 6.0;
        let segments = 2 + self.scene.arms.len() % 4;
        let id = spawn_arm(
            &mut self.scene.store,
            Vec3::new(ahead.x, 0.0, ahead.z),
            segments,
        );
        self.scene.arms.push(id);
        tracing::info!(entity = %id.short(), segments, "spawned arm");
    }

    fn remove_arm(&mut self) -> Option<EntityId> {
        let id = self.scene.arms.pop()?;
        self.scene.store.remove_entity(id);
        tracing::info!(entity = %id.short(), "removed arm");
        Some(id)
    }

    fn draw_ui(&mut self, ctx: &EguiContext, debug: &mut DebugSystem<WgpuDebugBackend>) {
        if !self.show_panel {
            return;
        }

        egui::SidePanel::left("overlay")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Debug Overlay");
                ui.separator();

                let mut active = debug.is_active();
                if ui.checkbox(&mut active, "Overlay (F2)").changed() {
                    debug.set_active(active);
                }
                ui.add_enabled_ui(active, |ui| {
                    for (i, category) in DebugCategory::ALL.into_iter().enumerate() {
                        let mut visible = debug.is_visible(category);
                        let label = format!(
                            "{} ({})  {} draws",
                            category,
                            i + 1,
                            self.stats.count(category)
                        );
                        if ui.checkbox(&mut visible, label).changed() {
                            debug.set_visible(category, visible);
                        }
                    }
                });
                ui.label(format!("Total draws: {}", self.stats.total()));
                ui.label(format!("Skeletons cached: {}", debug.skeleton_cache_len()));
                ui.separator();

                ui.heading("Scene");
                let store = &self.scene.store;
                ui.label(format!(
                    "Entities: {}  Cameras: {}  Lights: {}",
                    store.entity_count(),
                    store.cameras().len(),
                    store.lights().len()
                ));
                ui.label(format!(
                    "Colliders: {}  Skinned meshes: {}",
                    store.colliders().len(),
                    store.skinned_meshes().len()
                ));
                ui.label(format!(
                    "Camera: ({:.1}, {:.1}, {:.1})",
                    self.camera.position.x, self.camera.position.y, self.camera.position.z
                ));
                ui.checkbox(&mut self.animate, "Animate skeletons");
                ui.horizontal(|ui| {
                    if ui.button("Add arm").clicked() {
                        self.add_arm();
                    }
                    if ui.button("Remove arm").clicked() {
                        self.remove_arm();
                    }
                });

                ui.separator();
                ui.small("F1: Panel | F2: Overlay | 1-5: Categories | RMB: Look | WASD: Move");
            });
    }
}

/// Everything created once the window exists.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    debug: DebugSystem<WgpuDebugBackend>,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: AppState,
    overlay_config: DebugConfig,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(overlay_config: DebugConfig) -> Self {
        Self {
            state: AppState::new(),
            overlay_config,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let attrs = Window::default_attributes()
            .with_title("Debug Overlay Viewer")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("debugview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        self.state.camera.aspect = config.width as f32 / config.height as f32;
        self.state
            .camera
            .apply(&mut self.state.scene.store, self.state.scene.main_camera);

        let depth_view = create_depth_view(&device, config.width, config.height);

        let backend = WgpuDebugBackend::new(
            device.clone(),
            queue.clone(),
            surface_format,
            Some(DEPTH_FORMAT),
        );
        let mut debug = DebugSystem::initialize(backend, self.overlay_config.clone());
        debug.late_initialize(&self.state.scene.store)?;

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            depth_view,
            debug,
            egui_winit,
            egui_renderer,
        })
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.last_frame = now;
        self.state.update(dt);

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.state.stats = gpu.debug.update(dt, &self.state.scene.store);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        clear_frame(&mut encoder, &view, &gpu.depth_view, BACKGROUND);
        gpu.debug
            .backend_mut()
            .encode(&mut encoder, &view, Some(&gpu.depth_view));

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let state = &mut self.state;
        let debug = &mut gpu.debug;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx, debug);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    gpu.depth_view =
                        create_depth_view(&gpu.device, gpu.config.width, gpu.config.height);
                    self.state.camera.aspect = gpu.config.width as f32 / gpu.config.height as f32;
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                self.state.handle_key(key, pressed);
                if !pressed || repeat {
                    return;
                }
                let Some(gpu) = &mut self.gpu else {
                    return;
                };
                match overlay_key(key) {
                    Some(OverlayKey::Master) => {
                        let active = !gpu.debug.is_active();
                        gpu.debug.set_active(active);
                    }
                    Some(OverlayKey::Toggle(category)) => {
                        let visible = gpu.debug.toggle(category);
                        tracing::debug!(%category, visible, "toggled overlay category");
                    }
                    None => {}
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.state.mouse_captured = btn_state == ElementState::Pressed;
                if let Some(gpu) = &self.gpu {
                    gpu.window.set_cursor_visible(!self.state.mouse_captured);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.mouse_captured {
                self.state.camera.rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let overlay_config = match &cli.config {
        Some(path) => {
            DebugConfig::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => DebugConfig::default(),
    };

    tracing::info!("debugview-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(overlay_config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
