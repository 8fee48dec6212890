use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use paradise_core::{RasterDevice, RenderFrameStats, SceneDescription, SceneGraph, SceneRenderer};
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::controller::FirstPersonController;
use crate::input::InputState;
use crate::renderer::Renderer;
use crate::settings::{load_or_create_settings, ClientSettings};

const DEFAULT_SETTINGS_PATH: &str = "settings.toml";
const BUNDLED_SCENE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../assets/scenes/museum.toml"
));
const MAX_FRAME_DELTA_SECS: f32 = 0.1;
const STATS_LOG_INTERVAL_SECS: f32 = 5.0;

#[derive(Debug, Clone, PartialEq)]
struct LaunchOptions {
    scene: Option<PathBuf>,
    settings: PathBuf,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            scene: None,
            settings: PathBuf::from(DEFAULT_SETTINGS_PATH),
        }
    }
}

impl LaunchOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--scene" => match args.next() {
                    Some(path) => options.scene = Some(PathBuf::from(path)),
                    None => warn!("--scene expects a path; ignoring"),
                },
                "--settings" => match args.next() {
                    Some(path) => options.settings = PathBuf::from(path),
                    None => warn!("--settings expects a path; ignoring"),
                },
                other => warn!("Ignoring unknown argument {other:?}"),
            }
        }
        options
    }
}

/// Reads the scene at `path`, falling back to the bundled museum when it is
/// missing or malformed.
fn load_scene_description(path: Option<&Path>) -> Result<SceneDescription, toml::de::Error> {
    if let Some(path) = path {
        match SceneDescription::load(path) {
            Ok(description) => {
                info!("Loaded scene from {}", path.display());
                return Ok(description);
            }
            Err(err) => warn!(
                "Failed to load scene from {}: {err}; using bundled scene",
                path.display()
            ),
        }
    }
    SceneDescription::from_toml_str(BUNDLED_SCENE)
}

#[derive(Debug, Default)]
struct FrameCounter {
    elapsed: f32,
    frames: u32,
}

struct ClientApp {
    settings: ClientSettings,
    scene_path: Option<PathBuf>,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    scene: Option<SceneRenderer>,
    controller: FirstPersonController,
    input: InputState,
    cursor_grabbed: bool,
    last_frame: Option<Instant>,
    frame_counter: FrameCounter,
    last_stats: RenderFrameStats,
}

impl ClientApp {
    fn new(options: LaunchOptions) -> Self {
        let settings = load_or_create_settings(&options.settings);
        let scene_path = options.scene.or_else(|| settings.scene.clone());
        let controller = FirstPersonController::new(
            settings.move_speed,
            settings.turn_speed(),
            settings.pitch_limit.to_radians(),
        );

        Self {
            settings,
            scene_path,
            window: None,
            renderer: None,
            scene: None,
            controller,
            input: InputState::default(),
            cursor_grabbed: false,
            last_frame: None,
            frame_counter: FrameCounter::default(),
            last_stats: RenderFrameStats::default(),
        }
    }

    fn build_scene<D: RasterDevice>(
        &self,
        device: &mut D,
        aspect: f32,
    ) -> Result<SceneRenderer, String> {
        let description = load_scene_description(self.scene_path.as_deref())
            .map_err(|err| format!("bundled scene is malformed: {err}"))?;
        let (mut scene, _warnings) =
            SceneGraph::build(&description, aspect).map_err(|err| err.to_string())?;
        if let Some(fov) = self.settings.fov {
            scene.camera.set_fov_y(fov.to_radians());
        }

        let mut renderer = SceneRenderer::new(scene, device).map_err(|err| err.to_string())?;
        renderer.set_clear_color(self.settings.clear_color);
        Ok(renderer)
    }

    fn set_cursor_grab(&mut self, enabled: bool) {
        let Some(window) = self.window.as_ref() else {
            self.cursor_grabbed = false;
            return;
        };

        let grabbed = if enabled {
            window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
                .is_ok()
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            false
        };

        if enabled && !grabbed {
            warn!("Cursor grab is not supported on this platform");
        }
        window.set_cursor_visible(!grabbed);
        self.cursor_grabbed = grabbed;
        self.input.clear_frame();
    }

    fn update_and_render(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32())
            .min(MAX_FRAME_DELTA_SECS);
        self.last_frame = Some(now);

        let (Some(renderer), Some(scene)) = (self.renderer.as_mut(), self.scene.as_mut()) else {
            return;
        };

        self.controller
            .update(&mut scene.camera_mut().transform, &self.input, dt);
        self.input.clear_frame();

        renderer.begin_frame();
        match scene.render_frame(renderer) {
            Ok(stats) => {
                if stats.teleports > 0 {
                    debug!(
                        "Camera now at {}",
                        scene.scene().camera.transform.position
                    );
                }
                self.last_stats = stats;
            }
            Err(err) => {
                error!("Failed to record frame: {err}");
                event_loop.exit();
                return;
            }
        }

        match renderer.finish_frame() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                if let Some(window) = self.window.as_ref() {
                    let size = window.inner_size();
                    renderer.resize(size.width, size.height);
                }
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("Out of GPU memory; shutting down client event loop");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other) => {}
        }

        self.log_frame_stats_if_due(dt);
    }

    fn log_frame_stats_if_due(&mut self, dt: f32) {
        self.frame_counter.elapsed += dt;
        self.frame_counter.frames += 1;
        if self.frame_counter.elapsed < STATS_LOG_INTERVAL_SECS {
            return;
        }

        let fps = self.frame_counter.frames as f32 / self.frame_counter.elapsed;
        let stats = self.last_stats;
        info!(
            "{fps:.1} fps | {} draws | {} portal passes | {} skipped portals | {} skipped objects",
            stats.draw_calls, stats.portal_passes, stats.skipped_portals, stats.skipped_objects
        );
        self.frame_counter = FrameCounter::default();
    }
}

impl ApplicationHandler for ClientApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes().with_title("Paradise");
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                error!("failed to create client window: {err}");
                event_loop.exit();
                return;
            }
        };

        let mut renderer = match Renderer::new(window.clone(), self.settings.vsync) {
            Ok(renderer) => renderer,
            Err(err) => {
                error!("failed to initialize renderer: {err}");
                event_loop.exit();
                return;
            }
        };

        let aspect = renderer.aspect();
        match self.build_scene(&mut renderer, aspect) {
            Ok(scene) => {
                info!("Client window and renderer initialized");
                self.window = Some(window);
                self.renderer = Some(renderer);
                self.scene = Some(scene);
                self.last_frame = Some(Instant::now());
            }
            Err(err) => {
                error!("failed to build scene: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window.as_ref().map(|window| window.id()) != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested; shutting down client event loop");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => {
                        if code == KeyCode::Escape && self.cursor_grabbed {
                            self.set_cursor_grab(false);
                        }
                        self.input.press_key(code);
                    }
                    ElementState::Released => self.input.release_key(code),
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left
                    && state == ElementState::Pressed
                    && !self.cursor_grabbed
                {
                    self.set_cursor_grab(true);
                }
            }
            WindowEvent::Focused(false) => {
                self.input.release_all();
                self.set_cursor_grab(false);
            }
            WindowEvent::Resized(size) => {
                info!("Window resized to {}x{}", size.width, size.height);
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
                if size.height > 0 {
                    if let Some(scene) = self.scene.as_mut() {
                        scene.resize(size.width as f32 / size.height as f32);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.update_and_render(event_loop);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if !self.cursor_grabbed {
            return;
        }

        if let DeviceEvent::MouseMotion { delta } = event {
            self.input
                .add_mouse_delta(Vec2::new(delta.0 as f32, delta.1 as f32));
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

pub fn run() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let options = LaunchOptions::parse(std::env::args().skip(1));
    info!("Paradise client starting with settings {}", options.settings.display());

    let event_loop = match EventLoop::new() {
        Ok(loop_handle) => loop_handle,
        Err(err) => {
            eprintln!("Failed to create event loop: {err}");
            return;
        }
    };

    let mut app = ClientApp::new(options);
    if let Err(err) = event_loop.run_app(&mut app) {
        eprintln!("Event loop exited with error: {err}");
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use paradise_core::{ObjectTag, SceneGraph};

    use super::{load_scene_description, LaunchOptions, BUNDLED_SCENE};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_scene_and_settings_flags() {
        let options = LaunchOptions::parse(args(&[
            "--scene",
            "gallery.toml",
            "--settings",
            "custom.toml",
        ]));
        assert_eq!(options.scene, Some(PathBuf::from("gallery.toml")));
        assert_eq!(options.settings, PathBuf::from("custom.toml"));
    }

    #[test]
    fn missing_flag_values_keep_defaults() {
        let options = LaunchOptions::parse(args(&["--verbose", "--scene"]));
        assert_eq!(options, LaunchOptions::default());
    }

    #[test]
    fn bundled_scene_builds_cleanly() {
        let description = paradise_core::SceneDescription::from_toml_str(BUNDLED_SCENE).unwrap();
        let (scene, warnings) = SceneGraph::build(&description, 16.0 / 9.0).unwrap();

        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(scene.portals.len(), 2);
        assert_eq!(scene.lights().len(), 2);
        let west = scene.find_object("west_portal").unwrap();
        assert_eq!(scene.object(west).unwrap().tag, ObjectTag::Portal);
        assert!(scene.link_frames().iter().all(Option::is_some));
    }

    #[test]
    fn unreadable_scene_falls_back_to_bundled() {
        let description =
            load_scene_description(Some(Path::new("/nonexistent/paradise/scene.toml"))).unwrap();
        assert_eq!(description.name.as_deref(), Some("museum"));
    }
}
