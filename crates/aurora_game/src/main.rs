//! Aurora -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. All
//! simulation runs inside `RedrawRequested` using a **fixed-timestep** model
//! (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `while should_step()` -- route clicks, sample keys, advance the
//!      scene director one fixed step, apply its audio output to the mixer
//!   3. Rebuild the sprite mesh from the active scene
//!   4. Upload the camera uniform, issue draw calls, composite the HUD text
//!
//! The simulation itself never touches winit, wgpu, egui or rodio: it
//! consumes an `InputSample` and emits audio directives, and this file is
//! the only place where those meet the real devices.

mod audio;
mod director;
mod enemy;
mod level;
mod player;
#[cfg(test)]
mod replay;
mod world;

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use aurora_core::input::{InputState, Key, MouseBtn};
use aurora_core::sprite::{SheetId, SpriteKey};
use aurora_core::states::SceneState;
use aurora_core::time::TimeState;
use aurora_hud::{ButtonLabel, HudOverlay, HudView};
use aurora_platform::window::PlatformConfig;
use aurora_render::{GpuContext, ScreenCamera, SpritePipeline, SpriteVertex, Texture};

use audio::AudioMixer;
use director::{ClickOutcome, SceneDirector};
use level::{Platform, SCREEN_HEIGHT, SCREEN_WIDTH};

/// A contiguous run of indices sharing one texture binding. Consecutive
/// quads with the same sprite key merge into a single draw call.
#[derive(Debug, Clone, Copy)]
struct DrawCall {
    sprite: SpriteKey,
    index_start: u32,
    index_count: u32,
}

struct QuadSpec {
    sprite: SpriteKey,
    center_x: f32,
    center_y: f32,
    width: f32,
    height: f32,
    color: [f32; 4],
}

struct GpuSpriteTexture {
    #[allow(dead_code)]
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// All mutable engine state. Constructed lazily in
/// `ApplicationHandler::resumed` once the window and GPU surface exist.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    sprite_pipeline: SpritePipeline,
    hud: HudOverlay,
    mixer: AudioMixer,
    director: SceneDirector,
    textures: HashMap<SpriteKey, GpuSpriteTexture>,

    // Per-frame GPU mesh state: the quad mesh is rebuilt on the CPU after
    // every simulated frame, then streamed into these buffers. Buffers grow
    // (power-of-two) but never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    draw_calls: Vec<DrawCall>,
}

impl EngineState {
    fn new(window: Arc<Window>) -> Self {
        let gpu = GpuContext::new(window.clone());
        let time = TimeState::new();
        let input = InputState::new();
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let hud = HudOverlay::new(&gpu.device, gpu.surface_format, &window);

        // The projection is fixed for the whole session, so the uniform is
        // uploaded exactly once.
        let camera_uniform = ScreenCamera::new(SCREEN_WIDTH, SCREEN_HEIGHT).build_uniform();
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let textures = load_all_sprites(&gpu.device, &gpu.queue, &sprite_pipeline);

        let mut state = Self {
            window,
            gpu,
            time,
            input,
            sprite_pipeline,
            hud,
            mixer: AudioMixer::new(),
            director: SceneDirector::new(),
            textures,
            vertex_buffer,
            index_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            draw_calls: Vec::new(),
        };

        state.ensure_mesh_capacity(4, 6);
        state.rebuild_scene_mesh();
        state
    }

    fn rebuild_scene_mesh(&mut self) {
        let (vertices, indices, draw_calls) = self.build_mesh();
        self.ensure_mesh_capacity(vertices.len(), indices.len());
        self.draw_calls = draw_calls;

        if !vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
        if !indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&indices));
        }
    }

    fn build_mesh(&self) -> (Vec<SpriteVertex>, Vec<u32>, Vec<DrawCall>) {
        let mut vertices = Vec::with_capacity(64 * 4);
        let mut indices = Vec::with_capacity(64 * 6);
        let mut draw_calls = Vec::with_capacity(8);

        let background = QuadSpec {
            sprite: SpriteKey::single(SheetId::Background),
            center_x: SCREEN_WIDTH * 0.5,
            center_y: SCREEN_HEIGHT * 0.5,
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            color: [1.0, 1.0, 1.0, 1.0],
        };

        match self.director.scene {
            SceneState::Menu => {
                add_quad(&mut vertices, &mut indices, &mut draw_calls, background);
                for (_, center) in self.director.menu_labels() {
                    let rect = SceneDirector::button_rect(center);
                    add_quad(
                        &mut vertices,
                        &mut indices,
                        &mut draw_calls,
                        QuadSpec {
                            sprite: SpriteKey::single(SheetId::Button),
                            center_x: rect.center_x,
                            center_y: rect.center_y,
                            width: rect.half_w * 2.0,
                            height: rect.half_h * 2.0,
                            color: [1.0, 1.0, 1.0, 1.0],
                        },
                    );
                }
            }
            SceneState::Playing => {
                add_quad(&mut vertices, &mut indices, &mut draw_calls, background);
                for platform in &self.director.world.platforms {
                    add_quad(
                        &mut vertices,
                        &mut indices,
                        &mut draw_calls,
                        QuadSpec {
                            sprite: Platform::sprite(),
                            center_x: platform.aabb.center_x,
                            center_y: platform.aabb.center_y,
                            width: platform.aabb.half_w * 2.0,
                            height: platform.aabb.half_h * 2.0,
                            color: [1.0, 1.0, 1.0, 1.0],
                        },
                    );
                }
                for enemy in &self.director.world.enemies {
                    add_quad(
                        &mut vertices,
                        &mut indices,
                        &mut draw_calls,
                        QuadSpec {
                            sprite: enemy.sprite,
                            center_x: enemy.aabb.center_x,
                            center_y: enemy.aabb.center_y,
                            width: enemy.aabb.half_w * 2.0,
                            height: enemy.aabb.half_h * 2.0,
                            color: [1.0, 1.0, 1.0, 1.0],
                        },
                    );
                }
                let player = &self.director.world.player;
                add_quad(
                    &mut vertices,
                    &mut indices,
                    &mut draw_calls,
                    QuadSpec {
                        sprite: player.sprite,
                        center_x: player.aabb.center_x,
                        center_y: player.aabb.center_y,
                        width: player.aabb.half_w * 2.0,
                        height: player.aabb.half_h * 2.0,
                        color: [1.0, 1.0, 1.0, 1.0],
                    },
                );
            }
            // Game over is bare text on a cleared screen.
            SceneState::GameOver => {}
        }

        (vertices, indices, draw_calls)
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn hud_view(&self) -> HudView {
        let buttons = if self.director.scene == SceneState::Menu {
            self.director
                .menu_labels()
                .iter()
                .map(|&(text, center)| ButtonLabel {
                    text: text.to_string(),
                    center,
                })
                .collect()
        } else {
            Vec::new()
        };

        HudView {
            scene: self.director.scene,
            enemies_alive: self.director.world.enemies.len(),
            buttons,
        }
    }
}

struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = aurora_platform::window::create_window(event_loop, &self.config);
        self.state = Some(EngineState::new(window));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state.hud.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                // The simulation, the button rects and the HUD all live in
                // logical units; convert once at the boundary.
                let logical = position.to_logical::<f64>(state.window.scale_factor());
                state.input.mouse_position = (logical.x as f32, logical.y as f32);
            }

            WindowEvent::MouseInput { state: element_state, button, .. } if !egui_consumed => {
                if let Some(game_btn) = map_mouse_button(button) {
                    match element_state {
                        ElementState::Pressed => state.input.mouse_down(game_btn),
                        ElementState::Released => state.input.mouse_up(game_btn),
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                // Fixed-step simulation phase.
                state.time.begin_frame();
                while state.time.should_step() {
                    if state.input.is_just_pressed(Key::Escape) {
                        event_loop.exit();
                        return;
                    }
                    if state.input.is_just_pressed(Key::F3) {
                        state.hud.toggle_debug();
                    }

                    for &btn in MouseBtn::ALL {
                        if state.input.is_mouse_just_pressed(btn) {
                            let (mx, my) = state.input.mouse_position;
                            if state.director.handle_click(mx, my, btn) == ClickOutcome::Quit {
                                event_loop.exit();
                                return;
                            }
                        }
                    }

                    let sample = player::InputSample {
                        left: state.input.is_held(Key::Left),
                        right: state.input.is_held(Key::Right),
                        jump: state.input.is_held(Key::Up) || state.input.is_held(Key::Space),
                    };

                    let frame = state.director.advance(sample);
                    for directive in frame.music {
                        state.mixer.apply_music(directive);
                    }
                    for sfx in frame.sounds {
                        state.mixer.play_effect(sfx);
                    }
                }

                if state.time.steps_this_frame > 0 {
                    state.rebuild_scene_mesh();
                }

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let hud_view = state.hud_view();
                let (hud_primitives, hud_textures_delta) =
                    state.hud.prepare(&state.window, &hud_view, &state.time);
                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: 0.02,
                                    g: 0.02,
                                    b: 0.04,
                                    a: 1.0,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });

                    render_pass.set_pipeline(&state.sprite_pipeline.render_pipeline);
                    render_pass.set_bind_group(0, &state.camera_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, state.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(state.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                    let mut last_bound: Option<SpriteKey> = None;
                    for draw in &state.draw_calls {
                        if let Some(texture) = state.textures.get(&draw.sprite) {
                            if last_bound != Some(draw.sprite) {
                                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                                last_bound = Some(draw.sprite);
                            }
                            render_pass.draw_indexed(
                                draw.index_start..(draw.index_start + draw.index_count),
                                0,
                                0..1,
                            );
                        }
                    }
                }

                state.hud.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &hud_primitives,
                    &hud_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut hud_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("HUD Render Pass"),
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

                    state
                        .hud
                        .paint(&mut hud_pass, &hud_primitives, &screen_descriptor);
                }

                state.hud.cleanup(&hud_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                // Only clear edge-triggered input after at least one fixed
                // step consumed it; a click landing on a zero-step frame
                // must survive into the next one.
                if state.time.steps_this_frame > 0 {
                    state.input.end_frame();
                }
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Quad corners are emitted in y-down screen space; the camera's flipped
/// orthographic projection puts them right side up on screen.
fn add_quad(
    vertices: &mut Vec<SpriteVertex>,
    indices: &mut Vec<u32>,
    draw_calls: &mut Vec<DrawCall>,
    spec: QuadSpec,
) {
    let half_w = spec.width * 0.5;
    let half_h = spec.height * 0.5;
    let base_index = vertices.len() as u32;

    vertices.push(SpriteVertex {
        position: [spec.center_x - half_w, spec.center_y - half_h],
        tex_coords: [0.0, 0.0],
        color: spec.color,
    });
    vertices.push(SpriteVertex {
        position: [spec.center_x + half_w, spec.center_y - half_h],
        tex_coords: [1.0, 0.0],
        color: spec.color,
    });
    vertices.push(SpriteVertex {
        position: [spec.center_x + half_w, spec.center_y + half_h],
        tex_coords: [1.0, 1.0],
        color: spec.color,
    });
    vertices.push(SpriteVertex {
        position: [spec.center_x - half_w, spec.center_y + half_h],
        tex_coords: [0.0, 1.0],
        color: spec.color,
    });

    let draw_start = indices.len() as u32;
    indices.extend_from_slice(&[
        base_index,
        base_index + 1,
        base_index + 2,
        base_index,
        base_index + 2,
        base_index + 3,
    ]);

    push_draw_call(draw_calls, spec.sprite, draw_start, 6);
}

/// Merge with the previous draw call when the sprite key matches and the
/// index ranges are contiguous. Platforms all share one texture, so the
/// whole registry collapses into a single `draw_indexed`.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    sprite: SpriteKey,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if last.sprite == sprite && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        sprite,
        index_start,
        index_count,
    });
}

fn load_all_sprites(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &SpritePipeline,
) -> HashMap<SpriteKey, GpuSpriteTexture> {
    let mut textures = HashMap::new();
    for &sheet in SheetId::ALL {
        for frame in 0..sheet.frame_count() {
            let key = SpriteKey::new(sheet, frame);
            let texture = load_sprite_texture(device, queue, key);
            let bind_group = pipeline.create_texture_bind_group(device, &texture);
            textures.insert(
                key,
                GpuSpriteTexture {
                    texture,
                    bind_group,
                },
            );
        }
    }
    textures
}

fn load_sprite_texture(device: &wgpu::Device, queue: &wgpu::Queue, key: SpriteKey) -> Texture {
    let path = key.asset_path();
    match std::fs::read(&path) {
        Ok(bytes) => match Texture::from_bytes(device, queue, &bytes, &path) {
            Ok(texture) => return texture,
            Err(err) => log::warn!("{err}; using placeholder"),
        },
        Err(err) => log::warn!("Failed to read sprite '{path}': {err}; using placeholder"),
    }
    Texture::from_rgba8(device, queue, &placeholder_color(key.sheet), 1, 1, &path)
}

/// Flat-color stand-ins keep the game playable when art is missing.
fn placeholder_color(sheet: SheetId) -> [u8; 4] {
    match sheet {
        SheetId::PlayerRunRight | SheetId::PlayerRunLeft => [64, 128, 255, 255],
        SheetId::PlayerIdleRight | SheetId::PlayerIdleLeft => [96, 160, 255, 255],
        SheetId::EnemyRunRight | SheetId::EnemyRunLeft => [220, 64, 64, 255],
        SheetId::Platform => [72, 160, 72, 255],
        SheetId::Button => [200, 200, 200, 255],
        SheetId::Background => [24, 28, 48, 255],
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn map_mouse_button(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Aurora starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
