//! Text and HUD layer rendered via egui on top of the sprite pass.
//!
//! Integration pattern: egui requires a three-phase render split because
//! `egui_wgpu::Renderer::render()` needs a `RenderPass<'static>`, while
//! `begin_render_pass` borrows the encoder. The phases are:
//!
//!   1. `prepare()` -- run egui UI logic, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! All game text is painted on a non-interactive foreground layer: button
//! hit-testing belongs to the scene director, so egui must never swallow a
//! click. The F3 debug panel is the only interactive egui surface, and it is
//! hidden by default.

use aurora_core::states::SceneState;
use aurora_core::time::TimeState;
use winit::window::Window;

/// What the HUD needs to know about the current frame. Built by the game
/// loop; the HUD owns no game state.
#[derive(Debug, Clone, Default)]
pub struct HudView {
    pub scene: SceneState,
    pub enemies_alive: usize,
    /// Button labels with their centers in logical screen units. Empty
    /// outside the menu.
    pub buttons: Vec<ButtonLabel>,
}

#[derive(Debug, Clone)]
pub struct ButtonLabel {
    pub text: String,
    pub center: (f32, f32),
}

pub struct HudOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
}

impl HudOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            debug_visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!(
            "Debug panel: {}",
            if self.debug_visible { "ON" } else { "OFF" }
        );
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        view: &HudView,
        time: &TimeState,
    ) -> (Vec<egui::ClippedPrimitive>, egui::TexturesDelta) {
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let debug_visible = self.debug_visible;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            paint_scene_text(ctx, view);

            if debug_visible {
                egui::Window::new("Debug")
                    .default_pos([10.0, 10.0])
                    .show(ctx, |ui| {
                        ui.label(format!("FPS: {:.1}", time.smoothed_fps));
                        ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
                        ui.label(format!("Steps this frame: {}", time.steps_this_frame));
                        ui.label(format!("Total steps: {}", time.fixed_step_count));
                        ui.separator();
                        ui.label(format!("Scene: {}", view.scene));
                        ui.label(format!("Enemies alive: {}", view.enemies_alive));
                    });
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn paint_scene_text(ctx: &egui::Context, view: &HudView) {
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("scene_text"),
    ));

    match view.scene {
        SceneState::Menu => {
            painter.text(
                egui::pos2(450.0, 110.0),
                egui::Align2::CENTER_CENTER,
                "AURORA",
                egui::FontId::proportional(56.0),
                egui::Color32::WHITE,
            );
            for button in &view.buttons {
                painter.text(
                    egui::pos2(button.center.0, button.center.1),
                    egui::Align2::CENTER_CENTER,
                    &button.text,
                    egui::FontId::proportional(30.0),
                    egui::Color32::BLACK,
                );
            }
        }
        SceneState::GameOver => {
            painter.text(
                egui::pos2(400.0, 200.0),
                egui::Align2::CENTER_CENTER,
                "Game Over",
                egui::FontId::proportional(60.0),
                egui::Color32::WHITE,
            );
        }
        SceneState::Playing => {}
    }
}
