use glam::Mat4;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Fixed orthographic projection over the game's logical screen space.
///
/// The simulation uses y-down screen coordinates with the origin at the
/// top-left, so the projection hands `orthographic_rh` a flipped vertical
/// range (bottom = logical height, top = 0). The window surface may be any
/// physical size; the projection always maps the full logical space onto it.
pub struct ScreenCamera {
    pub logical_width: f32,
    pub logical_height: f32,
}

impl ScreenCamera {
    pub fn new(logical_width: f32, logical_height: f32) -> Self {
        Self {
            logical_width,
            logical_height,
        }
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let proj = Mat4::orthographic_rh(
            0.0,
            self.logical_width,
            self.logical_height,
            0.0,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}
