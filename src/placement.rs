use tiny_skia::Transform;

/// Fit modes the compositor accepts. `solid_color` and unrecognized tokens
/// never reach this type; see [`crate::config::BackgroundMode::fit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    Stretch,
    Fill,
    Fit,
    Center,
    Tile,
}

/// Scale and device-space origin mapping a source image onto a buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale_x: f32,
    pub scale_y: f32,
    pub x: f32,
    pub y: f32,
}

impl Placement {
    pub fn compute(
        mode: FitMode,
        src_width: u32,
        src_height: u32,
        buffer_width: u32,
        buffer_height: u32,
    ) -> Self {
        let width = src_width as f32;
        let height = src_height as f32;
        let buffer_width = buffer_width as f32;
        let buffer_height = buffer_height as f32;

        match mode {
            FitMode::Stretch => Self {
                scale_x: buffer_width / width,
                scale_y: buffer_height / height,
                x: 0.0,
                y: 0.0,
            },
            FitMode::Fill => {
                let window_ratio = buffer_width / buffer_height;
                let bg_ratio = width / height;
                if window_ratio > bg_ratio {
                    let scale = buffer_width / width;
                    Self {
                        scale_x: scale,
                        scale_y: scale,
                        x: 0.0,
                        y: buffer_height / 2.0 - height * scale / 2.0,
                    }
                } else {
                    let scale = buffer_height / height;
                    Self {
                        scale_x: scale,
                        scale_y: scale,
                        x: buffer_width / 2.0 - width * scale / 2.0,
                        y: 0.0,
                    }
                }
            }
            FitMode::Fit => {
                // Same ratio comparison as Fill, opposite scale selection.
                let window_ratio = buffer_width / buffer_height;
                let bg_ratio = width / height;
                if window_ratio > bg_ratio {
                    let scale = buffer_height / height;
                    Self {
                        scale_x: scale,
                        scale_y: scale,
                        x: buffer_width / 2.0 - width * scale / 2.0,
                        y: 0.0,
                    }
                } else {
                    let scale = buffer_width / width;
                    Self {
                        scale_x: scale,
                        scale_y: scale,
                        x: 0.0,
                        y: buffer_height / 2.0 - height * scale / 2.0,
                    }
                }
            }
            FitMode::Center => Self {
                scale_x: 1.0,
                scale_y: 1.0,
                // Align the unscaled image to integer pixel boundaries to
                // prevent loss of clarity on odd-sized images.
                x: (buffer_width / 2.0 - width / 2.0).trunc(),
                y: (buffer_height / 2.0 - height / 2.0).trunc(),
            },
            FitMode::Tile => Self {
                scale_x: 1.0,
                scale_y: 1.0,
                x: 0.0,
                y: 0.0,
            },
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_row(self.scale_x, 0.0, 0.0, self.scale_y, self.x, self.y)
    }

    /// Scaled image extent in device space.
    pub fn scaled_size(&self, src_width: u32, src_height: u32) -> (f32, f32) {
        (
            src_width as f32 * self.scale_x,
            src_height as f32 * self.scale_y,
        )
    }
}
