//! Drawing surface abstraction
//!
//! The browser implements this on a canvas 2D context; headless runs and
//! tests use `RecordingSurface`, which keeps the issued commands.

use glam::Vec2;

/// RGBA color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// CSS color string (`rgba(r,g,b,a)`)
    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            self.r,
            self.g,
            self.b,
            self.a as f32 / 255.0
        )
    }
}

/// Something frames can be drawn onto. Coordinates are playfield pixels.
pub trait Surface {
    /// Image type accepted by `draw_image`
    type Image;

    /// Backing size in device pixels
    fn size(&self) -> Vec2;

    /// Whether the surface can be drawn on at all
    fn is_ready(&self) -> bool {
        let size = self.size();
        size.is_finite() && size.x > 0.0 && size.y > 0.0
    }

    /// Fill the whole surface
    fn clear(&mut self, color: Color);

    /// Stretch an image over the whole playfield
    fn draw_image(&mut self, image: &Self::Image);

    fn fill_rect(&mut self, center: Vec2, size: Vec2, color: Color);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);

    fn fill_text(&mut self, pos: Vec2, text: &str, size_px: f32, color: Color);
}

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Image(String),
    Rect { center: Vec2, size: Vec2, color: Color },
    Circle { center: Vec2, radius: f32, color: Color },
    Text { pos: Vec2, text: String, color: Color },
}

/// Surface that records commands instead of drawing
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Vec2,
    /// Commands since the last `clear`
    pub commands: Vec<DrawCommand>,
    /// Number of `clear` calls (one per rendered frame)
    pub frames: u32,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
            frames: 0,
        }
    }

    /// Texts drawn in the current frame
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    /// Images are identified by name
    type Image = String;

    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.frames += 1;
        self.commands.push(DrawCommand::Clear(color));
    }

    fn draw_image(&mut self, image: &String) {
        self.commands.push(DrawCommand::Image(image.clone()));
    }

    fn fill_rect(&mut self, center: Vec2, size: Vec2, color: Color) {
        self.commands.push(DrawCommand::Rect {
            center,
            size,
            color,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_text(&mut self, pos: Vec2, text: &str, _size_px: f32, color: Color) {
        self.commands.push(DrawCommand::Text {
            pos,
            text: text.to_string(),
            color,
        });
    }
}
