//! Name labels: where they go and what they look like.
//!
//! Placement is a pure function of the names and a [`RandomSource`], so a
//! seeded source reproduces the same layout. Painting shapes each name with
//! cosmic-text and blends the glyphs onto a transparent canvas that becomes
//! the sprite's texture.

use cgmath::Vector3;
use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, fontdb};
use image::{Rgba, RgbaImage};

use crate::{config::LabelStyle, names::Name, resources::texture::load_binary};

/// Uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f32;
}

impl RandomSource for fastrand::Rng {
    fn next_unit(&mut self) -> f32 {
        self.f32()
    }
}

/// A label's position in the scene group's local space.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelPlacement {
    pub name: Name,
    pub position: Vector3<f32>,
}

/// One placement per name, in input order, uniformly inside the box
/// `x ∈ [-w/2, w/2)`, `y ∈ [0, h)`, `z ∈ [-d/2, d/2)` where `w` and `d` are the
/// style's spread scaled by `target_height`. Overlaps are allowed.
pub fn plan_labels(
    names: &[Name],
    style: &LabelStyle,
    target_height: f32,
    rng: &mut dyn RandomSource,
) -> Vec<LabelPlacement> {
    let width = style.spread[0] * target_height;
    let depth = style.spread[1] * target_height;
    names
        .iter()
        .map(|name| {
            let x = (rng.next_unit() - 0.5) * width;
            let y = rng.next_unit() * target_height;
            let z = (rng.next_unit() - 0.5) * depth;
            LabelPlacement {
                name: name.clone(),
                position: Vector3::new(x, y, z),
            }
        })
        .collect()
}

/// Rasterizes names onto fixed-size canvases.
pub struct LabelPainter {
    font_system: FontSystem,
    swash_cache: SwashCache,
    style: LabelStyle,
}

impl std::fmt::Debug for LabelPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelPainter")
            .field("faces", &self.font_system.db().len())
            .field("style", &self.style)
            .finish()
    }
}

impl LabelPainter {
    /// Use the font at `font_path` under the assets directory. Without it,
    /// labels fall back to system fonts natively and stay blank in the browser.
    pub async fn load(font_path: &str, style: LabelStyle) -> Self {
        match load_binary(font_path).await {
            Ok(data) => {
                let mut db = fontdb::Database::new();
                db.load_font_data(data);
                log::debug!("{font_path}: {} face(s)", db.len());
                if db.len() == 0 {
                    log::warn!("{font_path} holds no usable font, falling back to system fonts");
                    return Self::with_system_fonts(style);
                }
                Self::with_database(db, style)
            }
            Err(e) => {
                log::warn!("label font unavailable, falling back to system fonts: {e:#}");
                Self::with_system_fonts(style)
            }
        }
    }

    pub fn with_database(db: fontdb::Database, style: LabelStyle) -> Self {
        Self {
            font_system: FontSystem::new_with_locale_and_db("en-US".to_string(), db),
            swash_cache: SwashCache::new(),
            style,
        }
    }

    pub fn with_system_fonts(style: LabelStyle) -> Self {
        let font_system = FontSystem::new();
        if font_system.db().len() == 0 {
            log::warn!("no system fonts either; labels will be blank");
        }
        Self {
            font_system,
            swash_cache: SwashCache::new(),
            style,
        }
    }

    /// The name centered on `anchor[0]` with its baseline on `anchor[1]`, in
    /// straight-alpha sRGB.
    pub fn paint(&mut self, name: &Name) -> RgbaImage {
        let height = self.style.canvas_size[1];
        let mut canvas = blank_canvas(&self.style);
        // Shaping needs at least one face to fall back on
        if self.font_system.db().len() == 0 {
            return canvas;
        }

        let metrics = Metrics::new(self.style.font_size, self.style.font_size * 1.2);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        // Unbounded width keeps long names on one line; they are clipped by the canvas
        buffer.set_size(&mut self.font_system, None, Some(height as f32));
        let attrs = Attrs::new().family(Family::Name(&self.style.font_family));
        buffer.set_text(&mut self.font_system, name.as_str(), attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let Some((line_w, line_y)) = buffer.layout_runs().next().map(|run| (run.line_w, run.line_y))
        else {
            return canvas;
        };
        let offset_x = (self.style.anchor[0] - line_w / 2.0).round() as i32;
        let offset_y = (self.style.anchor[1] - line_y).round() as i32;

        let [r, g, b, a] = self.style.color;
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            Color::rgba(r, g, b, a),
            |x, y, w, h, color| {
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        blend_pixel(&mut canvas, x + dx + offset_x, y + dy + offset_y, color);
                    }
                }
            },
        );
        canvas
    }
}

/// The label colour at zero alpha, so filtering at glyph edges never pulls in black.
fn blank_canvas(style: &LabelStyle) -> RgbaImage {
    let [width, height] = style.canvas_size;
    let [r, g, b, _] = style.color;
    RgbaImage::from_pixel(width, height, Rgba([r, g, b, 0]))
}

/// Source-over blend of a straight-alpha colour; pixels off the canvas are dropped.
fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }
    let src_a = f32::from(color.a()) / 255.0;
    if src_a <= 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let dst_a = f32::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    let mix = |s: u8, d: u8| {
        let c = (f32::from(s) * src_a + f32::from(d) * dst_a * (1.0 - src_a)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        mix(color.r(), dst[0]),
        mix(color.g(), dst[1]),
        mix(color.b(), dst[2]),
        (out_a * 255.0).round() as u8,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f32);

    impl RandomSource for Fixed {
        fn next_unit(&mut self) -> f32 {
            self.0
        }
    }

    #[test]
    fn placements_cover_the_expected_box() {
        let names = [Name::from("a")];
        let style = LabelStyle::default();
        let low = plan_labels(&names, &style, 4.0, &mut Fixed(0.0));
        assert_eq!(low[0].position, Vector3::new(-2.5, 0.0, -3.5));
        let high = plan_labels(&names, &style, 4.0, &mut Fixed(0.999));
        let p = high[0].position;
        assert!(p.x < 2.5 && p.y < 4.0 && p.z < 3.5);
        assert!(p.x > 2.49 && p.y > 3.99 && p.z > 3.49);
    }

    #[test]
    fn blank_canvas_without_fonts() {
        let mut painter = LabelPainter::with_database(fontdb::Database::new(), LabelStyle::default());
        let canvas = painter.paint(&Name::from("Ana"));
        assert_eq!(canvas.dimensions(), (256, 64));
        assert!(canvas.pixels().all(|p| p.0 == [255, 255, 0, 0]));
    }

    #[test]
    fn glyph_edges_keep_the_label_colour() {
        let style = LabelStyle::default();
        let mut canvas = blank_canvas(&style);
        blend_pixel(&mut canvas, 10, 10, Color::rgba(255, 255, 0, 64));
        blend_pixel(&mut canvas, 11, 10, Color::rgba(255, 255, 0, 255));

        assert!(canvas.pixels().all(|p| [p[0], p[1], p[2]] == [255, 255, 0]));
        assert_eq!(canvas.get_pixel(10, 10)[3], 64);
        assert_eq!(canvas.get_pixel(12, 10)[3], 0);
    }

    #[test]
    fn blending_onto_transparent_keeps_the_source() {
        let mut canvas = RgbaImage::new(2, 2);
        blend_pixel(&mut canvas, 1, 1, Color::rgba(255, 255, 0, 128));
        assert_eq!(canvas.get_pixel(1, 1).0, [255, 255, 0, 128]);
        blend_pixel(&mut canvas, -1, 5, Color::rgba(255, 255, 0, 255));
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn blending_accumulates_coverage() {
        let mut canvas = RgbaImage::new(1, 1);
        blend_pixel(&mut canvas, 0, 0, Color::rgba(255, 255, 0, 128));
        blend_pixel(&mut canvas, 0, 0, Color::rgba(255, 255, 0, 128));
        let p = canvas.get_pixel(0, 0);
        assert_eq!([p[0], p[1], p[2]], [255, 255, 0]);
        assert!(p[3] > 128);
    }
}
