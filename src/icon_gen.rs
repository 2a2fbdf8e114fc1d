use crate::{
    color::Rgb,
    manifest::{self, ManifestIcons},
};
use anyhow::{Context, Result};
use image::{
    codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder},
    ColorType, ImageBuffer, ImageEncoder, ImageFormat, Rgba, RgbaImage,
};
use std::{
    fs::{create_dir_all, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Distance in pixels between the canvas edge and the background circle.
pub const MARGIN: u32 = 2;

/// Smallest icon that gets the chain-link glyph by default.
pub const GLYPH_MIN_SIZE: u32 = 32;

pub const DEFAULT_SIZES: [u32; 4] = [16, 32, 48, 128];

/// Largest accepted icon size. Bigger canvases would take gigabytes of memory.
pub const MAX_SIZE: u32 = 8192;

/// Generation settings. `Config::default()` reproduces the stock extension icons.
#[derive(Debug, Clone)]
pub struct Config {
    pub sizes: Vec<u32>,
    pub color_a: Rgb,
    pub color_b: Rgb,
    pub output: PathBuf,
    pub glyph_min_size: u32,
    pub manifest: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            color_a: Rgb::GRADIENT_START,
            color_b: Rgb::GRADIENT_END,
            output: PathBuf::from("icons"),
            glyph_min_size: GLYPH_MIN_SIZE,
            manifest: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.sizes.contains(&0) {
            anyhow::bail!("Icon sizes must be positive integers");
        }
        if let Some(size) = self.sizes.iter().find(|&&size| size > MAX_SIZE) {
            anyhow::bail!("Icon size {size} exceeds the maximum of {MAX_SIZE} pixels");
        }
        Ok(())
    }
}

/// The PNG encoder could not produce a readable image, so nothing can be generated.
#[derive(Debug, Error)]
#[error("PNG rendering support is not available: {reason}")]
pub struct MissingCapability {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedIcon {
    pub size: u32,
    pub path: PathBuf,
}

/// Inclusive pixel bounds of an ellipse, `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl BoundingBox {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self {
            x0: to_coord(x0),
            y0: to_coord(y0),
            x1: to_coord(x1),
            y1: to_coord(y1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x1 < self.x0 || self.y1 < self.y0
    }

    fn center(&self) -> (f32, f32) {
        (
            (self.x0 as f32 + self.x1 as f32) / 2.0,
            (self.y0 as f32 + self.y1 as f32) / 2.0,
        )
    }

    // Radii reach the outer edge of the boundary pixels so a zero-area box
    // still covers its single pixel.
    fn radii(&self) -> (f32, f32) {
        (
            (self.x1 as f32 - self.x0 as f32) / 2.0 + 0.5,
            (self.y1 as f32 - self.y0 as f32) / 2.0 + 0.5,
        )
    }

    /// Pixel coordinates covered by the box, clipped to a `width` x `height` canvas.
    fn clipped_pixels(&self, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
        let x_start = self.x0.max(0);
        let y_start = self.y0.max(0);
        let x_end = self.x1.min(to_coord(width) - 1);
        let y_end = self.y1.min(to_coord(height) - 1);
        (y_start..=y_end).flat_map(move |y| (x_start..=x_end).map(move |x| (x as u32, y as u32)))
    }
}

// Coordinates past i32::MAX are off any canvas anyway, so saturate.
fn to_coord(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Geometry of the chain-link glyph for an icon of the given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkGlyph {
    pub left: BoundingBox,
    pub right: BoundingBox,
    pub width: u32,
}

impl LinkGlyph {
    /// The two offset arcs suggesting interlocking rings. The coordinates are a
    /// fixed visual recipe; keep them as they are.
    pub fn for_size(size: u32) -> Self {
        let center = size / 2;
        let quarter = size / 4;
        let offset = size / 6;

        Self {
            left: BoundingBox::new(quarter - offset, quarter, quarter + offset, center + offset),
            right: BoundingBox::new(
                center,
                quarter - offset,
                center + quarter,
                quarter + offset + quarter,
            ),
            width: (size / 16).max(2),
        }
    }
}

/// Generate every configured icon, creating the output directory as needed.
pub fn generate_icons(config: &Config) -> Result<Vec<GeneratedIcon>> {
    generate_icons_with(config, probe_png_support)
}

/// Same as [`generate_icons`] with a custom capability probe, run before any
/// filesystem access.
pub fn generate_icons_with<P>(config: &Config, probe: P) -> Result<Vec<GeneratedIcon>>
where
    P: FnOnce() -> Result<(), MissingCapability>,
{
    config.validate()?;
    probe()?;

    // Ensure the output directory exists
    create_dir_all(&config.output).with_context(|| {
        format!(
            "Can't create output directory {}",
            config.output.display()
        )
    })?;

    let fill = Rgb::blend(config.color_a, config.color_b);
    let mut generated = Vec::with_capacity(config.sizes.len());

    for &size in &config.sizes {
        let icon = render_icon(size, fill, size >= config.glyph_min_size);
        let output_path = config.output.join(icon_file_name(size));
        save_png(&icon, &output_path)?;
        println!("Generated {}", output_path.display());

        generated.push(GeneratedIcon {
            size,
            path: output_path,
        });
    }

    if config.manifest {
        let prefix = manifest::icon_prefix(&config.output);
        let mut icons = ManifestIcons::new();
        for icon in &generated {
            icons.add_icon(icon.size, &prefix, &icon_file_name(icon.size));
        }
        let path = manifest::write_manifest(&config.output, &icons)?;
        println!("Generated {}", path.display());
    }

    println!("\nAll icons generated successfully!");
    println!("Icons are placeholder images. You can replace them with custom designs.");

    Ok(generated)
}

pub fn icon_file_name(size: u32) -> String {
    format!("icon{size}.png")
}

/// Draw a single icon: the blended circle, plus the link glyph when requested.
pub fn render_icon(size: u32, fill: Rgb, with_glyph: bool) -> RgbaImage {
    // Create a transparent canvas
    let mut canvas = ImageBuffer::from_pixel(size, size, Rgba([0, 0, 0, 0]));

    let far = size.saturating_sub(MARGIN);
    let bounds = BoundingBox::new(MARGIN, MARGIN, far, far);
    fill_ellipse(&mut canvas, bounds, fill.to_rgba(255));

    if with_glyph {
        let glyph = LinkGlyph::for_size(size);
        let link_color = Rgb::WHITE.to_rgba(255);
        draw_arc(&mut canvas, glyph.left, 180.0, 360.0, glyph.width, link_color);
        draw_arc(&mut canvas, glyph.right, 0.0, 180.0, glyph.width, link_color);
    }

    canvas
}

/// Fill the ellipse inscribed in `bounds`.
pub fn fill_ellipse(canvas: &mut RgbaImage, bounds: BoundingBox, color: Rgba<u8>) {
    if bounds.is_empty() {
        return;
    }

    let (center_x, center_y) = bounds.center();
    let (radius_x, radius_y) = bounds.radii();

    for (x, y) in bounds.clipped_pixels(canvas.width(), canvas.height()) {
        let dx = (x as f32 - center_x) / radius_x;
        let dy = (y as f32 - center_y) / radius_y;
        if dx * dx + dy * dy <= 1.0 {
            canvas.put_pixel(x, y, color);
        }
    }
}

/// Stroke the part of the ellipse outline inscribed in `bounds` that lies
/// between `start` and `end` degrees. 0° points right and angles grow
/// clockwise; the stroke grows inward from the outline.
pub fn draw_arc(
    canvas: &mut RgbaImage,
    bounds: BoundingBox,
    start: f32,
    end: f32,
    width: u32,
    color: Rgba<u8>,
) {
    if bounds.is_empty() || width == 0 {
        return;
    }

    let (center_x, center_y) = bounds.center();
    let (outer_x, outer_y) = bounds.radii();
    let inner_x = outer_x - width as f32;
    let inner_y = outer_y - width as f32;

    for (x, y) in bounds.clipped_pixels(canvas.width(), canvas.height()) {
        let dx = x as f32 - center_x;
        let dy = y as f32 - center_y;

        let outer = (dx / outer_x).powi(2) + (dy / outer_y).powi(2);
        if outer > 1.0 {
            continue;
        }
        if inner_x > 0.0 && inner_y > 0.0 {
            let inner = (dx / inner_x).powi(2) + (dy / inner_y).powi(2);
            if inner <= 1.0 {
                continue;
            }
        }

        // Image y grows downward, so atan2 already measures clockwise.
        let angle = dy.atan2(dx).to_degrees().rem_euclid(360.0);
        if angle_in_span(angle, start, end) {
            canvas.put_pixel(x, y, color);
        }
    }
}

fn angle_in_span(angle: f32, start: f32, end: f32) -> bool {
    if end - start >= 360.0 {
        return true;
    }
    let span = (end - start).rem_euclid(360.0);
    (angle - start).rem_euclid(360.0) <= span
}

/// Check that PNG encoding works by round-tripping a 1x1 image in memory.
pub fn probe_png_support() -> Result<(), MissingCapability> {
    let mut buf = Vec::new();
    write_png(&[0, 0, 0, 0], &mut buf, 1).map_err(|err| MissingCapability {
        reason: err.to_string(),
    })?;

    let decoded = image::load_from_memory_with_format(&buf, ImageFormat::Png).map_err(|err| {
        MissingCapability {
            reason: err.to_string(),
        }
    })?;
    if decoded.width() != 1 || decoded.height() != 1 {
        return Err(MissingCapability {
            reason: "PNG probe decoded with unexpected dimensions".to_string(),
        });
    }
    Ok(())
}

fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create PNG file {}", path.display()))?;
    let mut out_file = BufWriter::new(file);
    write_png(image.as_raw(), &mut out_file, image.width())
        .with_context(|| format!("Failed to write PNG {}", path.display()))?;
    out_file.flush()?;
    Ok(())
}

// Encode square RGBA image data as PNG with compression
fn write_png<W: Write>(image_data: &[u8], w: W, size: u32) -> Result<()> {
    let encoder = PngEncoder::new_with_quality(w, CompressionType::Best, PngFilterType::Adaptive);
    encoder.write_image(image_data, size, size, ColorType::Rgba8)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILL: Rgb = Rgb(110, 100, 198);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn count_pixels(img: &RgbaImage, color: Rgba<u8>) -> usize {
        img.pixels().filter(|p| **p == color).count()
    }

    #[test]
    fn test_canvas_matches_size_and_starts_transparent() {
        for size in [1, 3, 16, 128] {
            let img = render_icon(size, FILL, false);
            assert_eq!(img.dimensions(), (size, size));
            assert_eq!(*img.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        }
    }

    #[test]
    fn test_circle_is_filled_with_blend() {
        let img = render_icon(16, FILL, false);
        assert_eq!(*img.get_pixel(8, 8), FILL.to_rgba(255));
        // Bounding box edges are inclusive
        assert_eq!(*img.get_pixel(8, 2), FILL.to_rgba(255));
        assert_eq!(*img.get_pixel(8, 14), FILL.to_rgba(255));
        assert_eq!(*img.get_pixel(2, 8), FILL.to_rgba(255));
        // Margin stays transparent
        assert_eq!(img.get_pixel(8, 1)[3], 0);
        assert_eq!(img.get_pixel(15, 8)[3], 0);
        assert_eq!(img.get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn test_tiny_canvas_has_no_circle() {
        let img = render_icon(3, FILL, false);
        assert!(img.pixels().all(|p| p[3] == 0));

        // [2, 2, 2, 2] still covers its single pixel
        let img = render_icon(4, FILL, false);
        assert_eq!(*img.get_pixel(2, 2), FILL.to_rgba(255));
        assert_eq!(count_pixels(&img, FILL.to_rgba(255)), 1);
    }

    #[test]
    fn test_glyph_geometry() {
        let glyph = LinkGlyph::for_size(128);
        assert_eq!(glyph.left, BoundingBox::new(11, 32, 53, 85));
        assert_eq!(glyph.right, BoundingBox::new(64, 11, 96, 85));
        assert_eq!(glyph.width, 8);

        let glyph = LinkGlyph::for_size(32);
        assert_eq!(glyph.left, BoundingBox::new(3, 8, 13, 21));
        assert_eq!(glyph.right, BoundingBox::new(16, 3, 24, 21));
        assert_eq!(glyph.width, 2);
    }

    #[test]
    fn test_glyph_only_when_requested() {
        assert_eq!(count_pixels(&render_icon(48, FILL, false), WHITE), 0);
        assert!(count_pixels(&render_icon(48, FILL, true), WHITE) > 0);
    }

    #[test]
    fn test_left_arc_covers_upper_half_only() {
        let mut canvas = ImageBuffer::from_pixel(32, 32, Rgba([0, 0, 0, 0]));
        let bounds = BoundingBox::new(4, 4, 27, 27);
        draw_arc(&mut canvas, bounds, 180.0, 360.0, 2, WHITE);

        // Top of the outline is drawn, bottom is not
        assert_eq!(*canvas.get_pixel(16, 4), WHITE);
        assert_eq!(canvas.get_pixel(16, 27)[3], 0);
        // The stroke does not reach the middle
        assert_eq!(canvas.get_pixel(16, 10)[3], 0);
    }

    #[test]
    fn test_right_arc_covers_lower_half_only() {
        let mut canvas = ImageBuffer::from_pixel(32, 32, Rgba([0, 0, 0, 0]));
        let bounds = BoundingBox::new(4, 4, 27, 27);
        draw_arc(&mut canvas, bounds, 0.0, 180.0, 2, WHITE);

        assert_eq!(*canvas.get_pixel(16, 27), WHITE);
        assert_eq!(canvas.get_pixel(16, 4)[3], 0);
    }

    #[test]
    fn test_arc_outside_canvas_is_clipped() {
        let mut canvas = ImageBuffer::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        let bounds = BoundingBox {
            x0: -10,
            y0: -10,
            x1: 20,
            y1: 20,
        };
        draw_arc(&mut canvas, bounds, 0.0, 360.0, 3, WHITE);
        fill_ellipse(&mut canvas, bounds, WHITE);
        assert_eq!(canvas.dimensions(), (8, 8));
    }

    #[test]
    fn test_angle_in_span() {
        assert!(angle_in_span(270.0, 180.0, 360.0));
        assert!(angle_in_span(180.0, 180.0, 360.0));
        assert!(!angle_in_span(90.0, 180.0, 360.0));
        assert!(angle_in_span(90.0, 0.0, 180.0));
        assert!(!angle_in_span(270.0, 0.0, 180.0));
        assert!(angle_in_span(42.0, 0.0, 360.0));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let config = Config {
            sizes: vec![16, 0],
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_oversized_icon_is_rejected() {
        let config = Config {
            sizes: vec![16, 100_000],
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("100000"));

        let largest = Config {
            sizes: vec![MAX_SIZE],
            ..Config::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_huge_coordinates_saturate() {
        let bounds = BoundingBox::new(0, 0, u32::MAX, u32::MAX);
        assert_eq!(bounds.x1, i32::MAX);
        assert_eq!(bounds.y1, i32::MAX);
        assert!(!bounds.is_empty());
        // Clipped to the canvas instead of wrapping to a negative box
        assert_eq!(bounds.clipped_pixels(4, 4).count(), 16);

        let far = BoundingBox::new(u32::MAX, u32::MAX, u32::MAX, u32::MAX);
        let mut canvas = ImageBuffer::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        fill_ellipse(&mut canvas, far, WHITE);
        draw_arc(&mut canvas, far, 0.0, 360.0, 2, WHITE);
        assert!(canvas.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_empty_margin_box_is_left_to_fill_ellipse() {
        for size in [1u32, 2, 3] {
            let far = size.saturating_sub(MARGIN);
            assert!(BoundingBox::new(MARGIN, MARGIN, far, far).is_empty());
            assert!(render_icon(size, FILL, true).pixels().all(|p| p[3] == 0 || *p == WHITE));
        }
    }

    #[test]
    fn test_png_probe_succeeds() {
        assert!(probe_png_support().is_ok());
    }
}
