use std::path::Path;
use std::sync::Arc;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use tracing::info;

use fractour_core::{Bounds, Viewport};
use fractour_render::{export_png, Painter, RenderBuffer, RenderCancel, RenderError};

use crate::error::{AppError, Result};

/// Image container chosen from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(AppError::UnsupportedFormat(ext)),
        }
    }
}

/// Glyph cell size of the caption font.
const GLYPH: u32 = 8;
/// Distance of the caption from the left and bottom edges.
const CAPTION_MARGIN: u32 = 10;
/// Dark padding around the caption text.
const CAPTION_PAD: u32 = 2;

/// The bounds line stamped onto JPEG exports.
pub fn caption_text(bounds: &Bounds) -> String {
    format!(
        "Re: [{}; {}]  Im: [{}; {}]",
        bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max
    )
}

/// Draw `text` in white on a black strip near the bottom-left corner.
///
/// Glyphs that do not fit are clipped; characters outside the basic Latin
/// set are left blank.
pub fn draw_caption(img: &mut RgbImage, text: &str) {
    let (width, height) = img.dimensions();
    if width == 0 || height < GLYPH {
        return;
    }
    let top = height.saturating_sub(CAPTION_MARGIN + GLYPH);
    let left = CAPTION_MARGIN.min(width - 1);
    let text_width = text.chars().count() as u32 * GLYPH;

    let strip_x = left.saturating_sub(CAPTION_PAD)..(left + text_width + CAPTION_PAD).min(width);
    let strip_y = top.saturating_sub(CAPTION_PAD)..(top + GLYPH + CAPTION_PAD).min(height);
    for y in strip_y {
        for x in strip_x.clone() {
            img.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }

    for (i, ch) in text.chars().enumerate() {
        let x0 = left + i as u32 * GLYPH;
        if x0 >= width {
            break;
        }
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH {
                if *bits & (1u8 << col) == 0 {
                    continue;
                }
                let (x, y) = (x0 + col, top + row as u32);
                if x < width && y < height {
                    img.put_pixel(x, y, Rgb([255, 255, 255]));
                }
            }
        }
    }
}

/// RGB copy of `image` with the bounds caption drawn in.
fn captioned_rgb(image: &RenderBuffer, bounds: &Bounds) -> Result<RgbImage> {
    let rgb = image.to_rgb();
    let actual = rgb.len();
    let mut img = RgbImage::from_raw(image.width, image.height, rgb).ok_or(
        RenderError::BufferSize {
            expected: image.width as usize * image.height as usize * 3,
            actual,
        },
    )?;
    draw_caption(&mut img, &caption_text(bounds));
    Ok(img)
}

/// Write an already rendered image. PNG files carry the painter's metadata;
/// JPEG files get the bounds drawn along the bottom edge.
pub fn write_image(
    path: &Path,
    image: &RenderBuffer,
    viewport: &Viewport,
    painter: &Painter,
) -> Result<()> {
    let format = ImageFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    match format {
        ImageFormat::Png => export_png(image, path, &painter.metadata(viewport))?,
        ImageFormat::Jpeg => {
            captioned_rgb(image, &viewport.bounds())?
                .save_with_format(path, image::ImageFormat::Jpeg)?;
        }
    }
    Ok(())
}

/// Render `viewport` with `painter` and save it to `path` (JPEG or PNG by extension).
pub fn export_image(path: &Path, viewport: &Viewport, painter: &Painter) -> Result<()> {
    let format = ImageFormat::from_path(path)?;
    let (width, height) = viewport.pixel_size();
    if width == 0 || height == 0 {
        return Err(AppError::EmptyCanvas);
    }
    let frame = painter.paint(viewport, &Arc::new(RenderCancel::new()))?;
    write_image(path, &frame.image, viewport, painter)?;
    info!(
        path = %path.display(),
        ?format,
        width,
        height,
        fractal = %painter.fractal.kind(),
        palette = %painter.palette,
        "Exported image"
    );
    Ok(())
}
