//! PNG export with embedded metadata (tEXt chunks).

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use fractour_core::{Bounds, FractalKind};
use tracing::debug;

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::palette::Palette;

const SOFTWARE: &str = "Fractour";

/// What produced an image, recorded alongside its pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportMetadata {
    pub fractal: FractalKind,
    pub bounds: Bounds,
    pub palette: Palette,
    pub max_iterations: u32,
    /// Set for Julia renders only.
    pub julia_c: Option<(f64, f64)>,
}

/// Write an RGBA buffer as a PNG with fractal metadata in tEXt chunks.
///
/// Uses the `png` crate directly so custom text chunks can be injected.
pub fn export_png(
    image: &RenderBuffer,
    path: &Path,
    metadata: &ExportMetadata,
) -> crate::Result<()> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if image.pixels.len() != expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: image.pixels.len(),
        });
    }

    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), SOFTWARE.to_string())?;
    encoder.add_text_chunk("Description".to_string(), build_description(metadata))?;
    for (key, value) in build_metadata_pairs(metadata) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&image.pixels)?;
    png_writer.finish()?;

    debug!(width, height, path = %path.display(), "Exported PNG");
    Ok(())
}

fn build_description(meta: &ExportMetadata) -> String {
    let b = &meta.bounds;
    let mut desc = format!(
        "{} - Re: [{}; {}] Im: [{}; {}], Iterations: {}",
        meta.fractal.label(),
        b.x_min,
        b.x_max,
        b.y_min,
        b.y_max,
        meta.max_iterations,
    );
    if let Some((re, im)) = meta.julia_c {
        desc.push_str(&format!(", Julia C: {re} {im}i"));
    }
    desc
}

fn build_metadata_pairs(meta: &ExportMetadata) -> Vec<(String, String)> {
    let b = &meta.bounds;
    let mut pairs = vec![
        ("Fractour.FractalType".into(), meta.fractal.name().to_string()),
        ("Fractour.XMin".into(), b.x_min.to_string()),
        ("Fractour.XMax".into(), b.x_max.to_string()),
        ("Fractour.YMin".into(), b.y_min.to_string()),
        ("Fractour.YMax".into(), b.y_max.to_string()),
        ("Fractour.MaxIterations".into(), meta.max_iterations.to_string()),
        ("Fractour.Palette".into(), meta.palette.name().to_string()),
    ];
    if let Some((re, im)) = meta.julia_c {
        pairs.push(("Fractour.JuliaC_Re".into(), re.to_string()));
        pairs.push(("Fractour.JuliaC_Im".into(), im.to_string()));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn meta(fractal: FractalKind) -> ExportMetadata {
        ExportMetadata {
            fractal,
            bounds: Bounds::DEFAULT,
            palette: Palette::Ice,
            max_iterations: 256,
            julia_c: (fractal == FractalKind::Julia).then_some((-0.7, 0.27015)),
        }
    }

    #[test]
    fn export_creates_valid_png() {
        let image = RenderBuffer::new(4, 4);
        let dir = std::env::temp_dir().join("fractour_test_export");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("test_export.png");
        export_png(&image, &path, &meta(FractalKind::Mandelbrot)).expect("export should succeed");

        let mut file = std::fs::File::open(&path).expect("file should exist");
        let mut header = [0u8; 8];
        file.read_exact(&mut header).expect("should read header");
        assert_eq!(&header, b"\x89PNG\r\n\x1a\n", "valid PNG signature");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn export_embeds_text_chunks() {
        let image = RenderBuffer::new(2, 2);
        let dir = std::env::temp_dir().join("fractour_test_export_meta");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("test_meta.png");
        export_png(&image, &path, &meta(FractalKind::Julia)).expect("export should succeed");

        let decoder = png::Decoder::new(std::fs::File::open(&path).expect("file should exist"));
        let reader = decoder.read_info().expect("should read info");
        let texts = &reader.info().uncompressed_latin1_text;
        assert!(texts.iter().any(|t| t.keyword == "Software" && t.text == "Fractour"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "Fractour.FractalType" && t.text == "julia"));
        assert!(texts.iter().any(|t| t.keyword == "Fractour.XMin" && t.text == "-2"));
        assert!(texts.iter().any(|t| t.keyword == "Fractour.Palette" && t.text == "ice"));
        assert!(texts.iter().any(|t| t.keyword == "Fractour.JuliaC_Re"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let mut image = RenderBuffer::new(2, 2);
        image.pixels.pop();
        let path = std::env::temp_dir().join("fractour_never_written.png");
        let err = export_png(&image, &path, &meta(FractalKind::Newton)).unwrap_err();
        assert!(matches!(err, RenderError::BufferSize { expected: 16, actual: 15 }));

        let empty = RenderBuffer::new(0, 3);
        assert!(matches!(
            export_png(&empty, &path, &meta(FractalKind::Newton)),
            Err(RenderError::InvalidDimensions { .. })
        ));
    }
}
