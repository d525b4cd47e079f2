//! Raster decode and PNG encode for layer transfer.

use image::RgbaImage;
use tracing::debug;

use crate::surface::Surface;

/// Decode any supported raster (PNG, JPEG, WebP) into RGBA8.
pub fn decode_raster(bytes: &[u8]) -> crate::Result<RgbaImage> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    debug!("decoded {}x{} raster", image.width(), image.height());
    Ok(image)
}

/// Encode a surface as an RGBA PNG.
///
/// Uses the `png` crate directly so the output carries a `Software` text
/// chunk identifying the writer.
pub fn encode_png(surface: &Surface) -> crate::Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, surface.width, surface.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        encoder.add_text_chunk("Software".to_string(), "PutImage".to_string())?;

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&surface.pixels)?;
        writer.finish()?;
    }
    debug!(
        "encoded {}x{} layer into {} bytes",
        surface.width,
        surface.height,
        out.len()
    );
    Ok(out)
}
