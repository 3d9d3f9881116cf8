use anyhow::{Context, Result};
use zbus::zvariant::{OwnedValue, Type, Value};

use crate::icon::IconImage;

/// Icon pixmap matching the StatusNotifierItem D-Bus specification.
/// Format: a(iiay) - (width: i32, height: i32, data: Vec<u8>), with data as
/// ARGB32 pixels in network byte order.
#[derive(Debug, Clone, Type, Value, OwnedValue)]
pub(crate) struct SniIcon {
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

/// Converts raw RGBA pixels to the SNI ARGB32 pixmap format.
///
/// Each pixel is packed as a 32-bit big-endian integer:
/// `(A << 24) | (R << 16) | (G << 8) | B`.
pub(crate) fn image_to_sni_icon(image: &IconImage) -> SniIcon {
    let mut argb_data = Vec::with_capacity(image.rgba.len());

    for chunk in image.rgba.chunks_exact(4) {
        let r = chunk[0];
        let g = chunk[1];
        let b = chunk[2];
        let a = chunk[3];

        let argb: u32 = ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32);
        argb_data.extend_from_slice(&argb.to_be_bytes());
    }

    SniIcon {
        width: image.width as i32,
        height: image.height as i32,
        data: argb_data,
    }
}

/// Encodes raw RGBA pixels as a PNG byte stream, the format the DBusMenu
/// `icon-data` property carries.
pub(crate) fn image_to_png(image: &IconImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    let mut encoder = png::Encoder::new(&mut out, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header().context("failed to write PNG header")?;
    writer
        .write_image_data(&image.rgba)
        .context("failed to encode PNG image data")?;
    writer.finish().context("failed to finish PNG stream")?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_to_argb32_conversion() {
        // A single red pixel: R=255, G=0, B=0, A=255
        let image = IconImage {
            width: 1,
            height: 1,
            rgba: vec![255, 0, 0, 255],
        };

        let sni_icon = image_to_sni_icon(&image);

        assert_eq!(sni_icon.width, 1);
        assert_eq!(sni_icon.height, 1);
        // ARGB big-endian: A=255, R=255, G=0, B=0
        assert_eq!(&sni_icon.data, &[255, 255, 0, 0]);
    }

    #[test]
    fn png_encoding_is_decodable() {
        let image = IconImage {
            width: 2,
            height: 2,
            rgba: vec![128; 16],
        };

        let data = image_to_png(&image).unwrap();
        let decoded = image::load_from_memory(&data).unwrap();

        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 2);
    }
}
