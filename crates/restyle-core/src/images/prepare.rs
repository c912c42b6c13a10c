//! Crop/resize/encode of a picked photo before it is uploaded.

use std::path::Path;

use crate::error::{RestyleError, Result};

/// JPEG quality used for uploads. Maximum, so the host sees the original detail.
pub const UPLOAD_JPEG_QUALITY: u8 = 100;

/// A picked photo re-encoded as JPEG, with original dimensions.
#[derive(Debug, Clone)]
pub struct PreparedPhoto {
    pub jpeg_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source_width: u32,
    pub source_height: u32,
}

/// Decodes a photo, center-crops it to `aspect`, downscales it so the longest side
/// is at most `max_dimension` (0 disables), and encodes it as JPEG.
///
/// # Errors
/// Returns an error if file I/O, decoding, resizing or encoding fails.
pub fn prepare_for_upload(
    image_path: &Path,
    aspect: (u32, u32),
    max_dimension: u32,
) -> Result<PreparedPhoto> {
    let data = std::fs::read(image_path)?;
    let reader = image::ImageReader::new(std::io::Cursor::new(data)).with_guessed_format()?;
    let source = reader.decode()?;
    let (source_width, source_height) = (source.width(), source.height());

    let (x, y, w, h) = crop_rect(source_width, source_height, aspect);
    let cropped = source.crop_imm(x, y, w, h);

    let (dst_w, dst_h) = fit_within(w, h, max_dimension);
    let resized = if (dst_w, dst_h) == (w, h) {
        cropped
    } else {
        resize_image(&cropped, dst_w, dst_h)?
    };

    let jpeg_bytes = encode_jpeg(&resized)?;

    Ok(PreparedPhoto {
        jpeg_bytes,
        width: resized.width(),
        height: resized.height(),
        source_width,
        source_height,
    })
}

/// Largest centered rectangle with the requested aspect ratio.
fn crop_rect(width: u32, height: u32, aspect: (u32, u32)) -> (u32, u32, u32, u32) {
    let (aw, ah) = (u64::from(aspect.0.max(1)), u64::from(aspect.1.max(1)));
    let (w, h) = (u64::from(width), u64::from(height));

    let (crop_w, crop_h) = if w * ah > h * aw {
        (h * aw / ah, h)
    } else {
        (w, w * ah / aw)
    };
    let crop_w = crop_w.max(1).min(w) as u32;
    let crop_h = crop_h.max(1).min(h) as u32;

    ((width - crop_w) / 2, (height - crop_h) / 2, crop_w, crop_h)
}

fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if max_dimension == 0 || longest <= max_dimension {
        return (width, height);
    }
    let scale = |side: u32| {
        let scaled = u64::from(side) * u64::from(max_dimension) / u64::from(longest);
        (scaled as u32).max(1)
    };
    (scale(width), scale(height))
}

fn resize_image(
    src: &image::DynamicImage,
    dst_w: u32,
    dst_h: u32,
) -> Result<image::DynamicImage> {
    use fast_image_resize as fir;

    let src_rgb = src.to_rgb8();
    let (src_w, src_h) = src_rgb.dimensions();

    let src_image =
        fir::images::Image::from_vec_u8(src_w, src_h, src_rgb.into_raw(), fir::PixelType::U8x3)
            .map_err(|e| RestyleError::Resize(e.to_string()))?;

    let mut dst_image = fir::images::Image::new(dst_w, dst_h, fir::PixelType::U8x3);
    let mut resizer = fir::Resizer::new();
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| RestyleError::Resize(e.to_string()))?;

    let rgb = image::RgbImage::from_raw(dst_w, dst_h, dst_image.into_vec())
        .ok_or_else(|| RestyleError::Resize("invalid output buffer".to_string()))?;
    Ok(image::DynamicImage::ImageRgb8(rgb))
}

fn encode_jpeg(img: &image::DynamicImage) -> Result<Vec<u8>> {
    use image::ImageEncoder as _;
    use image::codecs::jpeg::JpegEncoder;

    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, UPLOAD_JPEG_QUALITY).write_image(
        rgb.as_raw(),
        w,
        h,
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}
