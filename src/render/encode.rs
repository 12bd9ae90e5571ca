use image::ImageEncoder as _;

use crate::{
    foundation::core::{Canvas, Rgba8},
    foundation::error::{SceneError, SceneResult},
    render::backend::FrameRGBA,
};

/// MIME type of every rendered body.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Encode a frame as PNG (straight alpha).
pub fn encode_png(frame: &FrameRGBA) -> SceneResult<Vec<u8>> {
    let expected = (frame.width as usize) * (frame.height as usize) * 4;
    if frame.data.len() != expected {
        return Err(SceneError::render(format!(
            "frame buffer has {} bytes, expected {expected}",
            frame.data.len()
        )));
    }

    let straight;
    let pixels = if frame.premultiplied {
        straight = unpremultiply(&frame.data);
        straight.as_slice()
    } else {
        frame.data.as_slice()
    };

    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            pixels,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| SceneError::render(format!("encode png: {e}")))?;
    Ok(out)
}

/// Flat canvas-sized frame, served when the pipeline itself fails.
pub fn placeholder_frame(canvas: Canvas, color: Rgba8) -> FrameRGBA {
    let px = color.to_premul();
    let mut data = vec![0u8; canvas.pixel_count() * 4];
    crate::render::composite::fill_in_place(&mut data, px);
    FrameRGBA {
        width: canvas.width,
        height: canvas.height,
        data,
        premultiplied: true,
    }
}

fn unpremultiply(rgba: &[u8]) -> Vec<u8> {
    let mut out = rgba.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
