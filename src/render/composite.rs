use crate::{
    assets::store::PreparedImage,
    config::engine::DimTreatment,
    foundation::error::{SceneError, SceneResult},
    foundation::math::{mul_div255_u8, unit_to_u8},
};

pub type PremulRgba8 = [u8; 4];

/// Resampling filter used when fitting sprites and backgrounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    /// Nearest neighbour.
    Nearest,
    /// Bilinear.
    Triangle,
    /// Lanczos with a 3-lobe window.
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    fn to_image(self) -> image::imageops::FilterType {
        match self {
            ResizeFilter::Nearest => image::imageops::FilterType::Nearest,
            ResizeFilter::Triangle => image::imageops::FilterType::Triangle,
            ResizeFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = unit_to_u8(opacity);
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

pub fn fill_in_place(dst: &mut [u8], color: PremulRgba8) {
    for px in dst.chunks_exact_mut(4) {
        px.copy_from_slice(&color);
    }
}

/// Darken and desaturate premultiplied pixels in place.
pub fn dim_in_place(rgba: &mut [u8], treatment: DimTreatment) {
    let brightness = treatment.brightness.clamp(0.0, 1.0);
    let saturation = treatment.saturation.clamp(0.0, 1.0);
    for px in rgba.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        let a = f32::from(px[3]);
        let [r, g, b] = [f32::from(px[0]), f32::from(px[1]), f32::from(px[2])];
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        for (c, v) in px[..3].iter_mut().zip([r, g, b]) {
            let desat = luma + saturation * (v - luma);
            *c = (desat * brightness).round().clamp(0.0, a) as u8;
        }
    }
}

/// Resample a prepared image to `width x height`, keeping premultiplied invariants.
pub fn resize_premul(
    img: &PreparedImage,
    width: u32,
    height: u32,
    filter: ResizeFilter,
) -> SceneResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(SceneError::render("resize target must be non-empty"));
    }
    if img.width == width && img.height == height {
        return Ok(img.rgba8_premul.as_ref().clone());
    }

    let src = image::RgbaImage::from_raw(img.width, img.height, img.rgba8_premul.to_vec())
        .ok_or_else(|| SceneError::render("prepared image buffer does not match its size"))?;
    let mut out = image::imageops::resize(&src, width, height, filter.to_image()).into_raw();

    // Lanczos ringing can push a colour channel above alpha.
    for px in out.chunks_exact_mut(4) {
        let a = px[3];
        for c in &mut px[..3] {
            *c = (*c).min(a);
        }
    }
    Ok(out)
}

/// Paint `src` over `dst` with its top-left at `(left, top)`, clipping to `dst`.
///
/// Only the first `src_rows` rows of `src` are painted.
#[allow(clippy::too_many_arguments)]
pub fn blit_over(
    dst: &mut [u8],
    dst_width: u32,
    dst_height: u32,
    src: &[u8],
    src_width: u32,
    src_rows: u32,
    left: i32,
    top: i32,
) -> SceneResult<()> {
    if dst.len() != (dst_width as usize) * (dst_height as usize) * 4 {
        return Err(SceneError::render("blit target buffer does not match its size"));
    }
    if src.len() < (src_width as usize) * (src_rows as usize) * 4 {
        return Err(SceneError::render("blit source buffer is too short"));
    }

    let x0 = i64::from(left).max(0);
    let x1 = (i64::from(left) + i64::from(src_width)).min(i64::from(dst_width));
    let y0 = i64::from(top).max(0);
    let y1 = (i64::from(top) + i64::from(src_rows)).min(i64::from(dst_height));
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    for y in y0..y1 {
        let sy = (y - i64::from(top)) as usize;
        let sx0 = (x0 - i64::from(left)) as usize;
        let span = (x1 - x0) as usize;
        let s_row = &src[(sy * src_width as usize + sx0) * 4..][..span * 4];
        let d_start = (y as usize * dst_width as usize + x0 as usize) * 4;
        let d_row = &mut dst[d_start..][..span * 4];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], 1.0);
            d.copy_from_slice(&out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
