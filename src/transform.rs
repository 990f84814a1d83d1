use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel, Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

pub fn content_bounds<P, F>(image: &ImageBuffer<P, Vec<P::Subpixel>>, is_ink: F) -> Option<Bounds>
where
    P: Pixel,
    F: Fn(&P) -> bool,
{
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for (x, y, pixel) in image.enumerate_pixels() {
        if is_ink(pixel) {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    found.then(|| Bounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

pub fn alpha_bounds(image: &RgbaImage) -> Option<Bounds> {
    content_bounds(image, |p| p.0[3] > 0)
}

pub fn crop(image: &RgbaImage, bounds: Bounds) -> RgbaImage {
    imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height).to_image()
}

/// Rotates counter-clockwise by `degrees`, growing the canvas so no pixel is clipped.
/// Non-quarter turns are resampled bicubically on premultiplied alpha.
pub fn rotate_expand(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        return image.clone();
    }
    if normalized == 90.0 {
        return imageops::rotate270(image);
    }
    if normalized == 180.0 {
        return imageops::rotate180(image);
    }
    if normalized == 270.0 {
        return imageops::rotate90(image);
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let theta = normalized.to_radians() as f64;
    let (sin, cos) = theta.sin_cos();
    let (w, h) = (width as f64, height as f64);

    let out_width = expanded_extent(w * cos.abs() + h * sin.abs());
    let out_height = expanded_extent(w * sin.abs() + h * cos.abs());

    let (src_cx, src_cy) = (w / 2.0, h / 2.0);
    let (dst_cx, dst_cy) = (out_width as f64 / 2.0, out_height as f64 / 2.0);

    let mut rotated = RgbaImage::new(out_width, out_height);
    for (x, y, pixel) in rotated.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - dst_cx;
        let dy = y as f64 + 0.5 - dst_cy;
        // Inverse mapping of a visual counter-clockwise turn in y-down space.
        let sx = dx * cos - dy * sin + src_cx - 0.5;
        let sy = dx * sin + dy * cos + src_cy - 0.5;
        *pixel = sample_bicubic(image, sx, sy);
    }
    rotated
}

fn expanded_extent(extent: f64) -> u32 {
    ((extent - 1e-6).ceil() as u32).max(1)
}

fn cubic_weight(t: f64) -> f64 {
    const A: f64 = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}

fn sample_bicubic(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (width, height) = image.dimensions();
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    if x0 + 2 < 0 || y0 + 2 < 0 || x0 - 1 >= width as i64 || y0 - 1 >= height as i64 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut premultiplied = [0.0f64; 3];
    let mut alpha = 0.0f64;

    for py in (y0 - 1)..=(y0 + 2) {
        if py < 0 || py >= height as i64 {
            continue;
        }
        let wy = cubic_weight(y - py as f64);
        for px in (x0 - 1)..=(x0 + 2) {
            if px < 0 || px >= width as i64 {
                continue;
            }
            let weight = wy * cubic_weight(x - px as f64);
            let source = image.get_pixel(px as u32, py as u32);
            let a = source.0[3] as f64 / 255.0;
            if a == 0.0 {
                continue;
            }
            for (acc, channel) in premultiplied.iter_mut().zip(&source.0[..3]) {
                *acc += *channel as f64 * a * weight;
            }
            alpha += a * weight;
        }
    }

    let alpha = alpha.clamp(0.0, 1.0);
    let a = (alpha * 255.0).round() as u8;
    if a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let unpremultiply = |c: f64| (c / alpha).round().clamp(0.0, 255.0) as u8;
    Rgba([
        unpremultiply(premultiplied[0]),
        unpremultiply(premultiplied[1]),
        unpremultiply(premultiplied[2]),
        a,
    ])
}

// Never upscales.
pub fn fit_to_bounds(image: &RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width <= max_width && height <= max_height {
        return image.clone();
    }

    let factor = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let scaled = |extent: u32| ((extent as f64 * factor + 1e-9).floor() as u32).max(1);
    let (new_width, new_height) = (scaled(width), scaled(height));

    log::debug!(
        "Resizing {}x{} to {}x{} (factor {:.4})",
        width,
        height,
        new_width,
        new_height,
        factor
    );
    imageops::resize(image, new_width, new_height, FilterType::Lanczos3)
}
