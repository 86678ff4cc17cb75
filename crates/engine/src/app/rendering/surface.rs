use crate::world::{Rect, Vec2};

pub type Rgba = [u8; 4];

/// A borrowed sub-rectangle of an RGBA8 image.
#[derive(Debug, Clone, Copy)]
pub struct RgbaRegion<'a> {
    pub rgba: &'a [u8],
    pub image_width: u32,
    pub image_height: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Drawing target handed to entities and sprites. Coordinates are canvas pixels.
pub trait RenderSurface {
    fn size(&self) -> (u32, u32);
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn stroke_rect(&mut self, rect: Rect, color: Rgba);
    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Rgba);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    fn blit_rgba(&mut self, region: RgbaRegion<'_>, left: i32, top: i32);
}

/// Clipping software rasterizer over a tightly packed RGBA8 frame.
pub struct FrameSurface<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> FrameSurface<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.frame.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn put(&mut self, x: i32, y: i32, color: Rgba) {
        if x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        write_pixel_rgba_clipped(self.frame, self.width as usize, x, y, color);
    }
}

impl RenderSurface for FrameSurface<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let (left, top, right, bottom) = pixel_span(rect);
        let left = left.max(0);
        let top = top.max(0);
        let right = right.min(self.width as i32);
        let bottom = bottom.min(self.height as i32);
        for y in top..bottom {
            for x in left..right {
                self.put(x, y, color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba) {
        let (left, top, right, bottom) = pixel_span(rect);
        if left >= right || top >= bottom {
            return;
        }
        let (right, bottom) = (right - 1, bottom - 1);
        for x in left..=right {
            self.put(x, top, color);
            self.put(x, bottom, color);
        }
        for y in top..=bottom {
            self.put(left, y, color);
            self.put(right, y, color);
        }
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Rgba) {
        let (mut x0, mut y0) = (from.x.round() as i32, from.y.round() as i32);
        let (x1, y1) = (to.x.round() as i32, to.y.round() as i32);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let radius = radius.round() as i32;
        if radius <= 0 {
            return;
        }
        let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
        let mut x = radius;
        let mut y = 0;
        let mut err = 1 - radius;
        while x >= y {
            for (px, py) in [
                (x, y),
                (y, x),
                (-y, x),
                (-x, y),
                (-x, -y),
                (-y, -x),
                (y, -x),
                (x, -y),
            ] {
                self.put(cx + px, cy + py, color);
            }
            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }

    fn blit_rgba(&mut self, region: RgbaRegion<'_>, left: i32, top: i32) {
        let expected_len = region.image_width as usize * region.image_height as usize * 4;
        if region.rgba.len() < expected_len
            || region.x.saturating_add(region.width) > region.image_width
            || region.y.saturating_add(region.height) > region.image_height
        {
            return;
        }

        let image_width = region.image_width as usize;
        for row in 0..region.height {
            let dst_y = top + row as i32;
            if dst_y < 0 || dst_y >= self.height as i32 {
                continue;
            }
            let src_row_offset = (region.y + row) as usize * image_width * 4;
            for col in 0..region.width {
                let dst_x = left + col as i32;
                if dst_x < 0 || dst_x >= self.width as i32 {
                    continue;
                }
                let src_offset = src_row_offset + (region.x + col) as usize * 4;
                let alpha = region.rgba[src_offset + 3];
                if alpha == 0 {
                    continue;
                }
                self.put(
                    dst_x,
                    dst_y,
                    [
                        region.rgba[src_offset],
                        region.rgba[src_offset + 1],
                        region.rgba[src_offset + 2],
                        alpha,
                    ],
                );
            }
        }
    }
}

fn pixel_span(rect: Rect) -> (i32, i32, i32, i32) {
    (
        rect.x.round() as i32,
        rect.y.round() as i32,
        rect.right().round() as i32,
        rect.bottom().round() as i32,
    )
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: Rgba) {
    if x < 0 || y < 0 {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = [255, 0, 0, 255];
    const BLACK: Rgba = [0, 0, 0, 255];

    fn frame(width: u32, height: u32) -> Vec<u8> {
        vec![0; width as usize * height as usize * 4]
    }

    #[test]
    fn fill_rect_is_clipped_to_surface() {
        let mut buffer = frame(8, 8);
        let mut surface = FrameSurface::new(&mut buffer, 8, 8);
        surface.clear(BLACK);
        surface.fill_rect(
            Rect {
                x: -4.0,
                y: 6.0,
                width: 6.0,
                height: 6.0,
            },
            RED,
        );

        assert_eq!(surface.pixel(0, 7), Some(RED));
        assert_eq!(surface.pixel(1, 6), Some(RED));
        assert_eq!(surface.pixel(2, 6), Some(BLACK));
        assert_eq!(surface.pixel(0, 5), Some(BLACK));
    }

    #[test]
    fn stroke_rect_leaves_interior_untouched() {
        let mut buffer = frame(8, 8);
        let mut surface = FrameSurface::new(&mut buffer, 8, 8);
        surface.clear(BLACK);
        surface.stroke_rect(
            Rect {
                x: 1.0,
                y: 1.0,
                width: 5.0,
                height: 5.0,
            },
            RED,
        );

        assert_eq!(surface.pixel(1, 1), Some(RED));
        assert_eq!(surface.pixel(5, 5), Some(RED));
        assert_eq!(surface.pixel(3, 3), Some(BLACK));
        assert_eq!(surface.pixel(6, 6), Some(BLACK));
    }

    #[test]
    fn line_hits_both_endpoints() {
        let mut buffer = frame(10, 10);
        let mut surface = FrameSurface::new(&mut buffer, 10, 10);
        surface.draw_line(Vec2::new(1.0, 1.0), Vec2::new(8.0, 5.0), RED);

        assert_eq!(surface.pixel(1, 1), Some(RED));
        assert_eq!(surface.pixel(8, 5), Some(RED));
    }

    #[test]
    fn circle_outline_touches_axis_extremes() {
        let mut buffer = frame(16, 16);
        let mut surface = FrameSurface::new(&mut buffer, 16, 16);
        surface.stroke_circle(Vec2::new(8.0, 8.0), 4.0, RED);

        assert_eq!(surface.pixel(12, 8), Some(RED));
        assert_eq!(surface.pixel(4, 8), Some(RED));
        assert_eq!(surface.pixel(8, 4), Some(RED));
        assert_eq!(surface.pixel(8, 12), Some(RED));
        assert_eq!(surface.pixel(8, 8), Some([0, 0, 0, 0]));
    }

    #[test]
    fn blit_skips_transparent_pixels_and_clips() {
        let rgba = vec![
            10, 20, 30, 255, 0, 0, 0, 0, //
            40, 50, 60, 255, 70, 80, 90, 255,
        ];
        let mut buffer = frame(4, 4);
        let mut surface = FrameSurface::new(&mut buffer, 4, 4);
        surface.clear(BLACK);
        surface.blit_rgba(
            RgbaRegion {
                rgba: &rgba,
                image_width: 2,
                image_height: 2,
                x: 0,
                y: 0,
                width: 2,
                height: 2,
            },
            -1,
            2,
        );

        assert_eq!(surface.pixel(0, 2), Some(BLACK));
        assert_eq!(surface.pixel(0, 3), Some([70, 80, 90, 255]));
    }

    #[test]
    fn blit_rejects_region_outside_image() {
        let rgba = vec![255; 4];
        let mut buffer = frame(2, 2);
        let mut surface = FrameSurface::new(&mut buffer, 2, 2);
        surface.blit_rgba(
            RgbaRegion {
                rgba: &rgba,
                image_width: 1,
                image_height: 1,
                x: 1,
                y: 0,
                width: 1,
                height: 1,
            },
            0,
            0,
        );

        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
    }
}
