use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use thiserror::Error;

use crate::app::{RenderSurface, RgbaRegion};

use super::{AnimationRegistry, AnimationState, Direction};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDimensions {
    pub width: f32,
    pub height: f32,
}

/// Rendering delegate attached to an entity. The simulation never looks
/// inside; it only reports animation changes, time, and where to draw.
pub trait Sprite {
    fn dimensions(&self) -> SpriteDimensions;
    fn set_animation(&mut self, name: &str);
    fn update(&mut self, dt_seconds: f32);
    /// Returns false when there was nothing to draw; the entity then falls
    /// back to its plain box.
    fn render(&self, surface: &mut dyn RenderSurface, x: f32, y: f32, direction: Direction)
        -> bool;
}

impl fmt::Debug for dyn Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("dimensions", &self.dimensions())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("failed to open sprite sheet {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode sprite sheet {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("sprite sheet pixel data is {actual} bytes, expected {expected}")]
    PixelDataMismatch { expected: usize, actual: usize },
    #[error("sprite frame size must be non-zero, got {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
    #[error("sprite sheet {width}x{height} is smaller than one {frame_width}x{frame_height} frame")]
    SheetTooSmall {
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
    #[error(
        "sprite sheet {width}x{height} cannot hold animation '{animation}': \
needs {frames} columns and {rows} rows of {frame_width}x{frame_height} frames"
    )]
    AnimationOutsideSheet {
        animation: String,
        frames: u32,
        rows: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
}

/// Grid layout of a sheet: one block of rows per animation, in `animations`
/// order. Directional sheets use four rows per block (N, E, S, W).
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub frame_width: u32,
    pub frame_height: u32,
    pub animations: Vec<String>,
    pub directional: bool,
}

impl SheetLayout {
    fn rows_per_animation(&self) -> u32 {
        if self.directional {
            Direction::ALL.len() as u32
        } else {
            1
        }
    }

    fn row_for(&self, animation: &str, direction: Direction) -> Option<u32> {
        let block = self
            .animations
            .iter()
            .position(|name| name == animation)? as u32;
        let offset = if self.directional {
            direction.index() as u32
        } else {
            0
        };
        Some(block * self.rows_per_animation() + offset)
    }
}

#[derive(Debug)]
pub struct SpriteSheet {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    layout: SheetLayout,
}

impl SpriteSheet {
    pub fn from_rgba(
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        layout: SheetLayout,
    ) -> Result<Self, SpriteError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(SpriteError::PixelDataMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        if layout.frame_width == 0 || layout.frame_height == 0 {
            return Err(SpriteError::EmptyFrame {
                width: layout.frame_width,
                height: layout.frame_height,
            });
        }
        if layout.frame_width > width || layout.frame_height > height {
            return Err(SpriteError::SheetTooSmall {
                width,
                height,
                frame_width: layout.frame_width,
                frame_height: layout.frame_height,
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
            layout,
        })
    }

    pub fn load(path: &Path, layout: SheetLayout) -> Result<Self, SpriteError> {
        let reader = ImageReader::open(path).map_err(|source| SpriteError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| SpriteError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let image = decoded.to_rgba8();
        Self::from_rgba(image.width(), image.height(), image.into_raw(), layout)
    }

    /// Checks that every animation block of the layout, with the frame count
    /// the registry gives it, lies inside the sheet.
    pub fn check_coverage(&self, animations: &AnimationRegistry) -> Result<(), SpriteError> {
        let columns = self.width / self.layout.frame_width;
        let rows = self.height / self.layout.frame_height;
        for (block, name) in self.layout.animations.iter().enumerate() {
            let frames = animations.get(name).map_or(1, |def| def.frames.max(1));
            let rows_needed = (block as u32 + 1) * self.layout.rows_per_animation();
            if frames > columns || rows_needed > rows {
                return Err(SpriteError::AnimationOutsideSheet {
                    animation: name.clone(),
                    frames,
                    rows: rows_needed,
                    width: self.width,
                    height: self.height,
                    frame_width: self.layout.frame_width,
                    frame_height: self.layout.frame_height,
                });
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel region for a frame, `None` when the sheet has no such cell.
    pub fn frame_region(
        &self,
        animation: &str,
        frame: u32,
        direction: Direction,
    ) -> Option<RgbaRegion<'_>> {
        let row = self.layout.row_for(animation, direction)?;
        let x = frame.checked_mul(self.layout.frame_width)?;
        let y = row.checked_mul(self.layout.frame_height)?;
        if x.checked_add(self.layout.frame_width)? > self.width
            || y.checked_add(self.layout.frame_height)? > self.height
        {
            return None;
        }
        Some(RgbaRegion {
            rgba: &self.rgba,
            image_width: self.width,
            image_height: self.height,
            x,
            y,
            width: self.layout.frame_width,
            height: self.layout.frame_height,
        })
    }
}

/// Sprite backed by a shared sheet, advancing its own animation state
/// against the session's animation registry.
#[derive(Debug)]
pub struct SheetSprite {
    sheet: Arc<SpriteSheet>,
    animations: Arc<AnimationRegistry>,
    state: AnimationState,
}

impl SheetSprite {
    pub fn new(
        sheet: Arc<SpriteSheet>,
        animations: Arc<AnimationRegistry>,
        initial_animation: &str,
    ) -> Self {
        let state = animations.create_state(initial_animation);
        Self {
            sheet,
            animations,
            state,
        }
    }

    pub fn animation_state(&self) -> &AnimationState {
        &self.state
    }
}

impl Sprite for SheetSprite {
    fn dimensions(&self) -> SpriteDimensions {
        let layout = self.sheet.layout();
        SpriteDimensions {
            width: layout.frame_width as f32,
            height: layout.frame_height as f32,
        }
    }

    fn set_animation(&mut self, name: &str) {
        self.animations.set_animation(&mut self.state, name, false);
    }

    fn update(&mut self, dt_seconds: f32) {
        self.animations.update_animation(&mut self.state, dt_seconds);
    }

    fn render(
        &self,
        surface: &mut dyn RenderSurface,
        x: f32,
        y: f32,
        direction: Direction,
    ) -> bool {
        let Some(region) =
            self.sheet
                .frame_region(self.state.animation(), self.state.frame(), direction)
        else {
            return false;
        };
        let left = (x - region.width as f32 / 2.0).round() as i32;
        let top = (y - region.height as f32 / 2.0).round() as i32;
        surface.blit_rgba(region, left, top);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FrameSurface;
    use crate::world::{AnimationDef, Character, CharacterConfig};
    use tempfile::TempDir;

    fn layout(directional: bool) -> SheetLayout {
        SheetLayout {
            frame_width: 2,
            frame_height: 2,
            animations: vec!["idle".to_string(), "walk".to_string()],
            directional,
        }
    }

    // 4 frames wide; every cell is filled with a colour encoding (column, row).
    fn sheet_pixels(columns: u32, rows: u32) -> (u32, u32, Vec<u8>) {
        let width = columns * 2;
        let height = rows * 2;
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&[(x / 2) as u8, (y / 2) as u8, 0, 255]);
            }
        }
        (width, height, rgba)
    }

    #[test]
    fn from_rgba_rejects_wrong_length() {
        let error = SpriteSheet::from_rgba(2, 2, vec![0; 3], layout(false)).expect_err("error");
        assert!(matches!(
            error,
            SpriteError::PixelDataMismatch {
                expected: 16,
                actual: 3
            }
        ));
    }

    #[test]
    fn from_rgba_rejects_zero_frame() {
        let mut layout = layout(false);
        layout.frame_width = 0;
        let error = SpriteSheet::from_rgba(2, 2, vec![0; 16], layout).expect_err("error");
        assert!(matches!(error, SpriteError::EmptyFrame { .. }));
    }

    #[test]
    fn frame_region_uses_direction_rows_for_directional_sheets() {
        let (width, height, rgba) = sheet_pixels(4, 8);
        let sheet = SpriteSheet::from_rgba(width, height, rgba, layout(true)).expect("sheet");

        let region = sheet
            .frame_region("walk", 3, Direction::West)
            .expect("region");
        assert_eq!((region.x, region.y), (6, 14));

        let region = sheet
            .frame_region("idle", 0, Direction::East)
            .expect("region");
        assert_eq!((region.x, region.y), (0, 2));
    }

    #[test]
    fn frame_region_is_none_outside_sheet_or_for_unknown_animation() {
        let (width, height, rgba) = sheet_pixels(4, 2);
        let sheet = SpriteSheet::from_rgba(width, height, rgba, layout(false)).expect("sheet");

        assert!(sheet.frame_region("walk", 4, Direction::South).is_none());
        assert!(sheet.frame_region("attack", 0, Direction::South).is_none());
        assert!(sheet.frame_region("walk", 1, Direction::South).is_some());
    }

    #[test]
    fn sheet_sprite_advances_and_draws_current_frame() {
        let (width, height, rgba) = sheet_pixels(4, 2);
        let sheet = Arc::new(SpriteSheet::from_rgba(width, height, rgba, layout(false)).expect("sheet"));
        let registry = Arc::new(
            AnimationRegistry::new().with_animation("walk", AnimationDef::new(4, 10.0, true)),
        );
        let mut sprite = SheetSprite::new(sheet, registry, "idle");
        sprite.set_animation("walk");
        sprite.update(0.2);
        assert_eq!(sprite.animation_state().frame(), 1);

        let mut buffer = vec![0u8; 8 * 8 * 4];
        let mut surface = FrameSurface::new(&mut buffer, 8, 8);
        assert!(sprite.render(&mut surface, 4.0, 4.0, Direction::South));

        assert_eq!(surface.pixel(3, 3), Some([1, 1, 0, 255]));
        assert_eq!(surface.pixel(4, 4), Some([1, 1, 0, 255]));
        assert_eq!(surface.pixel(2, 2), Some([0, 0, 0, 0]));
        assert_eq!(
            sprite.dimensions(),
            SpriteDimensions {
                width: 2.0,
                height: 2.0
            }
        );
    }

    #[test]
    fn load_reads_png_from_disk() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("hero.png");
        let (width, height, rgba) = sheet_pixels(2, 2);
        image::RgbaImage::from_raw(width, height, rgba)
            .expect("image")
            .save(&path)
            .expect("save png");

        let sheet = SpriteSheet::load(&path, layout(false)).expect("load");
        assert_eq!(sheet.size(), (4, 4));
    }

    #[test]
    fn load_reports_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        let error = SpriteSheet::load(&temp.path().join("missing.png"), layout(false))
            .expect_err("error");
        assert!(matches!(error, SpriteError::Open { .. }));
    }

    #[test]
    fn coverage_accepts_sheet_holding_every_frame() {
        let (width, height, rgba) = sheet_pixels(4, 2);
        let sheet = SpriteSheet::from_rgba(width, height, rgba, layout(false)).expect("sheet");
        let registry = AnimationRegistry::new()
            .with_animation("idle", AnimationDef::new(1, 1.0, true))
            .with_animation("walk", AnimationDef::new(4, 8.0, true));

        assert!(sheet.check_coverage(&registry).is_ok());
    }

    #[test]
    fn coverage_rejects_missing_columns_and_rows() {
        let registry =
            AnimationRegistry::new().with_animation("walk", AnimationDef::new(4, 8.0, true));

        let (width, height, rgba) = sheet_pixels(2, 2);
        let narrow = SpriteSheet::from_rgba(width, height, rgba, layout(false)).expect("sheet");
        let error = narrow.check_coverage(&registry).expect_err("too narrow");
        assert!(matches!(
            error,
            SpriteError::AnimationOutsideSheet { ref animation, frames: 4, .. } if animation == "walk"
        ));

        let (width, height, rgba) = sheet_pixels(4, 4);
        let short = SpriteSheet::from_rgba(width, height, rgba, layout(true)).expect("sheet");
        let error = short.check_coverage(&registry).expect_err("too short");
        assert!(matches!(
            error,
            SpriteError::AnimationOutsideSheet { rows: 8, .. }
        ));
    }

    #[test]
    fn walking_character_stays_drawn_past_the_last_sheet_column() {
        let (width, height, rgba) = sheet_pixels(2, 2);
        let sheet = Arc::new(SpriteSheet::from_rgba(width, height, rgba, layout(false)).expect("sheet"));
        let registry = Arc::new(
            AnimationRegistry::new()
                .with_animation("idle", AnimationDef::new(1, 1.0, true))
                .with_animation("walk", AnimationDef::new(4, 8.0, true)),
        );
        let mut character = Character::new(
            4.0,
            4.0,
            CharacterConfig {
                speed: 1.0,
                ..CharacterConfig::default()
            },
        );
        character.set_sprite(Box::new(SheetSprite::new(sheet, Arc::clone(&registry), "idle")));
        character.set_movement(1.0, 0.0);

        for tick in 0..4 {
            character.update(0.13, &registry);
            let mut buffer = vec![0u8; 8 * 8 * 4];
            let mut surface = FrameSurface::new(&mut buffer, 8, 8);
            character.render(&mut surface, false);
            assert!(
                buffer.chunks(4).any(|pixel| pixel[3] != 0),
                "tick {tick} drew nothing"
            );
        }
    }
}
