use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use winit::window::Window;

use crate::app::GameLoop;
use crate::world::Vec2;

use super::{FrameSurface, Rgba};

pub const CLEAR_COLOR: Rgba = [0x00, 0x11, 0x22, 0xff];

/// Canvas-sized framebuffer scaled onto the window surface.
pub struct Renderer {
    pixels: Pixels<'static>,
    canvas_width: u32,
    canvas_height: u32,
}

impl Renderer {
    pub fn new(window: Arc<Window>, canvas_width: u32, canvas_height: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, window);
        let pixels = Pixels::new(canvas_width, canvas_height, surface)?;
        Ok(Self {
            pixels,
            canvas_width,
            canvas_height,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    /// Maps a physical window position to canvas pixels; `None` outside the canvas.
    pub fn window_to_canvas(&self, x: f32, y: f32) -> Option<Vec2> {
        self.pixels
            .window_pos_to_pixel((x, y))
            .ok()
            .map(|(px, py)| Vec2::new(px as f32, py as f32))
    }

    pub fn render(&mut self, game: &GameLoop) -> Result<(), Error> {
        draw_frame(
            self.pixels.frame_mut(),
            self.canvas_width,
            self.canvas_height,
            game,
        );
        self.pixels.render()
    }
}

fn draw_frame(frame: &mut [u8], width: u32, height: u32, game: &GameLoop) {
    let mut surface = FrameSurface::new(frame, width, height);
    surface.clear(CLEAR_COLOR);
    game.render(&mut surface);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{InputHandle, InputSnapshot, LoopSettings, Scene, SceneCommand, World};
    use crate::world::{AnimationRegistry, Entity, EntityConfig};

    struct SingleBox;

    impl Scene for SingleBox {
        fn load(&mut self, world: &mut World, _input: &InputHandle) {
            world.spawn(Entity::new(
                5.0,
                5.0,
                EntityConfig {
                    width: 4.0,
                    height: 4.0,
                    ..EntityConfig::default()
                },
            ));
        }

        fn update(&mut self, _dt: f32, _input: &InputSnapshot, _world: &mut World) -> SceneCommand {
            SceneCommand::None
        }
    }

    #[test]
    fn draw_frame_clears_then_draws_world() {
        let mut game = GameLoop::new(
            10.0,
            10.0,
            Arc::new(AnimationRegistry::new()),
            Box::new(SingleBox),
            LoopSettings::default(),
        );
        game.start();
        let mut frame = vec![7u8; 10 * 10 * 4];

        draw_frame(&mut frame, 10, 10, &game);

        let surface = FrameSurface::new(&mut frame, 10, 10);
        assert_eq!(surface.pixel(0, 0), Some(CLEAR_COLOR));
        assert_eq!(surface.pixel(5, 5), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(8, 8), Some(CLEAR_COLOR));
    }
}
