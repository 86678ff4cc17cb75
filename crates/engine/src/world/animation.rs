use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationDef {
    pub frames: u32,
    pub fps: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for AnimationDef {
    fn default() -> Self {
        Self {
            frames: 1,
            fps: 1.0,
            looping: true,
        }
    }
}

impl AnimationDef {
    pub fn new(frames: u32, fps: f32, looping: bool) -> Self {
        Self {
            frames,
            fps,
            looping,
        }
    }

    pub fn frame_period_seconds(&self) -> f32 {
        self.fps.recip()
    }

    pub fn last_frame(&self) -> u32 {
        self.frames.max(1) - 1
    }
}

/// Per-entity progress through a named animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    animation: String,
    frame: u32,
    elapsed: f32,
    playing: bool,
}

impl AnimationState {
    pub fn new(animation: impl Into<String>) -> Self {
        Self {
            animation: animation.into(),
            frame: 0,
            elapsed: 0.0,
            playing: true,
        }
    }

    pub fn animation(&self) -> &str {
        &self.animation
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Switches to `animation` from frame 0. Returns whether anything changed;
    /// asking for the current animation without `force_restart` is a no-op.
    pub fn transition(&mut self, animation: &str, force_restart: bool) -> bool {
        if self.animation == animation && !force_restart {
            return false;
        }
        if self.animation != animation {
            self.animation.clear();
            self.animation.push_str(animation);
        }
        self.frame = 0;
        self.elapsed = 0.0;
        self.playing = true;
        true
    }

    /// Advances at most one frame. Returns whether the frame index changed.
    pub fn advance(&mut self, def: &AnimationDef, dt_seconds: f32) -> bool {
        if !self.playing || def.frames <= 1 {
            return false;
        }

        self.elapsed += dt_seconds;
        if self.elapsed < def.frame_period_seconds() {
            return false;
        }

        let previous = self.frame;
        if def.looping {
            self.frame = (self.frame + 1) % def.frames;
        } else {
            self.frame = (self.frame + 1).min(def.last_frame());
            if self.frame >= def.last_frame() {
                self.playing = false;
            }
        }
        // Reset, not decrement: a long dt still advances a single frame.
        self.elapsed = 0.0;
        previous != self.frame
    }
}

/// Named animation definitions shared by every animated entity of a session.
#[derive(Debug, Clone, Default)]
pub struct AnimationRegistry {
    animations: HashMap<String, AnimationDef>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, def: AnimationDef) {
        let def = AnimationDef {
            frames: def.frames.max(1),
            ..def
        };
        self.animations.insert(name.into(), def);
    }

    pub fn with_animation(mut self, name: impl Into<String>, def: AnimationDef) -> Self {
        self.register(name, def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AnimationDef> {
        self.animations.get(name)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn create_state(&self, name: &str) -> AnimationState {
        AnimationState::new(name)
    }

    pub fn set_animation(
        &self,
        state: &mut AnimationState,
        name: &str,
        force_restart: bool,
    ) -> bool {
        state.transition(name, force_restart)
    }

    /// Unregistered animations are treated as static.
    pub fn update_animation(&self, state: &mut AnimationState, dt_seconds: f32) -> bool {
        match self.animations.get(state.animation()) {
            Some(def) => state.advance(def, dt_seconds),
            None => false,
        }
    }
}
