use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::world::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PrimaryAction,
    SecondaryAction,
    Quit,
}

const ACTION_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::PrimaryAction => 4,
            InputAction::SecondaryAction => 5,
            InputAction::Quit => 6,
        }
    }
}

/// Read-only input capability consumed by player-controlled characters.
pub trait InputQuery {
    fn is_moving_up(&self) -> bool;
    fn is_moving_down(&self) -> bool;
    fn is_moving_left(&self) -> bool;
    fn is_moving_right(&self) -> bool;
    fn is_primary_action(&self) -> bool;
    fn is_secondary_action(&self) -> bool;
    /// Canvas coordinates, `None` while the cursor is outside the canvas.
    fn cursor_position(&self) -> Option<Vec2>;
    fn cursor_world_position(&self) -> Option<Vec2> {
        self.cursor_position()
    }
}

/// Held-state input captured once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    cursor_position: Option<Vec2>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        cursor_position: Option<Vec2>,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            cursor_position,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested || self.actions.is_down(InputAction::Quit)
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_cursor_position(mut self, cursor_position: Option<Vec2>) -> Self {
        self.cursor_position = cursor_position;
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }
}

impl InputQuery for InputSnapshot {
    fn is_moving_up(&self) -> bool {
        self.is_down(InputAction::MoveUp)
    }

    fn is_moving_down(&self) -> bool {
        self.is_down(InputAction::MoveDown)
    }

    fn is_moving_left(&self) -> bool {
        self.is_down(InputAction::MoveLeft)
    }

    fn is_moving_right(&self) -> bool {
        self.is_down(InputAction::MoveRight)
    }

    fn is_primary_action(&self) -> bool {
        self.is_down(InputAction::PrimaryAction)
    }

    fn is_secondary_action(&self) -> bool {
        self.is_down(InputAction::SecondaryAction)
    }

    fn cursor_position(&self) -> Option<Vec2> {
        self.cursor_position
    }
}

static INPUT_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_input_lock_poison_once(operation: &'static str) {
    if INPUT_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "input lock poisoned; recovered inner value");
    }
}

/// Shared view of the latest published snapshot. The loop publishes once per
/// tick before any entity updates; bound players query through a clone.
#[derive(Clone, Debug, Default)]
pub struct InputHandle {
    snapshot: Arc<RwLock<InputSnapshot>>,
}

impl InputHandle {
    pub fn snapshot(&self) -> InputSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_input_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub fn publish(&self, snapshot: InputSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_input_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

impl InputQuery for InputHandle {
    fn is_moving_up(&self) -> bool {
        self.snapshot().is_moving_up()
    }

    fn is_moving_down(&self) -> bool {
        self.snapshot().is_moving_down()
    }

    fn is_moving_left(&self) -> bool {
        self.snapshot().is_moving_left()
    }

    fn is_moving_right(&self) -> bool {
        self.snapshot().is_moving_right()
    }

    fn is_primary_action(&self) -> bool {
        self.snapshot().is_primary_action()
    }

    fn is_secondary_action(&self) -> bool {
        self.snapshot().is_secondary_action()
    }

    fn cursor_position(&self) -> Option<Vec2> {
        self.snapshot().cursor_position()
    }
}
