use crate::action::{Action, Direction, KeyBindings};
use winit::keyboard::KeyCode;

/// The four held-direction booleans. Opposing flags may both be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionFlags {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionFlags {
    pub fn get(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set(&mut self, direction: Direction, held: bool) {
        let flag = match direction {
            Direction::Forward => &mut self.forward,
            Direction::Backward => &mut self.backward,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        };
        *flag = held;
    }

    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Directions currently held, in application order.
    pub fn held(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.get(*d))
    }
}

/// Keyboard state: bindings plus the flags they drive.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    bindings: KeyBindings,
    flags: DirectionFlags,
}

impl InputState {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            flags: DirectionFlags::default(),
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn flags(&self) -> DirectionFlags {
        self.flags
    }

    pub fn on_key_down(&mut self, key: KeyCode) {
        if let Some(action) = self.bindings.action(key, true) {
            self.apply(action);
        }
    }

    pub fn on_key_up(&mut self, key: KeyCode) {
        if let Some(action) = self.bindings.action(key, false) {
            self.apply(action);
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Press(d) => {
                if !self.flags.get(d) {
                    tracing::trace!("{} held", d.name());
                }
                self.flags.set(d, true);
            }
            Action::Release(d) => self.flags.set(d, false),
        }
    }

    /// Drop every held direction, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.flags = DirectionFlags::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_down_sets_and_key_up_clears() {
        let mut input = InputState::default();
        input.on_key_down(KeyCode::KeyW);
        assert!(input.flags().forward);
        input.on_key_up(KeyCode::KeyW);
        assert!(!input.flags().forward);
    }

    #[test]
    fn repeated_key_down_is_idempotent() {
        let mut input = InputState::default();
        input.on_key_down(KeyCode::KeyD);
        input.on_key_down(KeyCode::KeyD);
        input.on_key_down(KeyCode::KeyD);
        assert_eq!(
            input.flags(),
            DirectionFlags {
                right: true,
                ..DirectionFlags::default()
            }
        );
        input.on_key_up(KeyCode::KeyD);
        assert!(!input.flags().any());
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let mut input = InputState::default();
        input.on_key_down(KeyCode::KeyZ);
        input.on_key_up(KeyCode::Enter);
        assert_eq!(input.flags(), DirectionFlags::default());
    }

    #[test]
    fn opposing_keys_can_be_held_together() {
        let mut input = InputState::default();
        input.on_key_down(KeyCode::KeyW);
        input.on_key_down(KeyCode::KeyS);
        input.on_key_down(KeyCode::KeyA);
        input.on_key_down(KeyCode::KeyD);
        let held: Vec<_> = input.flags().held().collect();
        assert_eq!(held, Direction::ALL.to_vec());
    }

    #[test]
    fn release_all_clears_flags() {
        let mut input = InputState::default();
        input.apply(Action::Press(Direction::Forward));
        input.apply(Action::Press(Direction::Left));
        input.release_all();
        assert!(!input.flags().any());
    }
}
