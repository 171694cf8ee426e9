use winit::keyboard::KeyCode;

/// One of the four steering directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Parse a direction from its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }
}

/// A high-level input action consumed by the input state.
///
/// Key events are translated into actions by `KeyBindings`, so the state
/// never sees raw key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A direction key went down.
    Press(Direction),
    /// A direction key went up.
    Release(Direction),
}

/// Maps physical keys to steering directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    forward: KeyCode,
    backward: KeyCode,
    left: KeyCode,
    right: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
        }
    }
}

impl KeyBindings {
    pub fn new(forward: KeyCode, backward: KeyCode, left: KeyCode, right: KeyCode) -> Self {
        Self {
            forward,
            backward,
            left,
            right,
        }
    }

    pub fn direction(&self, key: KeyCode) -> Option<Direction> {
        if key == self.forward {
            Some(Direction::Forward)
        } else if key == self.backward {
            Some(Direction::Backward)
        } else if key == self.left {
            Some(Direction::Left)
        } else if key == self.right {
            Some(Direction::Right)
        } else {
            None
        }
    }

    /// The key bound to `direction`.
    pub fn key(&self, direction: Direction) -> KeyCode {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Translate a key transition into an action, if the key is bound.
    pub fn action(&self, key: KeyCode, pressed: bool) -> Option<Action> {
        self.direction(key).map(|d| {
            if pressed {
                Action::Press(d)
            } else {
                Action::Release(d)
            }
        })
    }
}
