/// Snapshot of the pilot's held controls for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub boost: bool,
    pub fire: bool,
}

impl InputState {
    /// True when any control is held, boost and fire included.
    pub fn any_held(&self) -> bool {
        self.forward
            || self.back
            || self.left
            || self.right
            || self.up
            || self.down
            || self.boost
            || self.fire
    }

    /// Sets the control named `name`; unknown names are ignored and reported.
    pub fn hold(&mut self, name: &str) -> bool {
        let slot = match name {
            "forward" => &mut self.forward,
            "back" => &mut self.back,
            "left" => &mut self.left,
            "right" => &mut self.right,
            "up" => &mut self.up,
            "down" => &mut self.down,
            "boost" => &mut self.boost,
            "fire" => &mut self.fire,
            _ => return false,
        };
        *slot = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_nothing_is_held_then_any_held_is_false() {
        assert!(!InputState::default().any_held());
    }

    #[test]
    fn when_only_fire_is_held_then_any_held_is_true() {
        let input = InputState {
            fire: true,
            ..InputState::default()
        };

        assert!(input.any_held());
    }

    #[test]
    fn when_unknown_control_is_held_then_it_is_rejected() {
        let mut input = InputState::default();

        assert!(input.hold("up"));
        assert!(!input.hold("barrel_roll"));
        assert!(input.up);
    }
}
