use crate::domain::InputState;
use crate::domain::ports::InputSource;
use tracing::warn;

/// Headless pilot that holds the same controls on every frame.
///
/// Built from a comma-separated list such as `forward,boost,fire`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    held: InputState,
}

impl ScriptedInput {
    pub fn parse(script: &str) -> Self {
        let mut held = InputState::default();
        for name in script.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !held.hold(&name.to_ascii_lowercase()) {
                warn!(control = name, "unknown control ignored");
            }
        }
        Self { held }
    }

    pub fn held(&self) -> InputState {
        self.held
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputState {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_script_lists_controls_then_they_are_held() {
        let mut input = ScriptedInput::parse(" Forward, boost ,,fire");

        let state = input.poll();

        assert!(state.forward && state.boost && state.fire);
        assert!(!state.back);
    }

    #[test]
    fn when_script_is_empty_then_nothing_is_held() {
        assert!(!ScriptedInput::parse("").held().any_held());
    }

    #[test]
    fn when_script_has_unknown_names_then_known_ones_still_apply() {
        let state = ScriptedInput::parse("loop,down").held();

        assert_eq!(
            state,
            InputState {
                down: true,
                ..InputState::default()
            }
        );
    }
}
