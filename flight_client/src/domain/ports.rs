use super::input::InputState;

// Port for whatever device or script drives the local craft.
pub trait InputSource {
    fn poll(&mut self) -> InputState;
}
