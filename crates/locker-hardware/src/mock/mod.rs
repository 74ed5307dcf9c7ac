//! Mock device implementations for testing and development.
//!
//! Each mock comes with a handle that drives or observes it from outside,
//! so tests and the console kiosk can run without physical hardware.

pub mod analog;
pub mod display;
pub mod indicator;
pub mod keypad;
pub mod servo;

pub use analog::{MockAnalog, MockAnalogHandle};
pub use display::{MockDisplay, MockDisplayHandle};
pub use indicator::{IndicatorState, MockIndicator};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use servo::{MockServo, MockServoHandle};
