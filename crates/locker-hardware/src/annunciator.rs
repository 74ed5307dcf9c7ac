//! Status LED, buzzer and LCD bundled as one [`Annunciator`].

use std::time::{Duration, Instant};

use locker_core::constants::DISPLAY_MESSAGE_MS;
use tracing::{debug, error};

use crate::display::lcd_line;
use crate::error::Result;
use crate::traits::{Annunciator, Indicator, TextDisplay};
use crate::types::{BeepLength, DeviceInfo};

/// Feedback panel built from three peripherals.
///
/// Beeps and the success light are timed: they are switched on immediately
/// and switched off by [`Annunciator::update`], which the polling loop
/// calls every tick. Their duration is measured on the loop's clock, from
/// the first update after they started. Peripheral write failures are
/// logged, never returned.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use locker_hardware::mock::{MockDisplay, MockIndicator};
/// use locker_hardware::{Annunciator, Panel};
///
/// let (led, led_state) = MockIndicator::new("LED");
/// let (buzzer, buzzer_state) = MockIndicator::new("buzzer");
/// let (display, screen) = MockDisplay::new();
/// let mut panel = Panel::new(led, buzzer, display);
///
/// panel.show("Access granted", "Take the box");
/// panel.signal_success();
/// assert!(led_state.is_on());
/// assert!(buzzer_state.is_on());
/// assert_eq!(screen.lines()[0].trim_end(), "Access granted");
///
/// let start = Instant::now();
/// panel.update(start);
/// panel.update(start + Duration::from_secs(10));
/// assert!(!led_state.is_on());
/// assert!(!buzzer_state.is_on());
/// ```
#[derive(Debug)]
pub struct Panel<L, B, D> {
    led: L,
    buzzer: B,
    display: D,

    /// Rendered lines, used to skip redundant LCD writes.
    lines: [String; 2],

    beep: Option<Timed>,
    light: Option<Timed>,
    led_hold: Duration,
}

/// An output that stays on for `hold`.
#[derive(Debug, Clone, Copy)]
struct Timed {
    hold: Duration,

    /// Set by the first update after the output was switched on.
    until: Option<Instant>,
}

impl Timed {
    fn new(hold: Duration) -> Self {
        Self { hold, until: None }
    }

    fn expired(&mut self, now: Instant) -> bool {
        let until = *self.until.get_or_insert(now + self.hold);
        now >= until
    }
}

impl<L: Indicator, B: Indicator, D: TextDisplay> Panel<L, B, D> {
    pub fn new(led: L, buzzer: B, display: D) -> Self {
        Self {
            led,
            buzzer,
            display,
            lines: [String::new(), String::new()],
            beep: None,
            light: None,
            led_hold: Duration::from_millis(DISPLAY_MESSAGE_MS),
        }
    }

    /// How long the status light stays on after a success.
    pub fn with_led_hold(mut self, hold: Duration) -> Self {
        self.led_hold = hold;
        self
    }

    /// Initialize all three peripherals and put them in a quiet state.
    pub fn init(&mut self) -> Result<()> {
        self.led.init()?;
        self.buzzer.init()?;
        self.display.init()?;

        self.led.set(false)?;
        self.buzzer.set(false)?;
        self.display.clear()?;
        self.lines = [String::new(), String::new()];
        Ok(())
    }

    /// Lines currently on the display, padded to the LCD width.
    pub fn lines(&self) -> (&str, &str) {
        (&self.lines[0], &self.lines[1])
    }

    pub fn is_beeping(&self) -> bool {
        self.beep.is_some()
    }

    /// Whether the success light is still waiting to be switched off.
    pub fn is_lit(&self) -> bool {
        self.light.is_some()
    }

    pub fn devices(&self) -> [DeviceInfo; 3] {
        [self.led.info(), self.buzzer.info(), self.display.info()]
    }

    fn write_led(&mut self, on: bool) {
        if let Err(e) = self.led.set(on) {
            error!(on, error = %e, "Status LED write failed");
        }
    }

    fn write_buzzer(&mut self, on: bool) {
        if let Err(e) = self.buzzer.set(on) {
            error!(on, error = %e, "Buzzer write failed");
        }
    }
}

impl<L: Indicator, B: Indicator, D: TextDisplay> Annunciator for Panel<L, B, D> {
    fn show(&mut self, line1: &str, line2: &str) {
        let lines = [lcd_line(line1), lcd_line(line2)];
        if lines == self.lines {
            return;
        }

        debug!(line1 = lines[0].trim_end(), line2 = lines[1].trim_end(), "Display");
        match self.display.print_lines(&lines[0], &lines[1]) {
            Ok(()) => self.lines = lines,
            Err(e) => error!(error = %e, "Display write failed"),
        }
    }

    fn signal_success(&mut self) {
        self.write_led(true);
        self.light = Some(Timed::new(self.led_hold));
        self.beep(BeepLength::Short);
    }

    fn signal_failure(&mut self) {
        self.light = None;
        self.write_led(false);
        self.beep(BeepLength::Long);
    }

    fn beep(&mut self, length: BeepLength) {
        self.write_buzzer(true);
        self.beep = Some(Timed::new(length.duration()));
    }

    /// Switch off the buzzer and status light once their time is up.
    fn update(&mut self, now: Instant) {
        if self.beep.as_mut().is_some_and(|beep| beep.expired(now)) {
            self.beep = None;
            self.write_buzzer(false);
        }
        if self.light.as_mut().is_some_and(|light| light.expired(now)) {
            self.light = None;
            self.write_led(false);
        }
    }
}
