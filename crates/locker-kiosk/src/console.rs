//! Terminal front panel for the emulated board.
//!
//! Each stdin line is one command: a run of keypad characters (`12345678#`,
//! `B`, `*`), `box on|off`, `door on|off`, `status`, `help` or `quit`.
//! LCD changes are mirrored to stdout as they happen.

use anyhow::{Context, Result, bail};
use locker_core::constants::LCD_COLUMNS;
use locker_hardware::Key;
use locker_hardware::mock::MockDisplayHandle;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::board::BoardControls;

const HELP: &str = "\
Commands:
  <keys>          press keypad keys in order, e.g. 12345678#  (keys: 0-9 * # A-D)
  box on|off      box in front of / away from the box sensor
  door on|off     box in front of / away from the door sensor
  status          show LCD, sensors, latch and status light
  help            show this text
  quit            stop the kiosk";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Keys(Vec<Key>),
    Box(bool),
    Door(bool),
    Status,
    Help,
    Quit,
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        [] => return Ok(None),
        [word] if word.eq_ignore_ascii_case("status") => ConsoleCommand::Status,
        [word] if word.eq_ignore_ascii_case("help") || *word == "?" => ConsoleCommand::Help,
        [word] if ["quit", "exit"].iter().any(|q| word.eq_ignore_ascii_case(q)) => {
            ConsoleCommand::Quit
        }
        [sensor, level] if sensor.eq_ignore_ascii_case("box") => {
            ConsoleCommand::Box(parse_level(level)?)
        }
        [sensor, level] if sensor.eq_ignore_ascii_case("door") => {
            ConsoleCommand::Door(parse_level(level)?)
        }
        _ => ConsoleCommand::Keys(parse_keys(&words.concat())?),
    };
    Ok(Some(command))
}

fn parse_level(level: &str) -> Result<bool> {
    match level.to_ascii_lowercase().as_str() {
        "on" | "1" => Ok(true),
        "off" | "0" => Ok(false),
        other => bail!("expected on or off, got {other:?}"),
    }
}

fn parse_keys(text: &str) -> Result<Vec<Key>> {
    text.chars()
        .map(|c| Key::from_char(c).with_context(|| format!("no key labelled {c:?} (try help)")))
        .collect()
}

/// Apply a command to the board. Returns text to print, if any.
pub fn apply(controls: &BoardControls, command: ConsoleCommand) -> Result<Option<String>> {
    match command {
        ConsoleCommand::Keys(keys) => {
            for key in keys {
                controls
                    .keys
                    .press(key)
                    .with_context(|| format!("key {} not queued", key.as_char()))?;
            }
            Ok(None)
        }
        ConsoleCommand::Box(present) => {
            controls.set_box(present);
            debug!(present, "Box sensor set");
            Ok(None)
        }
        ConsoleCommand::Door(present) => {
            controls.set_door(present);
            debug!(present, "Door sensor set");
            Ok(None)
        }
        ConsoleCommand::Status => Ok(Some(status_report(controls))),
        ConsoleCommand::Help => Ok(Some(HELP.to_string())),
        ConsoleCommand::Quit => Ok(None),
    }
}

/// One-screen summary of the emulated board.
pub fn status_report(controls: &BoardControls) -> String {
    let [line1, line2] = controls.screen.lines();
    let latch = match controls.servo.angle() {
        Some(angle) => format!("{angle} deg"),
        None => "never driven".to_string(),
    };
    format!(
        "{}\nbox sensor: {}  door sensor: {}\nlatch: {}  LED: {}  buzzer: {}",
        lcd_frame(&line1, &line2),
        presence(controls.box_present()),
        presence(controls.door_present()),
        latch,
        on_off(controls.led.is_on()),
        on_off(controls.buzzer.is_on()),
    )
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run_console(controls: BoardControls) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if command == ConsoleCommand::Quit {
            break;
        }
        match apply(&controls, command) {
            Ok(Some(text)) => println!("{text}"),
            Ok(None) => {}
            Err(e) => warn!("{:#}", e),
        }
    }
    Ok(())
}

/// Print the LCD every time it changes, until the display is dropped.
pub async fn mirror_display(mut screen: MockDisplayHandle) {
    while let Some([line1, line2]) = screen.next_lines().await {
        println!("{}", lcd_frame(&line1, &line2));
    }
}

fn lcd_frame(line1: &str, line2: &str) -> String {
    let border = format!("+{}+", "-".repeat(LCD_COLUMNS));
    format!("{border}\n|{line1:<LCD_COLUMNS$}|\n|{line2:<LCD_COLUMNS$}|\n{border}")
}

fn presence(present: bool) -> &'static str {
    if present { "present" } else { "clear" }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}
