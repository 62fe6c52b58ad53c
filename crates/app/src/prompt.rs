//! Masked terminal input for PINs and backup passwords.

use std::io::Write;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};

use crate::error::{AppError, Result};

/// Non-interactive PIN, for scripts.
const PIN_ENV: &str = "MVAULT_PIN";

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn say(message: &str) -> Result<()> {
    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(message),
        Print("\r\n")
    )?;
    Ok(())
}

/// Reads a line without echoing it, printing `*` per character.
pub fn prompt_secret(prompt: &str) -> Result<String> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err(AppError::Terminal("interrupted".to_string()));
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

/// Asks for a new secret twice, `valid` decides what is accepted.
pub fn prompt_new_secret(
    label: &str,
    valid: impl Fn(&str) -> bool,
    rule: &str,
) -> Result<String> {
    for _ in 0..3 {
        let first = prompt_secret(&format!("New {label}: "))?;
        if !valid(&first) {
            say(rule)?;
            continue;
        }
        let second = prompt_secret(&format!("Confirm {label}: "))?;
        if first == second {
            return Ok(first);
        }
        say(&format!("{label} entries do not match. Try again."))?;
    }
    Err(AppError::Usage("too many attempts".to_string()))
}

/// PIN from `MVAULT_PIN` or the terminal.
pub fn read_pin() -> Result<String> {
    match std::env::var(PIN_ENV) {
        Ok(pin) if !pin.is_empty() => Ok(pin),
        _ => prompt_secret("PIN: "),
    }
}
