//! Input injection.
//!
//! [`InputSink`] is the capability the replay engine drives: deliver one
//! simulated key transition to the OS input queue. The Windows
//! implementation wraps the Win32 `SendInput` API, which reaches elevated
//! windows as long as the caller is elevated too.

use thiserror::Error;

use crate::key_map::KeyCode;

/// The OS accepted fewer injected events than requested. Non-fatal: the
/// engine reports it and keeps going.
#[derive(Debug, Error)]
#[error("{accepted}/{requested} events accepted: {reason}")]
pub struct InjectionFailure {
    pub accepted: u32,
    pub requested: u32,
    pub reason: String,
}

/// Abstract sink for simulated key transitions.
///
/// Implementations differ only in fidelity (plain virtual-key events,
/// scan-code events, test recording); the engine never branches on which
/// one it holds. Sinks cross task boundaries together with the engine, so
/// they must be `Send`.
pub trait InputSink: Send {
    /// Put the key into the down state.
    fn key_down(&mut self, code: KeyCode) -> std::result::Result<(), InjectionFailure>;

    /// Release the key.
    fn key_up(&mut self, code: KeyCode) -> std::result::Result<(), InjectionFailure>;
}

/// Sink that swallows every event, for `--dry-run` and non-Windows hosts.
#[derive(Debug, Default, Clone)]
pub struct NullSink;

impl InputSink for NullSink {
    fn key_down(&mut self, code: KeyCode) -> std::result::Result<(), InjectionFailure> {
        tracing::debug!(vk = format_args!("{:#04x}", code.0), "dry-run key down");
        Ok(())
    }

    fn key_up(&mut self, code: KeyCode) -> std::result::Result<(), InjectionFailure> {
        tracing::debug!(vk = format_args!("{:#04x}", code.0), "dry-run key up");
        Ok(())
    }
}

/// Sink backed by the Win32 `SendInput` API.
#[cfg(windows)]
#[derive(Debug, Default, Clone)]
pub struct SendInputSink;

#[cfg(windows)]
impl SendInputSink {
    pub fn new() -> Self {
        Self
    }

    fn send(&self, code: KeyCode, flags: u32) -> std::result::Result<(), InjectionFailure> {
        use winapi::um::winuser::{SendInput, INPUT, INPUT_KEYBOARD};

        // The INPUT union covers mouse, keyboard, and hardware input, so the
        // zeroed struct already has the right size for SendInput.
        let mut input: INPUT = unsafe { std::mem::zeroed() };
        input.type_ = INPUT_KEYBOARD;
        unsafe {
            let ki = input.u.ki_mut();
            ki.wVk = code.0;
            ki.dwFlags = flags;
        }

        let sent = unsafe { SendInput(1, &mut input, std::mem::size_of::<INPUT>() as i32) };
        if sent == 1 {
            Ok(())
        } else {
            Err(InjectionFailure {
                accepted: sent,
                requested: 1,
                reason: std::io::Error::last_os_error().to_string(),
            })
        }
    }
}

#[cfg(windows)]
impl InputSink for SendInputSink {
    fn key_down(&mut self, code: KeyCode) -> std::result::Result<(), InjectionFailure> {
        self.send(code, 0)
    }

    fn key_up(&mut self, code: KeyCode) -> std::result::Result<(), InjectionFailure> {
        use winapi::um::winuser::KEYEVENTF_KEYUP;
        self.send(code, KEYEVENTF_KEYUP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_accepts_everything() {
        let mut sink = NullSink;
        assert!(sink.key_down(KeyCode(0x41)).is_ok());
        assert!(sink.key_up(KeyCode(0x41)).is_ok());
    }

    #[test]
    fn test_injection_failure_display() {
        let failure = InjectionFailure {
            accepted: 0,
            requested: 1,
            reason: "blocked".to_string(),
        };
        assert_eq!(failure.to_string(), "0/1 events accepted: blocked");
    }
}
