// src/error.rs

//! The single unrecoverable error kind of the front end.
//!
//! Anything that reaches the top level as a `FrontendError` means the window
//! cannot render correctly; `main` reports it and exits. Engine-requested
//! shutdown is not an error and never travels through this type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontendError {
    /// The display refused one of the engine's palette entries.
    #[error("couldn't allocate colour {index} (#{red:02x}{green:02x}{blue:02x})")]
    ColourAllocation {
        index: usize,
        red: u8,
        green: u8,
        blue: u8,
    },

    /// The fallback text face could not be opened.
    #[error("couldn't load font '{face}' at size {size}: {reason}")]
    FontLoad {
        face: String,
        size: i32,
        reason: String,
    },

    /// The platform driver failed underneath us.
    #[error("platform failure: {0:#}")]
    Platform(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_allocation_message_uses_eight_bit_hex() {
        let err = FrontendError::ColourAllocation {
            index: 3,
            red: 0xff,
            green: 0x08,
            blue: 0x00,
        };
        assert_eq!(err.to_string(), "couldn't allocate colour 3 (#ff0800)");
    }

    #[test]
    fn platform_errors_keep_their_context_chain() {
        let inner = anyhow::anyhow!("XOpenDisplay returned null").context("opening display");
        let err = FrontendError::from(inner);
        assert_eq!(
            err.to_string(),
            "platform failure: opening display: XOpenDisplay returned null"
        );
    }
}
