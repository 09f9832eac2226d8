//! Pairing-code side channel
//!
//! Persists the latest pairing code to a well-known plain-text file for
//! out-of-band retrieval and renders it as a terminal QR code. Both are
//! best-effort: the state store is the source of truth.

use anyhow::{Context, Result};
use qrcode::{EcLevel, QrCode};
use std::fs;
use std::path::PathBuf;

/// Well-known file holding the last issued pairing code
#[derive(Debug, Clone)]
pub struct PairingCodeFile {
    path: PathBuf,
}

impl PairingCodeFile {
    /// Create a handle for the given path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Overwrite the file with a new pairing code
    pub fn write(&self, code: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        fs::write(&self.path, code)
            .with_context(|| format!("Failed to write pairing code file: {:?}", self.path))
    }

    /// Path of the underlying file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Render a pairing code as a Unicode half-block QR string
///
/// Each output character covers two vertical modules. Returns `None` when
/// the payload does not fit a QR code.
pub fn terminal_qr(code: &str) -> Option<String> {
    let qr = QrCode::with_error_correction_level(code.as_bytes(), EcLevel::L).ok()?;
    let width = qr.width();
    let mut result = String::new();

    for y in (0..width).step_by(2) {
        for x in 0..width {
            let top = qr[(x, y)] == qrcode::Color::Dark;
            let bottom = if y + 1 < width {
                qr[(x, y + 1)] == qrcode::Color::Dark
            } else {
                false
            };

            let ch = match (top, bottom) {
                (true, true) => '\u{2588}',  // Full block █
                (true, false) => '\u{2580}', // Upper half ▀
                (false, true) => '\u{2584}', // Lower half ▄
                (false, false) => ' ',
            };
            result.push(ch);
        }
        result.push('\n');
    }

    Some(result)
}
