//! Scan and redaction configuration

/// Configuration for scanning method bodies and redacting the strings they load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Scan method bodies in parallel on the rayon thread pool
    pub parallel: bool,

    /// Byte written over every redacted UTF-16 payload byte (default: 0x00)
    pub filler: u8,

    /// Ignore `ldstr` operands that do not refer into the `#US` heap instead of failing the
    /// method that contains them
    pub skip_invalid_tokens: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            filler: 0x00,
            skip_invalid_tokens: false,
        }
    }
}

impl ScanConfig {
    /// Creates a configuration that scans one method after the other
    ///
    /// Results are identical to the parallel scan, only the log output is ordered.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Creates a configuration that tolerates `ldstr` operands outside the `#US` heap
    ///
    /// Such instructions are logged and skipped, and the rest of the method is still scanned.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            skip_invalid_tokens: true,
            ..Self::default()
        }
    }

    /// Returns this configuration with a different filler byte
    #[must_use]
    pub fn with_filler(mut self, filler: u8) -> Self {
        self.filler = filler;
        self
    }
}
