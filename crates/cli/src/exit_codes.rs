//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 50-59   | fetch            | Upstream event payload download          |
//! | 60-69   | generate         | Reference data, payload, output          |
//!
//! Dropped or ambiguous records are diagnostics, not failures: a run that
//! resolves only part of its input still exits 0.

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Fetch (50-59)
// =============================================================================

/// Upstream rejected the request (4xx other than 429).
pub const EXIT_FETCH_REJECTED: u8 = 51;

/// Rate limited after retries (429).
pub const EXIT_FETCH_RATE_LIMIT: u8 = 53;

/// Upstream error (5xx) or network failure after retries.
pub const EXIT_FETCH_UPSTREAM: u8 = 54;

// =============================================================================
// Generate (60-69)
// =============================================================================

/// Reference database missing, unreadable, or failed a query mid-run.
pub const EXIT_GENERATE_REFERENCE: u8 = 60;

/// Upstream payload lacks the expected wrapper or does not parse.
pub const EXIT_GENERATE_PAYLOAD: u8 = 61;

/// Output file could not be written.
pub const EXIT_GENERATE_OUTPUT: u8 = 62;

/// Exception table file failed to parse or validate.
pub const EXIT_GENERATE_EXCEPTIONS: u8 = 63;

use cjedb_io::IoError;
use cjedb_recon::ReconError;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::TableParse(_) | ReconError::TableValidation(_) => EXIT_GENERATE_EXCEPTIONS,
        ReconError::Reference(_) => EXIT_GENERATE_REFERENCE,
    }
}

/// Map an IO-layer error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Sqlite(_) => EXIT_GENERATE_REFERENCE,
        IoError::MalformedPayload(_) => EXIT_GENERATE_PAYLOAD,
        IoError::Json(_) | IoError::Io(_) => EXIT_GENERATE_OUTPUT,
    }
}
