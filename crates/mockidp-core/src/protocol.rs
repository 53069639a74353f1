//! Fixed names shared by the handler, the tape proxy and test clients.

/// Path of the diagnostics endpoint listing tapes not yet replayed.
pub const UNUSED_TAPES_PATH: &str = "/mock/unused-tapes";

/// Response header carrying the name of the tape that served a request.
pub const TAPE_HEADER: &str = "x-yakbak-tape";

/// Request header carrying the free-text description of the running test.
pub const TEST_DESCRIPTION_HEADER: &str = "x-test-description";

/// Body sent by the tape proxy when no tape matches and recording is off.
pub const RECORDING_DISABLED: &str = "Recording Disabled";

/// Body substituted for the sentinel when the request carries no description.
pub const MISSING_DESCRIPTION: &str = "Missing the x-test-description header";
