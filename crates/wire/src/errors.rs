//! Wire encoding of engine errors
//!
//! Well-known errors cross the wire as short stable strings; everything
//! else is sent as its display form. `EOF` is not an engine error at all,
//! it marks iterator exhaustion in fetch responses.

use memkv_core::Error;

/// Wire code for `Error::Invalid`
pub const ERR_INVALID: &str = "ErrInvalid";

/// Wire code for `Error::NotExist`
pub const ERR_NOT_EXIST: &str = "ErrNotExist";

/// Wire marker for iterator exhaustion
pub const EOF: &str = "EOF";

/// Encode an engine error for the `error` field of a response
pub fn encode_error(err: &Error) -> String {
    match err.wire_code() {
        Some(code) => code.to_string(),
        None => err.to_string(),
    }
}
