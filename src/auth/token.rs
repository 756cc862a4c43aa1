//! Signed, self-contained identity tokens: claim set, secret wrappers, and the codec.

pub mod claims;
pub mod codec;
pub mod secret;
