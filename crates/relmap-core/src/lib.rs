#[macro_use]
mod error;
pub use error::{Error, ErrorCategory, ErrorKey, IntoError};

pub mod schema;
pub use schema::Schema;

/// A Result type alias that uses relmap's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
