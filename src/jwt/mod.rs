mod claims;
mod config;
mod error;
mod issuer;
mod token;
mod verifier;

pub use error::*;

pub use claims::*;
pub use config::*;
pub use issuer::*;
pub use token::Token;
pub use verifier::*;

pub(crate) use token::unix_now;
