//! Licence adapters: signing key loading and configured token sources.

mod key_loader;
mod source;

pub use key_loader::{KeyLoadError, load_signing_key, parse_signing_key_pem};
pub use source::ConfiguredLicense;
