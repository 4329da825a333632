pub mod case;
pub mod config;
pub mod error;
pub mod text;

pub use case::*;
pub use config::Config;
pub use error::*;
pub use text::TextGate;
