pub mod error;
pub mod format;
pub mod logger;
pub mod reporter;
pub mod validation;
