pub mod config;
pub mod error;
pub mod generator;
pub mod io;
pub mod metadata;
pub mod paths;
pub mod template;
pub mod validator;

pub use error::{Result, ScriptkitError};
