pub mod bookmark;
pub mod config;
pub mod generate;
pub mod init;
pub mod inspect;
pub mod settings;
pub mod templates;
pub mod validate;
