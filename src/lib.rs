pub mod builder;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod i18n;
pub mod parser;
pub mod template;

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
