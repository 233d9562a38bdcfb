pub mod app;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod find;
pub mod output;
pub mod parse;
pub mod runtime;
pub mod snapshot;
pub mod tree;

pub use config::{cmd_config, ConfigArgs};
pub use find::{cmd_find, FindArgs};
pub use parse::{cmd_parse, ParseArgs};
pub use tree::{cmd_tree, TreeArgs};
