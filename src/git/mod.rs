pub mod command;
pub mod log;
pub mod repo;

pub use command::GitCli;
pub use repo::{repo_name, GitRepo};
