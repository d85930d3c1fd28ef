pub mod deploy;
pub mod diff;
pub mod init;
pub mod plan;
pub mod summary;
