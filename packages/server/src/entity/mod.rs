pub mod download_log;
pub mod file;
pub mod file_content;
pub mod file_share;
pub mod user;
