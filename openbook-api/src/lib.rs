pub mod dispatch;
pub mod init;
pub mod mailer;
pub mod server;
pub mod storage;
