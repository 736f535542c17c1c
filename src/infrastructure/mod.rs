pub mod cache;
pub mod logging;
pub mod mailer;
pub mod storage;
