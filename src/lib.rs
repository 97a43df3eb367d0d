pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod error;
pub mod mqtt;
pub mod router;
pub mod toggle;
