pub mod classify;
pub mod encoding;
pub mod error;
pub mod request;
pub mod requester;
pub mod retry;
