//! Outbound side-effect channels used by the local tools
pub mod mail;
pub mod notify;
pub mod search;
