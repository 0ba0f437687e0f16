pub mod chat;
pub mod crew;
pub mod research;
