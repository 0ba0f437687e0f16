pub mod agents;
pub mod channels;
pub mod chat;
pub mod configuration;
pub mod crew;
pub mod errors;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod research;
pub mod tools;
