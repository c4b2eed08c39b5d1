pub mod chat;
pub mod events;
pub mod export;
pub mod history;
pub mod profile;
