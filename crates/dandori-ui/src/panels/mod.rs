pub mod chat;
pub mod courses;
pub mod settings;
