pub mod message;
pub mod event;
pub mod tool;
pub mod course;
pub mod error;


pub use error::ClientError;
pub type Result<T> = std::result::Result<T, ClientError>;
