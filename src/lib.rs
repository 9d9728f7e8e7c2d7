pub mod document;
pub mod server;
pub mod utils;

pub use document::{SpaceApi, StatusStore};
pub use server::{ServerConfig, SpaceApiServer};
