pub mod error;
pub mod jellyfin;
pub mod traits;

pub use error::ServerError;
pub use jellyfin::JellyfinServer;
pub use traits::{ItemQuery, MediaServer, PageRequest};
