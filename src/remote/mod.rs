pub mod http;
pub mod traits;

pub use http::HttpFileStore;
pub use traits::{RemoteEntry, RemoteStore, TransportError};
