pub mod http;
pub mod traits;

pub use http::ChannelSink;
pub use traits::{Sink, SinkError};
