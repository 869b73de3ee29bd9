//! Chat orchestration: pin store, event stream, and the pipeline itself

pub mod pins;
pub mod pipeline;
pub mod stream;

pub use pins::PinStore;
pub use pipeline::{AgentSet, ChatPipeline};
pub use stream::{ChatStream, ChatStreamSender};
