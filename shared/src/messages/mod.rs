mod error;
mod header;
mod message;
mod types;

pub use error::ProtocolError;
pub use header::{now_ticks, MessageHeader};
pub use message::{
    DeleteMessage, FenceMessage, GetMessage, Message, MessageBody, MessageKind, PollMessage,
    QueryMessage, ResponseMessage, ScreenshotMessage, SetMessage, TextMessage,
};
pub use types::{FenceType, GetFlags, PollType, QueryType, TextType};
