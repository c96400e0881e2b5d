use thiserror::Error;

/// Errors raised while decoding a byte stream
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerdeErr {
    #[error("unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid discriminant {value} for {type_name}")]
    InvalidDiscriminant { type_name: &'static str, value: i64 },

    #[error("length {length} does not fit in a u32 prefix")]
    LengthOverflow { length: usize },
}
