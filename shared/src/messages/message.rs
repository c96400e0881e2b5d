use meshsync_serde::{ByteReader, ByteWriter, ConstByteLength, Serde, SerdeErr};

use crate::{
    identifier::Identifier,
    messages::{
        error::ProtocolError,
        header::MessageHeader,
        types::{FenceType, GetFlags, PollType, QueryType, TextType},
    },
    refine::MeshRefineSettings,
    scene::{Scene, SceneSettings},
};

/// Request kinds, one per endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Get,
    Set,
    Delete,
    Fence,
    Text,
    Screenshot,
    Query,
    Response,
    Poll,
}

impl MessageKind {
    /// Endpoint the client posts this kind to
    pub fn path(&self) -> &'static str {
        match self {
            MessageKind::Get => "/get",
            MessageKind::Set => "/set",
            MessageKind::Delete => "/delete",
            MessageKind::Fence => "/fence",
            MessageKind::Text => "/text",
            MessageKind::Screenshot => "/screenshot",
            MessageKind::Query => "/query",
            MessageKind::Response => "/response",
            MessageKind::Poll => "/poll",
        }
    }
}

/// A message type with a header in front of its body
pub trait MessageBody: Sized {
    const KIND: MessageKind;

    fn header(&self) -> &MessageHeader;
    fn header_mut(&mut self) -> &mut MessageHeader;

    fn write_body(&self, writer: &mut ByteWriter);
    fn read_body(header: MessageHeader, reader: &mut ByteReader) -> Result<Self, SerdeErr>;
    fn body_length(&self) -> usize;

    fn encode(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(MessageHeader::BYTE_LENGTH + self.body_length());
        self.header().ser(&mut writer);
        self.write_body(&mut writer);
        writer.to_bytes()
    }

    /// Decodes a complete message. The protocol version is checked before
    /// the body is touched, and leftover bytes are an error.
    fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = ByteReader::new(bytes);
        let header = MessageHeader::read_checked(&mut reader)?;
        let message = Self::read_body(header, &mut reader)?;
        match reader.remaining() {
            0 => Ok(message),
            count => Err(ProtocolError::TrailingBytes { count }),
        }
    }
}

macro_rules! impl_serde_for_message {
    ($($t:ty),*) => {$(
        impl Serde for $t {
            fn ser(&self, writer: &mut ByteWriter) {
                self.header().ser(writer);
                self.write_body(writer);
            }

            fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                let header = MessageHeader::de(reader)?;
                Self::read_body(header, reader)
            }

            fn byte_length(&self) -> usize {
                MessageHeader::BYTE_LENGTH + self.body_length()
            }
        }
    )*};
}

macro_rules! header_accessors {
    () => {
        fn header(&self) -> &MessageHeader {
            &self.header
        }

        fn header_mut(&mut self) -> &mut MessageHeader {
            &mut self.header
        }
    };
}

/// Asks the host for its scene, converted to the requester's settings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetMessage {
    pub header: MessageHeader,
    pub flags: GetFlags,
    pub scene_settings: SceneSettings,
    pub refine_settings: MeshRefineSettings,
}

impl MessageBody for GetMessage {
    const KIND: MessageKind = MessageKind::Get;
    header_accessors!();

    fn write_body(&self, writer: &mut ByteWriter) {
        self.flags.ser(writer);
        self.scene_settings.ser(writer);
        self.refine_settings.ser(writer);
    }

    fn read_body(header: MessageHeader, reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            header,
            flags: GetFlags::de(reader)?,
            scene_settings: SceneSettings::de(reader)?,
            refine_settings: MeshRefineSettings::de(reader)?,
        })
    }

    fn body_length(&self) -> usize {
        self.flags.byte_length()
            + self.scene_settings.byte_length()
            + self.refine_settings.byte_length()
    }
}

/// Pushes entities and assets to the receiver
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetMessage {
    pub header: MessageHeader,
    pub scene: Scene,
}

impl SetMessage {
    pub fn new(scene: Scene) -> Self {
        Self {
            header: MessageHeader::default(),
            scene,
        }
    }
}

impl MessageBody for SetMessage {
    const KIND: MessageKind = MessageKind::Set;
    header_accessors!();

    fn write_body(&self, writer: &mut ByteWriter) {
        self.scene.ser(writer);
    }

    fn read_body(header: MessageHeader, reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            header,
            scene: Scene::de(reader)?,
        })
    }

    fn body_length(&self) -> usize {
        self.scene.byte_length()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteMessage {
    pub header: MessageHeader,
    pub entities: Vec<Identifier>,
    pub materials: Vec<Identifier>,
}

impl DeleteMessage {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.materials.is_empty()
    }
}

impl MessageBody for DeleteMessage {
    const KIND: MessageKind = MessageKind::Delete;
    header_accessors!();

    fn write_body(&self, writer: &mut ByteWriter) {
        self.entities.ser(writer);
        self.materials.ser(writer);
    }

    fn read_body(header: MessageHeader, reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            header,
            entities: Vec::de(reader)?,
            materials: Vec::de(reader)?,
        })
    }

    fn body_length(&self) -> usize {
        self.entities.byte_length() + self.materials.byte_length()
    }
}

/// Brackets the Set/Delete messages of one scene session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FenceMessage {
    pub header: MessageHeader,
    pub fence_type: FenceType,
}

impl FenceMessage {
    pub fn new(fence_type: FenceType) -> Self {
        Self {
            header: MessageHeader::default(),
            fence_type,
        }
    }
}

impl MessageBody for FenceMessage {
    const KIND: MessageKind = MessageKind::Fence;
    header_accessors!();

    fn write_body(&self, writer: &mut ByteWriter) {
        self.fence_type.ser(writer);
    }

    fn read_body(header: MessageHeader, reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            header,
            fence_type: FenceType::de(reader)?,
        })
    }

    fn body_length(&self) -> usize {
        FenceType::BYTE_LENGTH
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextMessage {
    pub header: MessageHeader,
    pub text: String,
    pub text_type: TextType,
}

impl TextMessage {
    pub fn new(text: impl Into<String>, text_type: TextType) -> Self {
        Self {
            header: MessageHeader::default(),
            text: text.into(),
            text_type,
        }
    }
}

impl MessageBody for TextMessage {
    const KIND: MessageKind = MessageKind::Text;
    header_accessors!();

    fn write_body(&self, writer: &mut ByteWriter) {
        self.text.ser(writer);
        self.text_type.ser(writer);
    }

    fn read_body(header: MessageHeader, reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            header,
            text: String::de(reader)?,
            text_type: TextType::de(reader)?,
        })
    }

    fn body_length(&self) -> usize {
        self.text.byte_length() + TextType::BYTE_LENGTH
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScreenshotMessage {
    pub header: MessageHeader,
}

impl MessageBody for ScreenshotMessage {
    const KIND: MessageKind = MessageKind::Screenshot;
    header_accessors!();

    fn write_body(&self, _writer: &mut ByteWriter) {}

    fn read_body(header: MessageHeader, _reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self { header })
    }

    fn body_length(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryMessage {
    pub header: MessageHeader,
    pub query_type: QueryType,
}

impl QueryMessage {
    pub fn new(query_type: QueryType) -> Self {
        Self {
            header: MessageHeader::default(),
            query_type,
        }
    }
}

impl MessageBody for QueryMessage {
    const KIND: MessageKind = MessageKind::Query;
    header_accessors!();

    fn write_body(&self, writer: &mut ByteWriter) {
        self.query_type.ser(writer);
    }

    fn read_body(header: MessageHeader, reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            header,
            query_type: QueryType::de(reader)?,
        })
    }

    fn body_length(&self) -> usize {
        QueryType::BYTE_LENGTH
    }
}

/// Answer to a Query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseMessage {
    pub header: MessageHeader,
    pub text: Vec<String>,
}

impl MessageBody for ResponseMessage {
    const KIND: MessageKind = MessageKind::Response;
    header_accessors!();

    fn write_body(&self, writer: &mut ByteWriter) {
        self.text.ser(writer);
    }

    fn read_body(header: MessageHeader, reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            header,
            text: Vec::de(reader)?,
        })
    }

    fn body_length(&self) -> usize {
        self.text.byte_length()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollMessage {
    pub header: MessageHeader,
    pub poll_type: PollType,
}

impl PollMessage {
    pub fn new(poll_type: PollType) -> Self {
        Self {
            header: MessageHeader::default(),
            poll_type,
        }
    }
}

impl MessageBody for PollMessage {
    const KIND: MessageKind = MessageKind::Poll;
    header_accessors!();

    fn write_body(&self, writer: &mut ByteWriter) {
        self.poll_type.ser(writer);
    }

    fn read_body(header: MessageHeader, reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            header,
            poll_type: PollType::de(reader)?,
        })
    }

    fn body_length(&self) -> usize {
        PollType::BYTE_LENGTH
    }
}

impl_serde_for_message!(
    GetMessage,
    SetMessage,
    DeleteMessage,
    FenceMessage,
    TextMessage,
    ScreenshotMessage,
    QueryMessage,
    ResponseMessage,
    PollMessage
);

/// Any message of the protocol
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Get(GetMessage),
    Set(SetMessage),
    Delete(DeleteMessage),
    Fence(FenceMessage),
    Text(TextMessage),
    Screenshot(ScreenshotMessage),
    Query(QueryMessage),
    Response(ResponseMessage),
    Poll(PollMessage),
}

macro_rules! dispatch {
    ($self:expr, $message:ident => $body:expr) => {
        match $self {
            Message::Get($message) => $body,
            Message::Set($message) => $body,
            Message::Delete($message) => $body,
            Message::Fence($message) => $body,
            Message::Text($message) => $body,
            Message::Screenshot($message) => $body,
            Message::Query($message) => $body,
            Message::Response($message) => $body,
            Message::Poll($message) => $body,
        }
    };
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Get(_) => MessageKind::Get,
            Message::Set(_) => MessageKind::Set,
            Message::Delete(_) => MessageKind::Delete,
            Message::Fence(_) => MessageKind::Fence,
            Message::Text(_) => MessageKind::Text,
            Message::Screenshot(_) => MessageKind::Screenshot,
            Message::Query(_) => MessageKind::Query,
            Message::Response(_) => MessageKind::Response,
            Message::Poll(_) => MessageKind::Poll,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        dispatch!(self, message => message.header())
    }

    pub fn header_mut(&mut self) -> &mut MessageHeader {
        dispatch!(self, message => message.header_mut())
    }

    pub fn session_id(&self) -> i32 {
        self.header().session_id
    }

    pub fn encode(&self) -> Vec<u8> {
        dispatch!(self, message => message.encode())
    }

    /// Decodes `bytes` as the message type the endpoint expects
    pub fn decode(kind: MessageKind, bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(match kind {
            MessageKind::Get => Message::Get(GetMessage::decode(bytes)?),
            MessageKind::Set => Message::Set(SetMessage::decode(bytes)?),
            MessageKind::Delete => Message::Delete(DeleteMessage::decode(bytes)?),
            MessageKind::Fence => Message::Fence(FenceMessage::decode(bytes)?),
            MessageKind::Text => Message::Text(TextMessage::decode(bytes)?),
            MessageKind::Screenshot => Message::Screenshot(ScreenshotMessage::decode(bytes)?),
            MessageKind::Query => Message::Query(QueryMessage::decode(bytes)?),
            MessageKind::Response => Message::Response(ResponseMessage::decode(bytes)?),
            MessageKind::Poll => Message::Poll(PollMessage::decode(bytes)?),
        })
    }
}

macro_rules! impl_from_for_message {
    ($($variant:ident($t:ty)),*) => {$(
        impl From<$t> for Message {
            fn from(message: $t) -> Self {
                Message::$variant(message)
            }
        }
    )*};
}

impl_from_for_message!(
    Get(GetMessage),
    Set(SetMessage),
    Delete(DeleteMessage),
    Fence(FenceMessage),
    Text(TextMessage),
    Screenshot(ScreenshotMessage),
    Query(QueryMessage),
    Response(ResponseMessage),
    Poll(PollMessage)
);
