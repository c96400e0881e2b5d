use meshsync_shared::{DeleteMessage, FenceMessage, SetMessage};

use crate::{client::Client, error::ClientError};

/// The messages a scene send is made of
pub trait SceneTransport: Send {
    fn send_fence(&mut self, message: &FenceMessage) -> Result<(), ClientError>;
    fn send_set(&mut self, message: &SetMessage) -> Result<(), ClientError>;
    fn send_delete(&mut self, message: &DeleteMessage) -> Result<(), ClientError>;
}

impl SceneTransport for Client {
    fn send_fence(&mut self, message: &FenceMessage) -> Result<(), ClientError> {
        Client::send_fence(self, message)
    }

    fn send_set(&mut self, message: &SetMessage) -> Result<(), ClientError> {
        Client::send_set(self, message)
    }

    fn send_delete(&mut self, message: &DeleteMessage) -> Result<(), ClientError> {
        Client::send_delete(self, message)
    }
}
