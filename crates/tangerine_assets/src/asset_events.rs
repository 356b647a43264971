use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};

use crate::{AssetError, assets::Handle, texture::TextureData};

#[derive(Debug)]
pub enum AssetEvent {
    TextureLoaded {
        handle: Handle<TextureData>,
        data: TextureData,
    },
    TextureFailed {
        handle: Handle<TextureData>,
        error: AssetError,
    },
}

impl AssetEvent {
    pub fn texture_handle(&self) -> Handle<TextureData> {
        match self {
            Self::TextureLoaded { handle, .. } | Self::TextureFailed { handle, .. } => *handle,
        }
    }
}

/// Receiving end of the asset channel, owned by the host's main thread.
pub struct AssetEvents {
    receiver: UnboundedReceiver<AssetEvent>,
}

impl AssetEvents {
    pub(crate) fn new(receiver: UnboundedReceiver<AssetEvent>) -> Self {
        Self { receiver }
    }

    /// Next finished load, without blocking.
    pub fn try_next(&mut self) -> Option<AssetEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Everything that finished since the last call.
    pub fn drain(&mut self) -> Vec<AssetEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Waits for the next finished load. `None` once every `AssetServer` is gone.
    pub async fn next(&mut self) -> Option<AssetEvent> {
        self.receiver.recv().await
    }
}
