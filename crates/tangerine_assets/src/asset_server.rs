use std::path::PathBuf;

use tangerine_core::IoTaskPool;
use tokio::runtime::Handle as TokioHandle;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

use crate::{
    AssetError,
    asset_events::{AssetEvent, AssetEvents},
    assets::Handle,
    texture::TextureData,
};

/// Where the bytes of a texture come from.
#[derive(Clone, Debug)]
pub enum TextureSource {
    File(PathBuf),
    Embedded {
        name: &'static str,
        bytes: &'static [u8],
    },
}

impl TextureSource {
    pub fn name(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Embedded { name, .. } => (*name).to_owned(),
        }
    }

    fn read_and_decode(&self) -> Result<TextureData, AssetError> {
        let name = self.name();
        match self {
            Self::File(path) => {
                let bytes = std::fs::read(path).map_err(|e| AssetError::Io {
                    path: name.clone(),
                    message: e.to_string(),
                })?;
                TextureData::decode(&name, &bytes)
            }
            Self::Embedded { bytes, .. } => TextureData::decode(&name, bytes),
        }
    }
}

/// Starts asset loads on the I/O runtime and reports completion as `AssetEvent`s.
#[derive(Clone)]
pub struct AssetServer {
    event_sender: UnboundedSender<AssetEvent>,
    // Runtime the loads are spawned on.
    io_handle: TokioHandle,
}

impl AssetServer {
    /// Creates the server and the receiving end the host drains every tick.
    pub fn new(io: IoTaskPool) -> (Self, AssetEvents) {
        let (tx, rx) = unbounded_channel();
        let server = Self {
            event_sender: tx,
            io_handle: io.0,
        };
        (server, AssetEvents::new(rx))
    }

    /// Fire-and-forget texture load. The returned handle identifies the
    /// matching `TextureLoaded` / `TextureFailed` event.
    pub fn load_texture(&self, source: TextureSource) -> Handle<TextureData> {
        let handle = Handle::<TextureData>::new();
        let sender = self.event_sender.clone();

        // Use the handle to spawn, this works from any thread.
        self.io_handle.spawn(async move {
            let name = source.name();
            log::info!("loading texture {name}");

            let result = tokio::task::spawn_blocking(move || source.read_and_decode()).await;

            let event = match result {
                Ok(Ok(data)) => {
                    log::debug!("texture {name} decoded ({}x{})", data.width, data.height);
                    AssetEvent::TextureLoaded { handle, data }
                }
                Ok(Err(error)) => AssetEvent::TextureFailed { handle, error },
                Err(join_error) => {
                    log::error!("texture worker for {name} failed: {join_error}");
                    AssetEvent::TextureFailed {
                        handle,
                        error: AssetError::WorkerLost(name),
                    }
                }
            };

            if sender.send(event).is_err() {
                log::debug!("asset events receiver dropped, discarding result");
            }
        });

        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ORANGE_TEXTURE;

    fn server() -> (AssetServer, AssetEvents) {
        AssetServer::new(IoTaskPool(TokioHandle::current()))
    }

    #[tokio::test]
    async fn embedded_texture_arrives_as_loaded_event() {
        let (server, mut events) = server();
        let handle = server.load_texture(TextureSource::Embedded {
            name: "orange.png",
            bytes: ORANGE_TEXTURE,
        });

        match events.next().await {
            Some(AssetEvent::TextureLoaded { handle: got, data }) => {
                assert_eq!(got, handle);
                assert_eq!(data.name, "orange.png");
                assert_eq!(data.width, 64);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn drain_returns_every_finished_load() {
        let (server, mut events) = server();
        assert!(events.drain().is_empty());

        let first = server.load_texture(TextureSource::Embedded {
            name: "orange.png",
            bytes: ORANGE_TEXTURE,
        });
        let second = server.load_texture(TextureSource::File("no/such/texture.png".into()));

        // Wait for one, then let the other finish before draining.
        let mut seen = vec![events.next().await.unwrap().texture_handle()];
        while seen.len() < 2 {
            tokio::task::yield_now().await;
            seen.extend(events.drain().iter().map(AssetEvent::texture_handle));
        }

        assert!(seen.contains(&first));
        assert!(seen.contains(&second));
        assert!(events.drain().is_empty());
    }

    #[tokio::test]
    async fn missing_file_reports_io_failure() {
        let (server, mut events) = server();
        let handle = server.load_texture(TextureSource::File("no/such/texture.png".into()));

        match events.next().await {
            Some(AssetEvent::TextureFailed { handle: got, error }) => {
                assert_eq!(got, handle);
                assert!(matches!(error, AssetError::Io { .. }));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_bytes_report_decode_failure() {
        let (server, mut events) = server();
        server.load_texture(TextureSource::Embedded {
            name: "broken.png",
            bytes: b"\x89PNG but not really",
        });

        let event = events.next().await.unwrap();
        assert!(matches!(
            event,
            AssetEvent::TextureFailed {
                error: AssetError::Decode { .. },
                ..
            }
        ));
    }
}
