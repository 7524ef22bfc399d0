//! Local capture devices.

use async_trait::async_trait;

use super::types::{LocalStream, MediaConstraints, MediaError};

/// Source of local audio/video.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Capture a stream satisfying `constraints`. May wait on the user
    /// granting permission.
    async fn get_user_media(&self, constraints: MediaConstraints)
        -> Result<LocalStream, MediaError>;
}

/// Captures nothing. Peers built on its stream are receive-only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDevices;

#[async_trait]
impl MediaDevices for NullDevices {
    async fn get_user_media(
        &self,
        _constraints: MediaConstraints,
    ) -> Result<LocalStream, MediaError> {
        Ok(LocalStream::new("null", Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_devices_yield_an_empty_stream() {
        let stream = NullDevices
            .get_user_media(MediaConstraints::default())
            .await
            .unwrap();
        assert!(stream.tracks().is_empty());
        assert_eq!(stream.id(), "null");
    }
}
