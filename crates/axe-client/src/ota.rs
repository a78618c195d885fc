//! Shared OTA plumbing: image chunking with progress forwarding.

use axe_types::{OtaEvent, OtaEventSender};
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

/// Bytes handed to the transport per progress step.
pub const OTA_CHUNK_SIZE: usize = 16 * 1024;

/// Split an image into `OTA_CHUNK_SIZE` slices without copying.
pub(crate) fn chunks(image: &Bytes) -> Vec<Bytes> {
    (0..image.len())
        .step_by(OTA_CHUNK_SIZE)
        .map(|start| image.slice(start..(start + OTA_CHUNK_SIZE).min(image.len())))
        .collect()
}

/// Body stream that reports `UploadProgress` as each chunk is pulled by the transport.
///
/// An empty image has no chunks, so its single `UploadProgress { 0, 0 }` is sent up front.
pub(crate) fn progress_stream(
    image: Bytes,
    events: OtaEventSender,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let total = image.len() as u64;
    if total == 0 {
        let _ = events.send(Ok(OtaEvent::UploadProgress { loaded: 0, total }));
    }
    let mut loaded = 0u64;
    stream::iter(chunks(&image)).map(move |chunk| {
        loaded += chunk.len() as u64;
        let _ = events.send(Ok(OtaEvent::UploadProgress { loaded, total }));
        Ok(chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axe_types::OtaUpload;

    #[test]
    fn chunks_cover_image_exactly() {
        let image = Bytes::from(vec![7u8; OTA_CHUNK_SIZE * 2 + 10]);
        let parts = chunks(&image);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), OTA_CHUNK_SIZE);
        assert_eq!(parts[2].len(), 10);
        assert!(chunks(&Bytes::new()).is_empty());
    }

    #[tokio::test]
    async fn progress_tracks_pulled_chunks() {
        let (tx, mut upload) = OtaUpload::from_channel();
        let image = Bytes::from(vec![1u8; OTA_CHUNK_SIZE + 1]);
        let body: Vec<_> = progress_stream(image, tx).collect().await;
        assert_eq!(body.len(), 2);

        let first = upload.next().await.unwrap().unwrap();
        assert_eq!(
            first,
            OtaEvent::UploadProgress {
                loaded: OTA_CHUNK_SIZE as u64,
                total: OTA_CHUNK_SIZE as u64 + 1
            }
        );
        let second = upload.next().await.unwrap().unwrap();
        assert_eq!(second.percent(), Some(100));
    }

    #[tokio::test]
    async fn empty_image_still_reports_full_progress() {
        let (tx, mut upload) = OtaUpload::from_channel();
        let body: Vec<_> = progress_stream(Bytes::new(), tx).collect().await;
        assert!(body.is_empty());

        let only = upload.next().await.unwrap().unwrap();
        assert_eq!(only, OtaEvent::UploadProgress { loaded: 0, total: 0 });
        assert_eq!(only.percent(), Some(100));
        assert!(upload.next().await.is_none());
    }
}
