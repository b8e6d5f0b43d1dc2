//! Streaming translation consumer
//!
//! Consumes the chunked translation event stream and merges partial results
//! into the session incrementally. The raw transport delivers bytes in
//! arbitrary fragments; [`SseDecoder`] reassembles records, [`StreamEvent`]
//! types them, and [`StreamSession`] applies them in arrival order.
//!
//! Merging is monotonic: chunk content already applied is never rolled back,
//! a failed chunk is recorded without aborting the stream, and a corrupt
//! frame is skipped without terminating it.

mod decoder;
mod types;

pub use decoder::{RawEvent, SseDecoder};
pub use types::{
    ChunkFailure, CompletePayload, ErrorPayload, InitPayload, ProgressPayload, StreamError,
    StreamEvent, StreamSession, StreamStatus,
};

pub(crate) use types::excerpt as payload_excerpt;

use futures::{Stream, StreamExt};

/// Drive `session` to a terminal state from a fragment stream.
///
/// Accepts any byte-fragment stream so tests can feed synthetic splits; the
/// production caller passes `reqwest::Response::bytes_stream()`.
///
/// Returns `Ok` only when the stream reached `complete`. A transport error,
/// a protocol-level `error` event, or a stream that ends without a terminal
/// event all fail the session — the content merged so far stays available on
/// the session either way.
pub async fn drive<S, B, E>(stream: S, session: &mut StreamSession) -> Result<(), StreamError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut decoder = SseDecoder::new();
    futures::pin_mut!(stream);

    while let Some(fragment) = stream.next().await {
        let fragment = match fragment {
            Ok(fragment) => fragment,
            Err(err) => {
                let message = err.to_string();
                session.fail(format!("transport error: {message}"));
                return Err(StreamError::Transport(message));
            }
        };

        for raw in decoder.push(fragment.as_ref()) {
            if let Some(event) = StreamEvent::parse(&raw) {
                session.apply(event);
            }
        }
        if session.is_terminal() {
            break;
        }
    }

    if !session.is_terminal() {
        // The server may have omitted the final blank line.
        if let Some(raw) = decoder.finish() {
            if let Some(event) = StreamEvent::parse(&raw) {
                session.apply(event);
            }
        }
    }

    match session.status() {
        StreamStatus::Complete => Ok(()),
        StreamStatus::Failed => Err(StreamError::Protocol(
            session
                .failure
                .clone()
                .unwrap_or_else(|| "stream failed".to_string()),
        )),
        _ => {
            session.fail("stream ended before completion");
            Err(StreamError::Truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn fragments(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, Infallible>> {
        let owned: Vec<Result<Vec<u8>, Infallible>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        futures::stream::iter(owned)
    }

    fn progress(chunk: u32, total: u32, text: &str) -> String {
        format!(
            "event: progress\ndata: {{\"chunk_number\":{chunk},\"total_chunks\":{total},\"translated_chunk\":\"{text}\",\"status\":\"success\"}}\n\n"
        )
    }

    #[tokio::test]
    async fn accumulates_chunks_in_order() {
        let mut session = StreamSession::new();
        let wire = [
            "event: init\ndata: {\"total_chunks\":3}\n\n".to_string(),
            progress(1, 3, "A"),
            progress(2, 3, "B"),
            progress(3, 3, "C"),
            "event: complete\ndata: {\"content\":\"ABC\",\"translation_file\":\"out/t.md\"}\n\n"
                .to_string(),
        ]
        .concat();
        let parts: Vec<&str> = vec![&wire];

        drive(fragments(&parts), &mut session).await.unwrap();

        assert_eq!(session.status(), StreamStatus::Complete);
        assert_eq!(session.content(), "ABC");
        assert_eq!(session.received_chunks, 3);
        assert_eq!(session.total_chunks, Some(3));
        assert_eq!(session.translation_file.as_deref(), Some("out/t.md"));
    }

    #[tokio::test]
    async fn arbitrary_fragmentation_does_not_change_the_result() {
        let wire = [
            "event: init\ndata: {\"total_chunks\":2}\n\n".to_string(),
            progress(1, 2, "Hola "),
            progress(2, 2, "mundo"),
            "event: complete\ndata: {\"content\":\"Hola mundo\"}\n\n".to_string(),
        ]
        .concat();

        // Split the wire at a few awkward places, including mid-record.
        let parts: Vec<&str> = vec![&wire[..7], &wire[7..40], &wire[40..41], &wire[41..]];
        let mut session = StreamSession::new();
        drive(fragments(&parts), &mut session).await.unwrap();

        assert_eq!(session.content(), "Hola mundo");
        assert_eq!(session.received_chunks, 2);
    }

    #[tokio::test]
    async fn failed_chunk_is_recorded_and_stream_completes() {
        let wire = [
            "event: init\ndata: {\"total_chunks\":3}\n\n".to_string(),
            progress(1, 3, "A"),
            "event: progress\ndata: {\"chunk_number\":2,\"total_chunks\":3,\"translated_chunk\":\"\",\"status\":\"failed\",\"error\":\"timeout\"}\n\n".to_string(),
            progress(3, 3, "C"),
            "event: complete\ndata: {\"content\":\"\"}\n\n".to_string(),
        ]
        .concat();
        let parts: Vec<&str> = vec![&wire];

        let mut session = StreamSession::new();
        drive(fragments(&parts), &mut session).await.unwrap();

        assert_eq!(session.status(), StreamStatus::Complete);
        // Empty complete payload keeps the accumulated chunks.
        assert_eq!(session.content(), "AC");
        assert_eq!(session.received_chunks, 3);
        assert_eq!(
            session.chunk_failures,
            vec![ChunkFailure {
                chunk_number: 2,
                error: "timeout".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn malformed_record_is_skipped_not_fatal() {
        let wire = [
            "event: init\ndata: {\"total_chunks\":2}\n\n".to_string(),
            progress(1, 2, "A"),
            "event: progress\ndata: {not json at all\n\n".to_string(),
            progress(2, 2, "B"),
            "event: complete\ndata: {\"content\":\"AB\"}\n\n".to_string(),
        ]
        .concat();
        let parts: Vec<&str> = vec![&wire];

        let mut session = StreamSession::new();
        drive(fragments(&parts), &mut session).await.unwrap();

        assert_eq!(session.content(), "AB");
        // The corrupt frame never became a counted chunk.
        assert_eq!(session.received_chunks, 2);
    }

    #[tokio::test]
    async fn protocol_error_preserves_merged_content() {
        let wire = [
            "event: init\ndata: {\"total_chunks\":3}\n\n".to_string(),
            progress(1, 3, "partial "),
            "event: error\ndata: {\"message\":\"backend exploded\"}\n\n".to_string(),
        ]
        .concat();
        let parts: Vec<&str> = vec![&wire];

        let mut session = StreamSession::new();
        let err = drive(fragments(&parts), &mut session).await.unwrap_err();

        assert!(matches!(err, StreamError::Protocol(ref m) if m == "backend exploded"));
        assert_eq!(session.status(), StreamStatus::Failed);
        assert_eq!(session.content(), "partial ");
        assert_eq!(session.failure.as_deref(), Some("backend exploded"));
    }

    #[tokio::test]
    async fn truncated_stream_fails_but_keeps_content() {
        let wire = [
            "event: init\ndata: {\"total_chunks\":2}\n\n".to_string(),
            progress(1, 2, "only half"),
        ]
        .concat();
        let parts: Vec<&str> = vec![&wire];

        let mut session = StreamSession::new();
        let err = drive(fragments(&parts), &mut session).await.unwrap_err();

        assert!(matches!(err, StreamError::Truncated));
        assert_eq!(session.status(), StreamStatus::Failed);
        assert_eq!(session.content(), "only half");
    }

    #[tokio::test]
    async fn unterminated_final_complete_record_is_flushed() {
        let wire = [
            "event: init\ndata: {\"total_chunks\":1}\n\n".to_string(),
            progress(1, 1, "X"),
            // No trailing blank line after the final record.
            "event: complete\ndata: {\"content\":\"X\"}".to_string(),
        ]
        .concat();
        let parts: Vec<&str> = vec![&wire];

        let mut session = StreamSession::new();
        drive(fragments(&parts), &mut session).await.unwrap();
        assert_eq!(session.status(), StreamStatus::Complete);
    }

    #[tokio::test]
    async fn init_with_zero_total_means_unknown_total() {
        let wire = [
            "event: init\ndata: {\"total_chunks\":0}\n\n".to_string(),
            "event: progress\ndata: {\"chunk_number\":1,\"translated_chunk\":\"A\"}\n\n"
                .to_string(),
            "event: complete\ndata: {\"content\":\"A\"}\n\n".to_string(),
        ]
        .concat();
        let parts: Vec<&str> = vec![&wire];

        let mut session = StreamSession::new();
        drive(fragments(&parts), &mut session).await.unwrap();

        assert_eq!(session.total_chunks, None);
        assert_eq!(session.progress_ratio(), None);
        assert_eq!(session.status(), StreamStatus::Complete);
    }

    #[tokio::test]
    async fn transport_error_fails_the_session() {
        let items: Vec<Result<Vec<u8>, String>> = vec![
            Ok(b"event: init\ndata: {\"total_chunks\":2}\n\n".to_vec()),
            Err("connection reset".to_string()),
        ];
        let mut session = StreamSession::new();
        let err = drive(futures::stream::iter(items), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, StreamError::Transport(_)));
        assert_eq!(session.status(), StreamStatus::Failed);
    }
}
