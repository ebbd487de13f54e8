// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for OpenAI streaming completions.
//!
//! Converts a reqwest response byte stream into [`StreamDelta`] items using
//! the `eventsource-stream` crate for SSE protocol compliance. OpenAI emits
//! unnamed events whose data is a JSON chunk, terminated by a literal
//! `[DONE]` sentinel.

use cauce_core::traits::provider::DeltaStream;
use cauce_core::{CauceError, StreamDelta, TokenUsage};
use eventsource_stream::Eventsource;
use futures::stream::StreamExt;

use crate::types::ChatCompletionChunk;

enum Parsed {
    Delta(StreamDelta),
    Done,
    Skip,
    Failed(CauceError),
}

/// Parses a reqwest streaming response into a stream of [`StreamDelta`]s.
///
/// The stream ends at the `[DONE]` sentinel. Chunks carrying neither content
/// nor usage (the role-only opening chunk, keep-alives) are skipped.
pub fn parse_sse_stream(response: reqwest::Response) -> DeltaStream {
    let events = response.bytes_stream().eventsource();

    let deltas = events
        .map(|result| match result {
            Ok(event) => {
                if event.data.trim() == "[DONE]" {
                    return Parsed::Done;
                }
                match serde_json::from_str::<ChatCompletionChunk>(&event.data) {
                    Ok(chunk) => match chunk_to_delta(chunk) {
                        Some(delta) => Parsed::Delta(delta),
                        None => Parsed::Skip,
                    },
                    Err(e) => Parsed::Failed(CauceError::Provider {
                        message: format!("failed to parse completion chunk: {e}"),
                        source: Some(Box::new(e)),
                    }),
                }
            }
            Err(e) => Parsed::Failed(CauceError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            }),
        })
        .take_while(|parsed| futures::future::ready(!matches!(parsed, Parsed::Done)))
        .filter_map(|parsed| async move {
            match parsed {
                Parsed::Delta(delta) => Some(Ok(delta)),
                Parsed::Failed(e) => Some(Err(e)),
                Parsed::Skip | Parsed::Done => None,
            }
        });

    Box::pin(deltas)
}

fn chunk_to_delta(chunk: ChatCompletionChunk) -> Option<StreamDelta> {
    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty());
    let usage = chunk.usage.map(|usage| TokenUsage {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
    });
    if text.is_none() && usage.is_none() {
        return None;
    }
    Some(StreamDelta { text, usage })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    /// Serve raw SSE text with wiremock to get a real reqwest::Response.
    async fn mock_sse_response(sse_text: &str) -> reqwest::Response {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_text.to_string()),
            )
            .mount(&server)
            .await;

        reqwest::get(&server.uri()).await.unwrap()
    }

    fn content_chunk(text: &str) -> String {
        format!(
            "data: {{\"id\":\"chatcmpl-1\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"{text}\"}},\"finish_reason\":null}}]}}\n\n"
        )
    }

    #[tokio::test]
    async fn content_chunks_become_text_deltas() {
        let sse = format!("{}{}data: [DONE]\n\n", content_chunk("Hola"), content_chunk(" mundo"));
        let mut stream = parse_sse_stream(mock_sse_response(&sse).await);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text.as_deref(), Some("Hola"));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.text.as_deref(), Some(" mundo"));
        assert!(stream.next().await.is_none(), "stream ends at [DONE]");
    }

    #[tokio::test]
    async fn role_only_opening_chunk_is_skipped() {
        let sse = format!(
            "data: {{\"id\":\"chatcmpl-1\",\"choices\":[{{\"index\":0,\"delta\":{{\"role\":\"assistant\"}},\"finish_reason\":null}}]}}\n\n{}data: [DONE]\n\n",
            content_chunk("Hola")
        );
        let mut stream = parse_sse_stream(mock_sse_response(&sse).await);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text.as_deref(), Some("Hola"));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn final_usage_chunk_becomes_usage_delta() {
        let sse = format!(
            "{}data: {{\"id\":\"chatcmpl-1\",\"choices\":[],\"usage\":{{\"prompt_tokens\":12,\"completion_tokens\":3,\"total_tokens\":15}}}}\n\ndata: [DONE]\n\n",
            content_chunk("ok")
        );
        let mut stream = parse_sse_stream(mock_sse_response(&sse).await);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text.as_deref(), Some("ok"));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(
            second.usage,
            Some(TokenUsage {
                input_tokens: 12,
                output_tokens: 3
            })
        );
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn malformed_chunk_yields_error() {
        let sse = "data: {not json}\n\ndata: [DONE]\n\n";
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);

        let result = stream.next().await.unwrap();
        assert!(result.is_err());
    }
}
