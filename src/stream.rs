//! Drains a fragment stream into a renderer.

use std::time::{Duration, Instant};

use futures::StreamExt;

use crate::client::TokenStream;
use crate::error::Result;
use crate::observability::{STREAM_DURATION, STREAM_FRAGMENTS};
use crate::render::Renderer;

/// How fragments are paced on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pause after each fragment to imitate typing.  Zero disables it.
    pub delay: Duration,
}

impl RenderOptions {
    /// Options with the given per-fragment delay.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

/// Consume `fragments`, showing the growing text after each one.
///
/// On success the final text (the concatenation of every fragment, in order) is shown
/// with [`Renderer::finish_response`] and returned.  A stream with only whitespace is
/// returned without finishing, so the caller decides how to report it.  The first error
/// stops the stream and is returned as is; whatever was shown so far stays on screen
/// but nothing else is done with it.  There is no way to stop early.
pub async fn render_stream(
    mut fragments: TokenStream,
    renderer: &mut dyn Renderer,
    options: RenderOptions,
) -> Result<String> {
    let start = Instant::now();
    let mut buffer = String::new();
    let mut count = 0usize;

    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        buffer.push_str(&fragment);
        count += 1;
        STREAM_FRAGMENTS.click();
        renderer.show_partial(&buffer, &fragment);
        if !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    STREAM_DURATION.add(start.elapsed().as_secs_f64());
    tracing::debug!(fragments = count, chars = buffer.len(), "stream drained");
    if !buffer.trim().is_empty() {
        renderer.finish_response(&buffer);
    }
    Ok(buffer)
}
