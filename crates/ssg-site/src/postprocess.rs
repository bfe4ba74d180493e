//! Deferred post-process substitutions.
//!
//! Renderers that need the final state of a page (a partial that shows the
//! navigation, say) register a thunk and emit a token such as
//! `[[ssg:post-process-token:3]]` in its place. After the whole chain has run
//! the queue replaces each token with its thunk's output.
//!
//! Thunks run one at a time in registration order, so the output never depends
//! on how long each of them takes.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;

use crate::context::RenderContext;
use crate::error::RenderError;

/// Opening text of every post-process token.
pub const TOKEN_PREFIX: &str = "[[ssg:post-process-token:";
const TOKEN_SUFFIX: &str = "]]";

pub(crate) type PostProcessFn =
    Box<dyn FnOnce(RenderContext) -> BoxFuture<'static, Result<String, RenderError>> + Send>;

/// Format the token for a registration id.
#[must_use]
pub fn post_process_token(id: usize) -> String {
    format!("{TOKEN_PREFIX}{id}{TOKEN_SUFFIX}")
}

/// Pending thunks of one page render, shared by every context clone.
#[derive(Default)]
pub(crate) struct PostProcessQueue {
    next_id: AtomicUsize,
    pending: Mutex<VecDeque<(String, PostProcessFn)>>,
}

impl PostProcessQueue {
    pub(crate) fn register(&self, thunk: PostProcessFn) -> String {
        let token = post_process_token(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back((token.clone(), thunk));
        token
    }

    fn pop(&self) -> Option<(String, PostProcessFn)> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Replace tokens in `content` until no thunk is pending.
    ///
    /// A registered token missing from the content is dropped without running
    /// its thunk. Leftover token text that was never registered in this pass
    /// is an error; a second copy of an already resolved token is kept as is.
    pub(crate) async fn resolve(
        &self,
        ctx: &RenderContext,
        mut content: Vec<u8>,
    ) -> Result<Vec<u8>, RenderError> {
        let mut resolved = HashSet::new();

        while let Some((token, thunk)) = self.pop() {
            match find(&content, token.as_bytes()) {
                Some(start) => {
                    let replacement = thunk(ctx.clone()).await?;
                    content = splice(&content, start, token.len(), replacement.as_bytes());
                }
                None => {
                    tracing::debug!(
                        token = %token,
                        file = %ctx.path,
                        "Post-process token not found in output"
                    );
                }
            }
            resolved.insert(token);
        }

        let mut offset = 0;
        while let Some(found) = find(&content[offset..], TOKEN_PREFIX.as_bytes()) {
            let start = offset + found;
            let rest = &content[start + TOKEN_PREFIX.len()..];
            let Some(end) = find(rest, TOKEN_SUFFIX.as_bytes()) else {
                break;
            };
            let end = start + TOKEN_PREFIX.len() + end + TOKEN_SUFFIX.len();
            let token = String::from_utf8_lossy(&content[start..end]).into_owned();

            if !resolved.contains(&token) {
                return Err(RenderError::UnknownToken {
                    file: ctx.path.clone(),
                    token,
                });
            }
            tracing::warn!(
                token = %token,
                file = %ctx.path,
                "Post-process token repeated, leaving extra copy"
            );
            offset = end;
        }

        Ok(content)
    }
}

impl fmt::Debug for PostProcessQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("PostProcessQueue")
            .field("next_id", &self.next_id)
            .field("pending", &pending)
            .finish()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn splice(content: &[u8], start: usize, len: usize, replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() - len + replacement.len());
    out.extend_from_slice(&content[..start]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&content[start + len..]);
    out
}
