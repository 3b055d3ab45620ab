//! Bounded Retry
//!
//! Runs a fallible operation up to a fixed number of attempts, with a hook
//! between attempts that can change the state the operation sees.

use std::fmt;

// == Retry Error ==
/// Why [`with_retry`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with an error that is not retried
    Fatal(E),
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, last } => {
                write!(f, "gave up after {} attempts: {}", attempts, last)
            }
            RetryError::Fatal(e) => write!(f, "{}", e),
        }
    }
}

// == With Retry ==
/// Calls `op` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` attempts have been made.
///
/// `on_retry(state, attempt)` runs after each retryable failure that will be
/// followed by another attempt, never after the last one. `max_attempts` of
/// zero is treated as one.
///
/// # Arguments
/// * `state` - State shared by the operation and the retry hook
/// * `max_attempts` - Upper bound on calls to `op`
/// * `op` - The fallible operation
/// * `is_retryable` - Decides whether an error earns another attempt
/// * `on_retry` - Runs between attempts with the failed attempt's number
pub fn with_retry<S, T, E>(
    state: &mut S,
    max_attempts: u32,
    mut op: impl FnMut(&mut S) -> Result<T, E>,
    is_retryable: impl Fn(&E) -> bool,
    mut on_retry: impl FnMut(&mut S, u32),
) -> Result<T, RetryError<E>> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(state) {
            Ok(value) => return Ok(value),
            Err(e) if !is_retryable(&e) => return Err(RetryError::Fatal(e)),
            Err(e) if attempt >= max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                })
            }
            Err(_) => {
                on_retry(state, attempt);
                attempt += 1;
            }
        }
    }
}
