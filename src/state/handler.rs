// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Long-polling loop over the `refreshStates` endpoint.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::StateResolver;
use crate::config::RetryPolicy;
use crate::error::{Error, ParseError, Result};
use crate::protocol::RestClient;
use crate::subscription::panic_message;

/// Callback receiving every successfully polled diff document.
pub type UpdateCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Lifecycle state of a [`StateHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// Created, not started yet.
    Idle,
    /// A poll request is outstanding or about to be sent.
    Polling,
    /// Waiting after a failed poll.
    Backoff {
        /// Number of consecutive failed polls.
        attempt: u32,
        /// Wait before the next poll.
        delay: Duration,
    },
    /// Stopped. Terminal.
    Stopped,
}

/// Cursor part of a diff document.
#[derive(Deserialize)]
struct RefreshCursor {
    last: u64,
}

/// Polls the hub for state changes and hands every diff to a callback.
///
/// The loop runs on its own tokio task. It starts at cursor 0, which makes
/// the hub answer immediately with its current position, and continues from
/// the `last` value of each answer. The hub holds a request for up to 30
/// seconds when nothing changes.
///
/// Failed polls are retried after the delay given by the [`RetryPolicy`]:
/// by default 1 second for the first two consecutive failures and 30
/// seconds from the third on. A failed poll is any transport error, error
/// status or a document which is not a valid diff.
///
/// The callback runs on the polling task. A panic in the callback is logged
/// and does not end the loop.
///
/// # Examples
///
/// ```no_run
/// use fibaro_lib::{ClientConfig, RetryPolicy, StateHandler};
/// use std::sync::Arc;
///
/// # async fn example() -> fibaro_lib::Result<()> {
/// let rest_client = ClientConfig::new("http://192.168.1.166/api/")
///     .with_credentials("admin", "admin")
///     .into_rest_client()?;
///
/// let mut handler = StateHandler::new(
///     rest_client,
///     Arc::new(|diff| println!("{diff}")),
///     std::time::Duration::from_secs(35),
///     RetryPolicy::default(),
/// );
/// handler.start()?;
///
/// // ...
/// handler.stop();
/// # Ok(())
/// # }
/// ```
pub struct StateHandler {
    rest_client: RestClient,
    callback: UpdateCallback,
    refresh_timeout: Duration,
    retry_policy: RetryPolicy,
    state: Arc<watch::Sender<HandlerState>>,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl StateHandler {
    /// Creates a handler in the [`Idle`](HandlerState::Idle) state.
    #[must_use]
    pub fn new(
        rest_client: RestClient,
        callback: UpdateCallback,
        refresh_timeout: Duration,
        retry_policy: RetryPolicy,
    ) -> Self {
        let (state, _) = watch::channel(HandlerState::Idle);
        let (stop, _) = watch::channel(false);
        Self {
            rest_client: rest_client.detached(),
            callback,
            refresh_timeout,
            retry_policy,
            state: Arc::new(state),
            stop,
            task: None,
        }
    }

    /// Spawns the polling task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerAlreadyStarted`] if the handler is not idle
    /// and [`Error::NoRuntime`] if called outside a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.state() != HandlerState::Idle {
            return Err(Error::HandlerAlreadyStarted);
        }
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        self.state.send_replace(HandlerState::Polling);
        let poll_loop = PollLoop {
            rest_client: self.rest_client.clone(),
            callback: Arc::clone(&self.callback),
            refresh_timeout: self.refresh_timeout,
            retry_policy: self.retry_policy.clone(),
            state: Arc::clone(&self.state),
            stop: self.stop.subscribe(),
        };
        self.task = Some(runtime.spawn(poll_loop.run()));
        Ok(())
    }

    /// Stops the polling loop.
    ///
    /// Closes the poll transport so an outstanding poll is aborted, and
    /// returns without waiting for the task. Other requests on clones of the
    /// [`RestClient`] passed to [`new`](Self::new) are not affected. No
    /// callback is invoked after this returns, except one that is already
    /// running. Calling `stop` again has no effect.
    pub fn stop(&self) {
        if self.stop.send_replace(true) {
            return;
        }
        tracing::debug!("Stopping the state change handler");
        self.rest_client.close();
        self.state.send_replace(HandlerState::Stopped);
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> HandlerState {
        *self.state.borrow()
    }

    /// Returns a receiver observing lifecycle state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<HandlerState> {
        self.state.subscribe()
    }

    /// Returns `true` while the polling task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for StateHandler {
    fn drop(&mut self) {
        self.stop.send_replace(true);
        self.state.send_replace(HandlerState::Stopped);
    }
}

impl std::fmt::Debug for StateHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateHandler")
            .field("base_url", &self.rest_client.base_url())
            .field("state", &self.state())
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Polling task
// ============================================================================

struct PollLoop {
    rest_client: RestClient,
    callback: UpdateCallback,
    refresh_timeout: Duration,
    retry_policy: RetryPolicy,
    state: Arc<watch::Sender<HandlerState>>,
    stop: watch::Receiver<bool>,
}

impl PollLoop {
    async fn run(mut self) {
        tracing::info!(
            base_url = %self.rest_client.base_url(),
            "Starting the state change handler"
        );

        let mut last: u64 = 0;
        let mut failures: u32 = 0;

        while !self.is_stopped() {
            let endpoint = format!("refreshStates?last={last}");
            let result = tokio::select! {
                result = self.rest_client.get(&endpoint, Some(self.refresh_timeout)) => result,
                _ = self.stop.wait_for(|stopped| *stopped) => break,
            };

            if self.is_stopped() {
                break;
            }

            match result.map_err(Error::from).and_then(parse_diff) {
                Ok((cursor, document)) => {
                    failures = 0;
                    last = cursor;
                    self.set_state(HandlerState::Polling);
                    self.dispatch(&document);
                }
                Err(error) => {
                    failures = failures.saturating_add(1);
                    let delay = self.retry_policy.delay_for_failure(failures);
                    tracing::warn!(attempt = failures, error = %error, "Connection error");
                    if failures == self.retry_policy.long_delay_after {
                        tracing::info!(
                            delay_secs = delay.as_secs(),
                            "Fallback to long connection retry timer"
                        );
                    }

                    self.set_state(HandlerState::Backoff {
                        attempt: failures,
                        delay,
                    });
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        _ = self.stop.wait_for(|stopped| *stopped) => break,
                    }
                    self.set_state(HandlerState::Polling);
                }
            }
        }

        self.set_state(HandlerState::Stopped);
        tracing::info!("State change handler stopped");
    }

    fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Updates the state unless the handler was stopped in the meantime.
    fn set_state(&self, next: HandlerState) {
        self.state.send_if_modified(|current| {
            if *current == HandlerState::Stopped || *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn dispatch(&self, document: &Value) {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| (self.callback)(document))) {
            tracing::warn!(
                panic = panic_message(panic.as_ref()),
                "Error in state change callback"
            );
        }
    }
}

/// Validates a poll answer and extracts the new cursor.
fn parse_diff(response: Option<Value>) -> Result<(u64, Value)> {
    let Some(document) = response else {
        let message = "refreshStates returned no content".to_string();
        return Err(ParseError::UnexpectedFormat(message).into());
    };
    tracing::debug!(body = %document, "State diff received");

    StateResolver::new(&document)?;
    let cursor = RefreshCursor::deserialize(&document).map_err(ParseError::Json)?;
    Ok((cursor.last, document))
}
