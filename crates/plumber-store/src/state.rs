//! Loading/error envelope shared by the entity stores.

use std::future::Future;

use plumber_core::{Observable, RpcError};

/// Snapshot of a store: cached data plus call status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState<D> {
    /// Latest data fetched from the server.
    pub data: D,
    /// Message of the last failure; cleared when the next call starts.
    pub error: Option<String>,
    in_flight: usize,
}

impl<D> StoreState<D> {
    /// Whether any call on this store is outstanding.
    ///
    /// Overlapping calls keep this true until the last of them ends, not the
    /// first.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.in_flight > 0
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// One outstanding call. Releasing it (including by drop when the call's
/// future is abandoned) ends its contribution to `loading`.
struct InFlight<'a, D> {
    state: &'a Observable<StoreState<D>>,
}

impl<'a, D> InFlight<'a, D> {
    fn begin(state: &'a Observable<StoreState<D>>) -> Self {
        state.update(|s| {
            s.in_flight += 1;
            s.error = None;
        });
        Self { state }
    }

    fn fail(&self, error: &RpcError) {
        let message = error.to_string();
        self.state.update(|s| s.error = Some(message));
    }
}

impl<D> Drop for InFlight<'_, D> {
    fn drop(&mut self) {
        self.state
            .update(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}

/// Run `op` inside the loading/error envelope.
///
/// Marks the store loading and clears the previous error before `op` starts;
/// on failure the message is recorded and the error is still returned.
pub(crate) async fn tracked<D, R, F>(state: &Observable<StoreState<D>>, op: F) -> Result<R, RpcError>
where
    F: Future<Output = Result<R, RpcError>>,
{
    let flight = InFlight::begin(state);
    let result = op.await;
    if let Err(e) = &result {
        tracing::debug!("store call failed: {e}");
        flight.fail(e);
    }
    result
}
