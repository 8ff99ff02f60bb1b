//! The order placement transactor.

use store::{Decrement, InventoryLedger, Order, OrderLedger, Store, UnitOfWork};

use crate::cart::Cart;
use crate::error::PlacementError;
use crate::state::PlacementState;

/// Places orders: resolves the buyer, then writes the order and decrements
/// stock for every line inside one atomic unit of work.
///
/// The placer holds no state of its own between calls; concurrent placements
/// share only the store, and correctness under contention comes from the
/// unit's isolation and the conditioned decrement.
pub struct OrderPlacer<S: Store> {
    store: S,
}

impl<S: Store> OrderPlacer<S> {
    /// Creates a placer over the given store handle.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places `cart` as one all-or-nothing operation.
    ///
    /// Lines are decremented in cart order and the first line that cannot be
    /// satisfied aborts the whole placement; later lines are not attempted.
    /// On any error nothing of the order, its lines or its decrements persists.
    #[tracing::instrument(
        skip(self, cart),
        fields(email = %cart.customer.email, lines = cart.lines.len())
    )]
    pub async fn place_order(&self, cart: Cart) -> Result<Order, PlacementError> {
        let started = std::time::Instant::now();

        let result = self.run(&cart).await;

        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(order_id = %order.id, user_id = %order.user_id, "order placed");
            }
            Err(err) => {
                metrics::counter!("orders_rejected_total", "reason" => err.reason())
                    .increment(1);
                if err.is_rejection() {
                    tracing::warn!(error = %err, "order rejected");
                } else {
                    tracing::error!(error = %err, "order placement failed");
                }
            }
        }

        result
    }

    async fn run(&self, cart: &Cart) -> Result<Order, PlacementError> {
        let mut progress = Progress::default();

        // 1. Resolve the buyer outside the unit
        let user = self
            .store
            .find_or_create(cart.customer.to_new_user())
            .await
            .map_err(|e| progress.abort(PlacementError::UserResolutionFailed(e)))?;
        progress.advance(PlacementState::UserResolved);

        // 2. Open the unit
        let mut unit = self
            .store
            .begin()
            .await
            .map_err(|e| progress.abort(PlacementError::OrderPersistenceFailed(e)))?;

        // 3. Order header and lines
        let order = match unit.insert_order(cart.to_new_order(user.id)).await {
            Ok(order) => order,
            Err(e) => {
                discard(unit).await;
                return Err(progress.abort(PlacementError::OrderPersistenceFailed(e)));
            }
        };
        progress.advance(PlacementState::OrderWritten {
            lines: cart.lines.len(),
        });

        // 4. One conditioned decrement per line, in cart order
        for line in &cart.lines {
            let outcome = unit
                .conditional_decrement(line.product_id, &line.size, line.quantity)
                .await;
            if let Ok(outcome) = &outcome {
                metrics::counter!("stock_decrements_total", "outcome" => outcome.as_str())
                    .increment(1);
            }

            let failure = match outcome {
                Ok(Decrement::Applied) => {
                    if let Some(next) = progress.state.after_line_applied() {
                        progress.advance(next);
                    }
                    continue;
                }
                Ok(Decrement::Insufficient) => PlacementError::InsufficientStock {
                    product_id: line.product_id,
                    size_token: line.size.clone(),
                },
                Ok(Decrement::UnknownSize) => PlacementError::UnknownSize {
                    size_token: line.size.clone(),
                },
                Err(e) => PlacementError::OrderPersistenceFailed(e),
            };
            discard(unit).await;
            return Err(progress.abort(failure));
        }

        // 5. Commit
        if let Err(e) = unit.commit().await {
            return Err(progress.abort(PlacementError::CommitFailed(e)));
        }
        progress.advance(PlacementState::Committed);

        Ok(order)
    }
}

/// Rolls a unit back. A failed rollback still leaves nothing committed, so it
/// is only logged.
async fn discard<U: UnitOfWork>(unit: U) {
    if let Err(e) = unit.rollback().await {
        tracing::error!(error = %e, "rollback failed");
    }
}

/// Tracks the placement state for one call and logs each transition.
#[derive(Debug, Default)]
struct Progress {
    state: PlacementState,
}

impl Progress {
    fn advance(&mut self, next: PlacementState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal placement transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "placement state changed");
        self.state = next;
    }

    fn abort(&mut self, err: PlacementError) -> PlacementError {
        tracing::debug!(from = %self.state, reason = err.reason(), "placement aborted");
        self.state = PlacementState::Aborted;
        err
    }
}
