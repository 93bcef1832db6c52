//! Lifecycle state machine for pools.
//!
//! State moves either automatically with capacity (`Open` <-> `QuotaMet`)
//! or through explicit transitions validated against a closed table.
//! Every applied transition reports the new state so the caller can fan
//! out the matching participant notification; re-entering the current
//! state is a no-op and reports nothing.

use crate::entities::pool::Pool;
use crate::enums::PoolState;
use crate::error::DomainError;

/// Whether `from -> to` is a legal transition.
///
/// Terminal states accept nothing. `ManagerLeft` and `OfferWithdrawn` are
/// reachable from any non-terminal state; the rest follow the payment and
/// shipping ordering.
pub fn allowed(from: PoolState, to: PoolState) -> bool {
    use PoolState::*;

    if from.is_terminal() {
        return false;
    }
    match (from, to) {
        // Capacity-driven pair.
        (Open, QuotaMet) | (QuotaMet, Open) => true,
        // Deadline expiry only applies while still filling.
        (Open, Expired) => true,
        // Forced cancellations cut across the happy path.
        (_, ManagerLeft) | (_, OfferWithdrawn) => true,
        // Payment settles one way or the other once the quota is met.
        (QuotaMet, Paid) | (QuotaMet, PaymentFailed) => true,
        // Shipping order is strict; the hold state sits between.
        (Paid, ShippingPending) => true,
        (Paid, Shipping) | (ShippingPending, Shipping) => true,
        (Shipping, Delivered) => true,
        _ => false,
    }
}

/// Applies an explicit transition to `target`.
///
/// Returns `Ok(Some(target))` when the state changed, `Ok(None)` for the
/// idempotent same-state case, and `InvalidTransition` otherwise. The pool
/// is untouched on failure.
pub fn advance(pool: &mut Pool, target: PoolState) -> Result<Option<PoolState>, DomainError> {
    if pool.state == target {
        return Ok(None);
    }
    if !allowed(pool.state, target) {
        return Err(DomainError::InvalidTransition {
            from: pool.state,
            to: target,
        });
    }
    pool.state = target;
    Ok(Some(target))
}

/// Re-derives the capacity-driven state after a ledger movement.
///
/// `Open` becomes `QuotaMet` the instant remaining capacity hits zero, and
/// `QuotaMet` reverts to `Open` when capacity is released back above zero.
/// Other states are never touched here. Returns the new state if changed.
pub fn sync_capacity_state(pool: &mut Pool) -> Option<PoolState> {
    match (pool.state, pool.remaining_capacity) {
        (PoolState::Open, 0) => {
            pool.state = PoolState::QuotaMet;
            Some(PoolState::QuotaMet)
        }
        (PoolState::QuotaMet, n) if n > 0 => {
            pool.state = PoolState::Open;
            Some(PoolState::Open)
        }
        _ => None,
    }
}

/// Fixed user-facing message for a signaled state code.
///
/// Unmapped codes (only `Open`) produce no notification.
pub fn notice_for(state: PoolState) -> Option<&'static str> {
    match state {
        PoolState::Open => None,
        PoolState::QuotaMet => Some("The pool quota has been met. Payment is starting."),
        PoolState::Paid => Some("Payment completed. Shipping will begin soon."),
        PoolState::Shipping => Some("Shipping has started."),
        PoolState::Delivered => Some("Your order has been delivered."),
        PoolState::Expired => Some("The deadline passed and the group purchase was cancelled."),
        PoolState::PaymentFailed => Some("Payment failed. Please check your payment details."),
        PoolState::ShippingPending => Some("Shipping will begin shortly."),
        PoolState::ManagerLeft => {
            Some("The organizer left and the group purchase was cancelled.")
        }
        PoolState::OfferWithdrawn => {
            Some("The seller withdrew the offer and the group purchase was cancelled.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pool_with_quota;

    #[test]
    fn test_happy_path_ordering() {
        let mut pool = pool_with_quota(5);
        pool.remaining_capacity = 0;
        pool.state = PoolState::QuotaMet;

        assert_eq!(advance(&mut pool, PoolState::Paid), Ok(Some(PoolState::Paid)));
        assert_eq!(
            advance(&mut pool, PoolState::Delivered),
            Err(DomainError::InvalidTransition {
                from: PoolState::Paid,
                to: PoolState::Delivered,
            })
        );
        assert_eq!(
            advance(&mut pool, PoolState::Shipping),
            Ok(Some(PoolState::Shipping))
        );
        assert_eq!(
            advance(&mut pool, PoolState::Delivered),
            Ok(Some(PoolState::Delivered))
        );
    }

    #[test]
    fn test_shipping_cannot_precede_payment() {
        let mut pool = pool_with_quota(5);
        assert!(advance(&mut pool, PoolState::Shipping).is_err());
        assert!(advance(&mut pool, PoolState::Delivered).is_err());
        assert_eq!(pool.state, PoolState::Open);
    }

    #[test]
    fn test_shipping_hold_sits_between_paid_and_shipping() {
        let mut pool = pool_with_quota(5);
        pool.state = PoolState::Paid;
        assert_eq!(
            advance(&mut pool, PoolState::ShippingPending),
            Ok(Some(PoolState::ShippingPending))
        );
        assert_eq!(
            advance(&mut pool, PoolState::Shipping),
            Ok(Some(PoolState::Shipping))
        );
    }

    #[test]
    fn test_same_state_is_noop() {
        let mut pool = pool_with_quota(5);
        pool.state = PoolState::Paid;
        assert_eq!(advance(&mut pool, PoolState::Paid), Ok(None));
        assert_eq!(pool.state, PoolState::Paid);
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for terminal in [
            PoolState::Expired,
            PoolState::PaymentFailed,
            PoolState::ManagerLeft,
            PoolState::OfferWithdrawn,
            PoolState::Delivered,
        ] {
            let mut pool = pool_with_quota(5);
            pool.state = terminal;
            assert!(advance(&mut pool, PoolState::ManagerLeft).is_err());
            assert!(advance(&mut pool, PoolState::Open).is_err());
        }
    }

    #[test]
    fn test_forced_cancellation_from_any_progressing_state() {
        for from in [
            PoolState::Open,
            PoolState::QuotaMet,
            PoolState::Paid,
            PoolState::ShippingPending,
            PoolState::Shipping,
        ] {
            let mut pool = pool_with_quota(5);
            pool.state = from;
            assert_eq!(
                advance(&mut pool, PoolState::OfferWithdrawn),
                Ok(Some(PoolState::OfferWithdrawn))
            );

            let mut pool = pool_with_quota(5);
            pool.state = from;
            assert_eq!(
                advance(&mut pool, PoolState::ManagerLeft),
                Ok(Some(PoolState::ManagerLeft))
            );
        }
    }

    #[test]
    fn test_expiry_only_from_open() {
        let mut pool = pool_with_quota(5);
        assert_eq!(
            advance(&mut pool, PoolState::Expired),
            Ok(Some(PoolState::Expired))
        );

        let mut pool = pool_with_quota(5);
        pool.state = PoolState::Paid;
        assert!(advance(&mut pool, PoolState::Expired).is_err());
    }

    #[test]
    fn test_capacity_state_sync_fires_once() {
        let mut pool = pool_with_quota(3);
        pool.remaining_capacity = 0;
        assert_eq!(sync_capacity_state(&mut pool), Some(PoolState::QuotaMet));
        // Re-entry is idempotent: no second firing.
        assert_eq!(sync_capacity_state(&mut pool), None);

        pool.remaining_capacity = 2;
        assert_eq!(sync_capacity_state(&mut pool), Some(PoolState::Open));
        assert_eq!(sync_capacity_state(&mut pool), None);
    }

    #[test]
    fn test_capacity_sync_leaves_later_states_alone() {
        let mut pool = pool_with_quota(3);
        pool.state = PoolState::Paid;
        pool.remaining_capacity = 0;
        assert_eq!(sync_capacity_state(&mut pool), None);
        assert_eq!(pool.state, PoolState::Paid);
    }

    #[test]
    fn test_notice_table_covers_signaled_codes() {
        assert!(notice_for(PoolState::Open).is_none());
        for state in [
            PoolState::QuotaMet,
            PoolState::Expired,
            PoolState::Paid,
            PoolState::PaymentFailed,
            PoolState::Shipping,
            PoolState::ShippingPending,
            PoolState::Delivered,
            PoolState::ManagerLeft,
            PoolState::OfferWithdrawn,
        ] {
            assert!(notice_for(state).is_some());
        }
    }
}
