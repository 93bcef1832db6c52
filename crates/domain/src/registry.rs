//! Participant registry: membership changes on a pool aggregate.
//!
//! All capacity movement delegates to the ledger; the registry adds the
//! membership guards (`AlreadyJoined`, `NotAParticipant`) and surfaces the
//! manager-withdrawal signal that forces cancellation upstream.

use crate::entities::participant::Participant;
use crate::entities::pool::{Pool, UserId};
use crate::error::DomainError;
use crate::ledger;
use chrono::{DateTime, Utc};

/// Outcome of removing a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// A regular participant left; capacity was released.
    Left,
    /// The pool's originator withdrew. Capacity was released, but the
    /// caller must force-cancel the pool instead of keeping it open.
    ManagerWithdrew,
}

/// Adds a non-manager participant with `quantity` units.
///
/// Fails with `AlreadyJoined` when the user already holds an active record
/// and with `CapacityExceeded` when the ledger rejects the reservation; in
/// both cases the participant list is untouched.
pub fn add_participant(
    pool: &mut Pool,
    user_id: UserId,
    quantity: u32,
    joined_at: DateTime<Utc>,
) -> Result<(), DomainError> {
    if pool.participant(user_id).is_some() {
        return Err(DomainError::AlreadyJoined);
    }
    ledger::reserve(pool, quantity)?;
    pool.participants
        .push(Participant::new(user_id, quantity, false, joined_at));
    Ok(())
}

/// Replaces the user's committed quantity.
///
/// The ledger adjustment is atomic: on `CapacityExceeded` the prior
/// quantity is retained.
pub fn change_quantity(
    pool: &mut Pool,
    user_id: UserId,
    new_quantity: u32,
) -> Result<(), DomainError> {
    let old_quantity = pool
        .participant(user_id)
        .ok_or(DomainError::NotAParticipant)?
        .quantity;
    ledger::adjust(pool, old_quantity, new_quantity)?;
    if let Some(participant) = pool.participant_mut(user_id) {
        participant.quantity = new_quantity;
    }
    Ok(())
}

/// Removes the user's participant record and releases its quantity.
///
/// Removing the last participant does not delete the pool; pools retire
/// through state, never through row deletion.
pub fn remove_participant(pool: &mut Pool, user_id: UserId) -> Result<Removal, DomainError> {
    let index = pool
        .participants
        .iter()
        .position(|p| p.user_id == user_id)
        .ok_or(DomainError::NotAParticipant)?;

    let removed = pool.participants.remove(index);
    ledger::release(pool, removed.quantity);

    if removed.is_manager {
        Ok(Removal::ManagerWithdrew)
    } else {
        Ok(Removal::Left)
    }
}

/// Sets the participant's payment flag.
pub fn set_paid(pool: &mut Pool, user_id: UserId, paid: bool) -> Result<(), DomainError> {
    pool.participant_mut(user_id)
        .ok_or(DomainError::NotAParticipant)?
        .has_paid = paid;
    Ok(())
}

/// Marks the participant's delivery as fulfilled.
pub fn set_fulfilled(pool: &mut Pool, user_id: UserId) -> Result<(), DomainError> {
    pool.participant_mut(user_id)
        .ok_or(DomainError::NotAParticipant)?
        .is_fulfilled = true;
    Ok(())
}

/// Marks the participant as having reviewed the offer.
pub fn set_reviewed(pool: &mut Pool, user_id: UserId) -> Result<(), DomainError> {
    pool.participant_mut(user_id)
        .ok_or(DomainError::NotAParticipant)?
        .has_reviewed = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pool_with_manager, user};

    #[test]
    fn test_join_reserves_capacity() {
        // Quota 5, manager holds 2.
        let mut pool = pool_with_manager(5, 2);
        let b = user();

        let created_at = pool.created_at;
        add_participant(&mut pool, b, 3, created_at).unwrap();
        assert_eq!(pool.remaining_capacity, 0);
        assert_eq!(pool.participants.len(), 2);
        assert_eq!(pool.committed_quantity(), 5);
    }

    #[test]
    fn test_duplicate_join_rejected() {
        let mut pool = pool_with_manager(5, 2);
        let b = user();
        let created_at = pool.created_at;
        add_participant(&mut pool, b, 1, created_at).unwrap();
        assert_eq!(
            add_participant(&mut pool, b, 1, created_at),
            Err(DomainError::AlreadyJoined)
        );
        assert_eq!(pool.participants.len(), 2);
        assert_eq!(pool.remaining_capacity, 2);
    }

    #[test]
    fn test_oversized_join_leaves_pool_untouched() {
        let mut pool = pool_with_manager(5, 2);
        let b = user();
        let created_at = pool.created_at;
        assert_eq!(
            add_participant(&mut pool, b, 4, created_at),
            Err(DomainError::CapacityExceeded)
        );
        assert_eq!(pool.participants.len(), 1);
        assert_eq!(pool.remaining_capacity, 3);
    }

    #[test]
    fn test_change_quantity_retains_prior_on_failure() {
        let mut pool = pool_with_manager(5, 2);
        let b = user();
        let created_at = pool.created_at;
        add_participant(&mut pool, b, 2, created_at).unwrap();

        assert_eq!(
            change_quantity(&mut pool, b, 4),
            Err(DomainError::CapacityExceeded)
        );
        assert_eq!(pool.participant(b).unwrap().quantity, 2);
        assert_eq!(pool.remaining_capacity, 1);

        change_quantity(&mut pool, b, 3).unwrap();
        assert_eq!(pool.participant(b).unwrap().quantity, 3);
        assert_eq!(pool.remaining_capacity, 0);
    }

    #[test]
    fn test_change_quantity_requires_membership() {
        let mut pool = pool_with_manager(5, 2);
        assert_eq!(
            change_quantity(&mut pool, user(), 1),
            Err(DomainError::NotAParticipant)
        );
    }

    #[test]
    fn test_leave_releases_capacity() {
        let mut pool = pool_with_manager(5, 2);
        let b = user();
        let created_at = pool.created_at;
        add_participant(&mut pool, b, 3, created_at).unwrap();

        assert_eq!(remove_participant(&mut pool, b), Ok(Removal::Left));
        assert_eq!(pool.remaining_capacity, 3);
        assert!(pool.participant(b).is_none());
    }

    #[test]
    fn test_manager_withdrawal_is_signaled() {
        let mut pool = pool_with_manager(5, 2);
        let manager_id = pool.manager().unwrap().user_id;
        assert_eq!(
            remove_participant(&mut pool, manager_id),
            Ok(Removal::ManagerWithdrew)
        );
        assert!(pool.participants.is_empty());
    }

    #[test]
    fn test_capacity_invariant_over_mixed_sequence() {
        let mut pool = pool_with_manager(10, 4);
        let b = user();
        let c = user();

        let created_at = pool.created_at;
        add_participant(&mut pool, b, 3, created_at).unwrap();
        add_participant(&mut pool, c, 2, created_at).unwrap();
        change_quantity(&mut pool, b, 5).unwrap();
        remove_participant(&mut pool, c).unwrap();

        assert_eq!(
            pool.remaining_capacity,
            pool.offer.minimum_quota - pool.committed_quantity()
        );
    }

    #[test]
    fn test_payment_flag_updates() {
        let mut pool = pool_with_manager(5, 2);
        let b = user();
        let created_at = pool.created_at;
        add_participant(&mut pool, b, 1, created_at).unwrap();

        set_paid(&mut pool, b, true).unwrap();
        assert!(pool.participant(b).unwrap().has_paid);
        set_paid(&mut pool, b, false).unwrap();
        assert!(!pool.participant(b).unwrap().has_paid);

        assert_eq!(
            set_paid(&mut pool, user(), true),
            Err(DomainError::NotAParticipant)
        );
    }

    #[test]
    fn test_fulfilled_and_reviewed_flags() {
        let mut pool = pool_with_manager(5, 2);
        let manager_id = pool.manager().unwrap().user_id;

        set_fulfilled(&mut pool, manager_id).unwrap();
        set_reviewed(&mut pool, manager_id).unwrap();
        let p = pool.participant(manager_id).unwrap();
        assert!(p.is_fulfilled);
        assert!(p.has_reviewed);
    }
}
