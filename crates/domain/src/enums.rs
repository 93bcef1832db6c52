use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    Local,
    Standard,
    Voucher,
}

impl PoolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Standard => "standard",
            Self::Voucher => "voucher",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Self::Local),
            "standard" => Some(Self::Standard),
            "voucher" => Some(Self::Voucher),
            _ => None,
        }
    }
}

/// Pool lifecycle state with its stable wire code.
///
/// Non-negative codes progress toward delivery; negative codes are
/// cancellations, except `ShippingPending` (-4) which is an administrative
/// hold between `Paid` and `Shipping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum PoolState {
    Open,
    QuotaMet,
    Paid,
    Shipping,
    Delivered,
    Expired,
    PaymentFailed,
    ShippingPending,
    ManagerLeft,
    OfferWithdrawn,
}

impl PoolState {
    pub fn code(&self) -> i16 {
        match self {
            Self::Open => 0,
            Self::QuotaMet => 1,
            Self::Paid => 3,
            Self::Shipping => 4,
            Self::Delivered => 5,
            Self::Expired => -1,
            Self::PaymentFailed => -3,
            Self::ShippingPending => -4,
            Self::ManagerLeft => -6,
            Self::OfferWithdrawn => -7,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Open),
            1 => Some(Self::QuotaMet),
            3 => Some(Self::Paid),
            4 => Some(Self::Shipping),
            5 => Some(Self::Delivered),
            -1 => Some(Self::Expired),
            -3 => Some(Self::PaymentFailed),
            -4 => Some(Self::ShippingPending),
            -6 => Some(Self::ManagerLeft),
            -7 => Some(Self::OfferWithdrawn),
            _ => None,
        }
    }

    /// True once the pool accepts no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Delivered
                | Self::Expired
                | Self::PaymentFailed
                | Self::ManagerLeft
                | Self::OfferWithdrawn
        )
    }

    /// True for the cancellation terminals (not `Delivered`).
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::PaymentFailed | Self::ManagerLeft | Self::OfferWithdrawn
        )
    }

    /// True while the pool is still filling its quota and participant
    /// membership may change.
    pub fn accepts_membership_changes(&self) -> bool {
        matches!(self, Self::Open | Self::QuotaMet)
    }
}

impl From<PoolState> for i16 {
    fn from(state: PoolState) -> Self {
        state.code()
    }
}

impl TryFrom<i16> for PoolState {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown pool state code {code}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_round_trip() {
        for state in [
            PoolState::Open,
            PoolState::QuotaMet,
            PoolState::Paid,
            PoolState::Shipping,
            PoolState::Delivered,
            PoolState::Expired,
            PoolState::PaymentFailed,
            PoolState::ShippingPending,
            PoolState::ManagerLeft,
            PoolState::OfferWithdrawn,
        ] {
            assert_eq!(PoolState::from_code(state.code()), Some(state));
        }
        assert_eq!(PoolState::from_code(2), None);
        assert_eq!(PoolState::from_code(-5), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(PoolState::Expired.is_terminal());
        assert!(PoolState::ManagerLeft.is_terminal());
        assert!(PoolState::Delivered.is_terminal());
        assert!(!PoolState::ShippingPending.is_terminal());
        assert!(!PoolState::QuotaMet.is_terminal());

        assert!(!PoolState::Delivered.is_cancelled());
        assert!(PoolState::OfferWithdrawn.is_cancelled());
    }
}
