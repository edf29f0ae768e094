//! Reward-distribution arithmetic.
//!
//! All arithmetic is integer, multiply-before-divide, with division
//! remainders truncated toward the protocol. The pool therefore never pays
//! out more than it holds; the undistributed remainder per market is at most
//! one unit per winning position.

use crate::error::{EngineError, Result};

/// Basis-point denominator for fee math.
pub const BASIS_POINT_DIVISOR: u128 = 10_000;

/// Result of the payout computation for a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    /// Amount credited to the position owner.
    pub net: u64,
    /// Amount accrued to the protocol treasury.
    pub fee: u64,
}

/// Payout for a winning position in a two-sided market.
///
/// `gross = amount + amount * losing_pool / winning_pool`, then the fee is
/// taken from the gross share in basis points. Callers handle degenerate
/// (single-sided) markets before reaching this; both pools must be non-zero.
pub fn winning_payout(
    amount: u64,
    winning_pool: u64,
    losing_pool: u64,
    fee_bps: u16,
) -> Result<Payout> {
    debug_assert!(winning_pool > 0 && losing_pool > 0);
    let share = (amount as u128 * losing_pool as u128) / winning_pool as u128;
    let gross = amount as u128 + share;
    let fee = gross * fee_bps as u128 / BASIS_POINT_DIVISOR;
    let net = gross - fee;
    Ok(Payout {
        net: u64::try_from(net).map_err(|_| EngineError::ArithmeticOverflow)?,
        fee: u64::try_from(fee).map_err(|_| EngineError::ArithmeticOverflow)?,
    })
}

/// Refund for any position of a degenerate market: the exact original stake,
/// no fee.
pub fn refund(amount: u64) -> Payout {
    Payout {
        net: amount,
        fee: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_scenario_from_the_fee_schedule() {
        // Pools: winning 200, losing 400. A 200-unit winner at 2% fee takes
        // the whole losing pool: gross 600, fee 12, net 588.
        let payout = winning_payout(200, 200, 400, 200).unwrap();
        assert_eq!(payout, Payout { net: 588, fee: 12 });
    }

    #[test]
    fn zero_fee_pays_the_full_gross_share() {
        let payout = winning_payout(100, 300, 600, 0).unwrap();
        assert_eq!(payout.net, 300);
        assert_eq!(payout.fee, 0);
    }

    #[test]
    fn truncation_biases_toward_the_protocol() {
        // share = 100 * 50 / 300 = 16 (16.66.. truncated down)
        let payout = winning_payout(100, 300, 50, 0).unwrap();
        assert_eq!(payout.net, 116);

        // fee = 116 * 1 / 10000 = 0 truncated; the claimant never gains
        // from rounding, and a sub-unit fee rounds to nothing.
        let payout = winning_payout(100, 300, 50, 1).unwrap();
        assert_eq!(payout.net, 116);
        assert_eq!(payout.fee, 0);
    }

    #[test]
    fn maximal_fee_consumes_the_entire_share() {
        let payout = winning_payout(200, 200, 400, 10_000).unwrap();
        assert_eq!(payout.net, 0);
        assert_eq!(payout.fee, 600);
    }

    #[test]
    fn large_pools_do_not_overflow_intermediate_math() {
        // amount * losing_pool far exceeds u64 but fits the u128 widening.
        let amount = u64::MAX / 2;
        let payout = winning_payout(amount, u64::MAX, u64::MAX / 4, 100).unwrap();
        assert!(payout.net > 0);
    }

    #[test]
    fn overflowing_gross_share_is_reported() {
        // A tiny winning pool against a huge losing pool pushes the gross
        // share past u64.
        let err = winning_payout(u64::MAX, u64::MAX, u64::MAX, 0).unwrap_err();
        assert_eq!(err, EngineError::ArithmeticOverflow);
    }

    #[test]
    fn payouts_plus_fees_never_exceed_the_pools() {
        // Conservation over an uneven stake distribution: the sum of net
        // payouts and fees stays within the combined pools, short by at most
        // one unit per winning position.
        let winners: &[u64] = &[13, 7, 101, 500, 79];
        let winning_pool: u64 = winners.iter().sum();
        let losing_pool: u64 = 997;

        let mut distributed: u128 = 0;
        for &amount in winners {
            let payout = winning_payout(amount, winning_pool, losing_pool, 200).unwrap();
            distributed += payout.net as u128 + payout.fee as u128;
        }
        let total = winning_pool as u128 + losing_pool as u128;
        assert!(distributed <= total);
        assert!(total - distributed <= winners.len() as u128);
    }

    #[test]
    fn refund_returns_the_exact_stake() {
        assert_eq!(refund(750), Payout { net: 750, fee: 0 });
    }
}
