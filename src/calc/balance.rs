use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum BalanceError {
    /// Applying the movement would drive the running balance below zero.
    NegativeInventory {
        current: i32,
        cartons_in: i32,
        cartons_out: i32,
    },
    /// A RECEIVE is being reduced below what has already been shipped against
    /// its batch. Rejected even if the net balance would stay non-negative;
    /// the rule is scoped per originating receipt.
    ReductionBelowShipped {
        requested: i32,
        already_shipped: i32,
        batch_lot: String,
    },
}

impl fmt::Display for BalanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceError::NegativeInventory {
                current,
                cartons_in,
                cartons_out,
            } => write!(
                f,
                "would create negative inventory: current balance {} cartons, {} in, {} out",
                current, cartons_in, cartons_out
            ),
            BalanceError::ReductionBelowShipped {
                requested,
                already_shipped,
                batch_lot,
            } => write!(
                f,
                "cannot reduce receipt to {} cartons: {} cartons from batch \"{}\" have already been shipped; minimum allowed is {}",
                requested, already_shipped, batch_lot, already_shipped
            ),
        }
    }
}

/// Balance update for one movement. The never-negative invariant is enforced
/// here; callers roll back the whole unit of work on error.
pub fn apply_movement(current: i32, cartons_in: i32, cartons_out: i32) -> Result<i32, BalanceError> {
    let new_balance = current + cartons_in - cartons_out;
    if new_balance < 0 {
        return Err(BalanceError::NegativeInventory {
            current,
            cartons_in,
            cartons_out,
        });
    }
    Ok(new_balance)
}

/// Amendment rule for correcting a recorded RECEIVE downward: the new
/// cartons-in must still cover everything shipped against the batch since the
/// original receipt.
pub fn validate_receive_reduction(
    new_cartons_in: i32,
    already_shipped: i32,
    batch_lot: &str,
) -> Result<(), BalanceError> {
    if new_cartons_in < already_shipped {
        return Err(BalanceError::ReductionBelowShipped {
            requested: new_cartons_in,
            already_shipped,
            batch_lot: batch_lot.to_string(),
        });
    }
    Ok(())
}

/// Historical balance snapshot: sum of in minus out over a scope's movements,
/// floored at zero.
pub fn replay_balance<I: IntoIterator<Item = (i32, i32)>>(movements: I) -> i32 {
    movements
        .into_iter()
        .fold(0i32, |acc, (cartons_in, cartons_out)| acc + cartons_in - cartons_out)
        .max(0)
}

pub fn units_for(cartons: i32, units_per_carton: i32) -> i32 {
    cartons * units_per_carton.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_and_ship_update_the_balance() {
        assert_eq!(apply_movement(0, 50, 0), Ok(50));
        assert_eq!(apply_movement(50, 0, 30), Ok(20));
    }

    #[test]
    fn shipping_more_than_on_hand_is_rejected() {
        // a SHIP of 30 against a balance of 20 fails and the balance stays 20
        let err = apply_movement(20, 0, 30).unwrap_err();
        assert_eq!(
            err,
            BalanceError::NegativeInventory {
                current: 20,
                cartons_in: 0,
                cartons_out: 30
            }
        );
        assert!(err.to_string().contains("negative inventory"));
    }

    #[test]
    fn draining_to_exactly_zero_is_allowed() {
        assert_eq!(apply_movement(30, 0, 30), Ok(0));
    }

    #[test]
    fn receive_reduction_below_shipped_quantity_fails() {
        // 100 received, 60 already shipped, amendment to 40 must fail
        let err = validate_receive_reduction(40, 60, "LOT-2024-07").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("60 cartons"));
        assert!(msg.contains("already been shipped"));
        assert!(msg.contains("LOT-2024-07"));
    }

    #[test]
    fn receive_reduction_down_to_shipped_quantity_is_allowed() {
        assert!(validate_receive_reduction(60, 60, "LOT-2024-07").is_ok());
        assert!(validate_receive_reduction(80, 60, "LOT-2024-07").is_ok());
    }

    #[test]
    fn replay_matches_sum_of_ins_minus_outs() {
        let movements = [(100, 0), (0, 30), (25, 0), (0, 45)];
        assert_eq!(replay_balance(movements), 50);
    }

    #[test]
    fn replay_floors_at_zero() {
        // corrupt history cannot produce a negative snapshot
        assert_eq!(replay_balance([(10, 0), (0, 40)]), 0);
    }

    #[test]
    fn unit_count_uses_units_per_carton() {
        assert_eq!(units_for(50, 24), 1200);
        // unset factor defaults to 1 unit per carton
        assert_eq!(units_for(50, 0), 50);
    }
}
