//! Allocation planning.
//!
//! The planner is pure: it takes snapshots of candidate stock records already
//! ordered by warehouse priority and decides how a demanded quantity is split
//! across them. It performs no I/O and never mutates its inputs; quantities
//! claimed by earlier demands of the same request are threaded through an
//! explicit overlay map so one request's items see each other's claims.

use std::collections::HashMap;

use uuid::Uuid;

use crate::entities::stock_record;
use crate::errors::ServiceError;

/// Read-only snapshot of one candidate stock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateStock {
    pub stock_id: Uuid,
    pub quantity_in_stock: i32,
    pub quantity_reserved: i32,
}

impl From<&stock_record::Model> for CandidateStock {
    fn from(model: &stock_record::Model) -> Self {
        Self {
            stock_id: model.id,
            quantity_in_stock: model.quantity_in_stock,
            quantity_reserved: model.quantity_reserved,
        }
    }
}

/// One slice of a plan: take `quantity` units from `stock_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub stock_id: Uuid,
    pub quantity: i32,
}

/// Outcome of planning one demand. `shortfall > 0` means the candidates could
/// not cover the demand; callers must treat that as an all-or-nothing failure
/// and commit none of the allocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    pub allocations: Vec<Allocation>,
    pub shortfall: i32,
}

impl AllocationPlan {
    pub fn is_satisfied(&self) -> bool {
        self.shortfall == 0
    }
}

/// Greedily allocates `quantity` units across `candidates`, consuming them in
/// the given order (the caller's ordering query owns the priority policy; the
/// planner never reorders and never deduplicates).
///
/// `claimed` carries per-stock quantities already promised to earlier demands
/// within the same planning pass; on success the chosen quantities are added
/// to it so subsequent calls see them.
pub fn plan(
    quantity: i32,
    candidates: &[CandidateStock],
    claimed: &mut HashMap<Uuid, i32>,
) -> Result<AllocationPlan, ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(format!(
            "Demand quantity must be positive, got {}",
            quantity
        )));
    }

    let mut remaining = quantity;
    let mut allocations = Vec::new();

    for candidate in candidates {
        if remaining == 0 {
            break;
        }

        let already_claimed = claimed.get(&candidate.stock_id).copied().unwrap_or(0);
        let available = (candidate.quantity_in_stock
            - candidate.quantity_reserved
            - already_claimed)
            .max(0);
        if available == 0 {
            continue;
        }

        let take = available.min(remaining);
        allocations.push(Allocation {
            stock_id: candidate.stock_id,
            quantity: take,
        });
        remaining -= take;
    }

    if remaining == 0 {
        for allocation in &allocations {
            *claimed.entry(allocation.stock_id).or_insert(0) += allocation.quantity;
        }
    }

    Ok(AllocationPlan {
        allocations,
        shortfall: remaining,
    })
}
