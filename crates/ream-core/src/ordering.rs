//! # Order Planning
//!
//! Pure checks that run before an order or a status change touches the store.
//!
//! ## Order Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  entries ──► merge_order_lines ──► load papers ──► plan_order           │
//! │                   │                                   │                 │
//! │                   │ empty / qty <= 0 / overflow       ├── discontinued? │
//! │                   ▼                                   │     409         │
//! │             InvalidArgument                           ├── missing?      │
//! │                                                       │     404         │
//! │                                                       ├── qty > stock?  │
//! │                                                       │     409         │
//! │                                                       ▼                 │
//! │                                          OrderPlan { lines, total }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The plan only describes intent. The store applies the stock decrements
//! with a conditional update so a concurrent order can never oversell.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::bulk::require_found;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{OrderLine, OrderStatus, Paper};
use crate::validation::validate_quantity;

// =============================================================================
// Order Creation
// =============================================================================

/// Validates the requested lines and merges repeats of the same product.
///
/// Order of first appearance is kept so entries persist in request order.
pub fn merge_order_lines(lines: &[OrderLine]) -> CoreResult<Vec<OrderLine>> {
    if lines.is_empty() {
        return Err(CoreError::invalid("An order needs at least one entry"));
    }

    let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.quantity)?;

        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| {
                        CoreError::invalid(format!(
                            "Combined quantity for product {} is too large",
                            line.product_id
                        ))
                    })?;
            }
            None => merged.push(*line),
        }
    }

    Ok(merged)
}

/// One line of an order that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    /// Snapshot of the paper's price at planning time.
    pub unit_price_cents: i64,
}

/// A fully checked order, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlan {
    pub lines: Vec<PlannedLine>,
    pub total: Money,
}

/// Checks merged lines against the papers currently stored.
///
/// Discontinued products are reported first, all of them at once, so the
/// caller sees every product that can no longer be sold.
pub fn plan_order(lines: &[OrderLine], papers: &[Paper]) -> CoreResult<OrderPlan> {
    let by_id: HashMap<i64, &Paper> = papers.iter().map(|p| (p.id, p)).collect();

    let discontinued: Vec<String> = lines
        .iter()
        .filter_map(|line| by_id.get(&line.product_id))
        .filter(|paper| paper.discontinued)
        .map(|paper| paper.name.clone())
        .collect();
    if !discontinued.is_empty() {
        return Err(CoreError::DiscontinuedProducts {
            names: discontinued,
        });
    }

    let mut planned = Vec::with_capacity(lines.len());
    let mut total = Money::zero();

    for line in lines {
        let paper = by_id.get(&line.product_id).ok_or_else(|| {
            CoreError::not_found(format!("Paper {} not found", line.product_id))
        })?;

        if line.quantity > paper.stock {
            return Err(CoreError::InsufficientStock {
                paper: paper.name.clone(),
                available: paper.stock,
                requested: line.quantity,
            });
        }

        total = paper
            .price()
            .checked_line_total(line.quantity)
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or_else(|| CoreError::invalid("Order total is too large"))?;

        planned.push(PlannedLine {
            product_id: paper.id,
            product_name: paper.name.clone(),
            quantity: line.quantity,
            unit_price_cents: paper.price_cents,
        });
    }

    Ok(OrderPlan {
        lines: planned,
        total,
    })
}

/// Promised delivery date for an order placed at `order_date`.
///
/// Fails instead of panicking when the date would leave chrono's range.
pub fn delivery_date(order_date: DateTime<Utc>, delivery_days: u32) -> CoreResult<DateTime<Utc>> {
    order_date
        .checked_add_signed(Duration::days(i64::from(delivery_days)))
        .ok_or_else(|| {
            CoreError::invalid(format!(
                "A delivery {delivery_days} days after {order_date} is out of range"
            ))
        })
}

// =============================================================================
// Status Changes
// =============================================================================

/// A planned status write, with the status it was planned against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub order_id: i64,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Plans moving the found orders to `to`.
///
/// `requested` must already be normalised; `found` is what the store
/// returned as `(id, current status)`. Every found order is checked before
/// any change is returned, so one backward move rejects the batch.
pub fn plan_status_change(
    requested: &[i64],
    found: &[(i64, OrderStatus)],
    to: OrderStatus,
) -> CoreResult<Vec<StatusChange>> {
    let found: Vec<(i64, OrderStatus)> = found
        .iter()
        .copied()
        .filter(|(id, _)| requested.contains(id))
        .collect();
    let found = require_found(found, "orders", requested)?;

    let backwards: Vec<i64> = found
        .iter()
        .filter(|(_, from)| !from.can_transition_to(to))
        .map(|(id, _)| *id)
        .collect();
    if !backwards.is_empty() {
        return Err(CoreError::InvalidStatusTransition {
            order_ids: backwards,
            to,
        });
    }

    Ok(found
        .into_iter()
        .map(|(order_id, from)| StatusChange { order_id, from, to })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
