//! Order-board state and the reducers that apply kitchen events to it.
//!
//! The [`Board`] owns three stores:
//!
//! - `table_food` -- ready-food lines per table, in arrival order
//! - `errors` -- error lines per table, with table `0` as the bucket for
//!   events the kitchen could not attribute
//! - `in_flight` -- orders published but not yet answered
//!
//! Buckets for `0..=table_count` are created up front and never removed.
//! Every reducer builds a new map instead of mutating the stored one, so
//! listeners always receive a value that differs from the previous one.

use std::collections::BTreeMap;

use tableside_types::{BoardSnapshot, FoodEvent, FoodStatus, Order, TableId};
use tracing::debug;

use crate::store::Store;

/// Ready-food or error lines keyed by table.
pub type TableLines = BTreeMap<TableId, Vec<String>>;

/// Pending orders keyed by order id.
pub type InFlight = BTreeMap<String, Order>;

/// Observable state of the order board.
#[derive(Clone, Debug)]
pub struct Board {
    table_count: u32,
    table_food: Store<TableLines>,
    errors: Store<TableLines>,
    in_flight: Store<InFlight>,
}

impl Board {
    /// Create a board for `table_count` tables with empty buckets.
    pub fn new(table_count: u32) -> Self {
        let table_food: TableLines = (1..=table_count)
            .map(|t| (TableId::from(t), Vec::new()))
            .collect();
        let mut errors = table_food.clone();
        errors.insert(TableId::UNKNOWN, Vec::new());

        Self {
            table_count,
            table_food: Store::new(table_food),
            errors: Store::new(errors),
            in_flight: Store::new(InFlight::new()),
        }
    }

    /// Number of tables the board was created for.
    pub const fn table_count(&self) -> u32 {
        self.table_count
    }

    /// Ready-food lines per table.
    pub const fn table_food(&self) -> &Store<TableLines> {
        &self.table_food
    }

    /// Error lines per table.
    pub const fn errors(&self) -> &Store<TableLines> {
        &self.errors
    }

    /// Orders awaiting a kitchen answer.
    pub const fn in_flight(&self) -> &Store<InFlight> {
        &self.in_flight
    }

    /// Record an order as pending until the kitchen answers.
    pub fn track_order(&self, order: Order) {
        self.in_flight.update(|pending| {
            let mut next = pending.clone();
            next.insert(order.order_id.clone(), order);
            next
        });
    }

    /// Apply a decoded kitchen event.
    pub fn apply(&self, event: &FoodEvent) {
        match event.status {
            FoodStatus::Ready => self.mark_ready(event),
            FoodStatus::Error => self.mark_error(event),
            FoodStatus::Unrecognized => {
                debug!(
                    order_id = event.order_id,
                    "ignoring food event with unrecognized status"
                );
            }
        }
    }

    /// Append a ready line to the event's table and resolve the order.
    ///
    /// A table without a bucket gets one on demand. An event without a
    /// table is filed under the unknown bucket.
    pub fn mark_ready(&self, event: &FoodEvent) {
        let table = event.table.unwrap_or(TableId::UNKNOWN);
        let line = format_ready_line(event);
        debug!(table = %table, line = line, "food ready");

        self.table_food.update(|lines| append_line(lines, table, line));
        self.resolve(&event.order_id);
    }

    /// Append an error line and resolve the order if it is named.
    ///
    /// Non-positive or missing tables go to the unknown bucket.
    pub fn mark_error(&self, event: &FoodEvent) {
        let table = resolve_error_table(event.table);
        let line = format_error_line(event);
        debug!(table = %table, line = line, "food error");

        self.errors.update(|lines| append_line(lines, table, line));
        if !event.order_id.is_empty() {
            self.resolve(&event.order_id);
        }
    }

    /// Copy all three stores into one serializable value.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            table_food: self.table_food.get(),
            errors: self.errors.get(),
            in_flight: self.in_flight.get(),
        }
    }

    fn resolve(&self, order_id: &str) {
        self.in_flight.update(|pending| {
            let mut next = pending.clone();
            next.remove(order_id);
            next
        });
    }
}

/// Display line for a ready event: `"<food> (ready[, <prepMs>ms])"`.
pub fn format_ready_line(event: &FoodEvent) -> String {
    match event.reported_prep_ms() {
        Some(ms) => format!("{} (ready, {ms}ms)", event.food),
        None => format!("{} (ready)", event.food),
    }
}

/// Display line for an error event: `"<food> — <error>"`.
///
/// An empty food name becomes `(no food)` and a missing reason `error`.
pub fn format_error_line(event: &FoodEvent) -> String {
    let food = if event.food.is_empty() {
        "(no food)"
    } else {
        event.food.as_str()
    };
    let reason = event.reported_error().unwrap_or("error");
    format!("{food} — {reason}")
}

/// Bucket an error event belongs to.
///
/// Positive tables keep their number; zero, negative, and missing tables
/// all collapse into [`TableId::UNKNOWN`].
pub fn resolve_error_table(table: Option<TableId>) -> TableId {
    table
        .filter(|t| t.is_attributable())
        .unwrap_or(TableId::UNKNOWN)
}

fn append_line(lines: &TableLines, table: TableId, line: String) -> TableLines {
    let mut next = lines.clone();
    next.entry(table).or_default().push(line);
    next
}
