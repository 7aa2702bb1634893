//! Plain-text rendering of the board.

use std::fmt::Write as _;

use tableside_types::{BoardSnapshot, TableId};

/// Render every table's ready and error lines, then the pending orders.
pub fn render_board(snapshot: &BoardSnapshot) -> String {
    let mut out = String::new();

    for (table, lines) in &snapshot.table_food {
        let _ = writeln!(out, "table {table}");
        for line in lines {
            let _ = writeln!(out, "  {line}");
        }
        append_errors(&mut out, snapshot, *table);
    }
    for table in snapshot.errors.keys() {
        if table.is_attributable() && !snapshot.table_food.contains_key(table) {
            let _ = writeln!(out, "table {table}");
            append_errors(&mut out, snapshot, *table);
        }
    }

    if snapshot
        .errors
        .get(&TableId::UNKNOWN)
        .is_some_and(|lines| !lines.is_empty())
    {
        let _ = writeln!(out, "unattributed");
        append_errors(&mut out, snapshot, TableId::UNKNOWN);
    }

    let pending = snapshot.pending();
    if pending > 0 {
        let _ = writeln!(out, "pending ({pending})");
        for order in snapshot.in_flight.values() {
            let _ = writeln!(out, "  {} for table {} [{}]", order.food, order.table, order.order_id);
        }
    }

    out
}

fn append_errors(out: &mut String, snapshot: &BoardSnapshot, table: TableId) {
    for line in snapshot.errors.get(&table).into_iter().flatten() {
        let _ = writeln!(out, "  ! {line}");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tableside_types::Order;

    use super::*;

    #[test]
    fn renders_tables_errors_and_pending() {
        let snapshot = BoardSnapshot {
            table_food: BTreeMap::from([
                (TableId::new(1), vec!["Soup (ready)".to_owned()]),
                (TableId::new(2), Vec::new()),
            ]),
            errors: BTreeMap::from([
                (TableId::UNKNOWN, vec!["(no food) — invalid".to_owned()]),
                (TableId::new(2), vec!["Tea — cold".to_owned()]),
            ]),
            in_flight: BTreeMap::from([(
                "o7".to_owned(),
                Order {
                    order_id: "o7".to_owned(),
                    table: TableId::new(1),
                    food: "Cake".to_owned(),
                    ts: 0,
                },
            )]),
        };

        assert_eq!(
            render_board(&snapshot),
            "table 1\n  Soup (ready)\ntable 2\n  ! Tea — cold\n\
             unattributed\n  ! (no food) — invalid\n\
             pending (1)\n  Cake for table 1 [o7]\n"
        );
    }

    #[test]
    fn empty_unknown_bucket_is_hidden() {
        let snapshot = BoardSnapshot {
            table_food: BTreeMap::from([(TableId::new(1), Vec::new())]),
            errors: BTreeMap::from([(TableId::UNKNOWN, Vec::new())]),
            in_flight: BTreeMap::new(),
        };
        assert_eq!(render_board(&snapshot), "table 1\n");
    }

    #[test]
    fn error_only_tables_are_rendered() {
        let snapshot = BoardSnapshot {
            table_food: BTreeMap::from([(TableId::new(1), Vec::new())]),
            errors: BTreeMap::from([(TableId::new(9), vec!["Cake — burnt".to_owned()])]),
            in_flight: BTreeMap::new(),
        };
        assert_eq!(
            render_board(&snapshot),
            "table 1\ntable 9\n  ! Cake — burnt\n"
        );
    }
}
