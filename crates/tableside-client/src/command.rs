//! Parsing of the commands typed at the prompt.
//!
//! ```text
//! order <table> <food...>   publish a new order
//! board                     print the current board
//! status                    print the connection state
//! help                      list commands
//! quit                      disconnect and exit
//! ```

use tableside_types::TableId;

use crate::error::ClientError;

/// Usage text printed by `help` and after a bad command.
pub const USAGE: &str = "commands: order <table> <food>, board, status, help, quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send `food` to the kitchen for `table`.
    Order {
        /// Table the order is for.
        table: TableId,
        /// Dish name, may contain spaces.
        food: String,
    },
    /// Print the board.
    Board,
    /// Print the connection state.
    Status,
    /// Print the usage text.
    Help,
    /// Disconnect and exit.
    Quit,
}

impl Command {
    /// Parse one line of input for a board with `table_count` tables.
    ///
    /// Blank lines yield `Ok(None)`.
    pub fn parse(line: &str, table_count: u32) -> Result<Option<Self>, ClientError> {
        let line = line.trim();
        let Some((word, rest)) = split_word(line) else {
            return Ok(None);
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "order" => parse_order(rest, table_count)?,
            "board" => Self::Board,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ClientError::Command(format!("unknown command `{other}`"))),
        };
        Ok(Some(command))
    }
}

fn parse_order(args: &str, table_count: u32) -> Result<Command, ClientError> {
    let (raw_table, food) = split_word(args)
        .ok_or_else(|| ClientError::Command("order needs a table and a food".to_owned()))?;

    let table: i64 = raw_table
        .parse()
        .map_err(|e| ClientError::Command(format!("invalid table `{raw_table}`: {e}")))?;
    if !(1..=i64::from(table_count)).contains(&table) {
        return Err(ClientError::Command(format!(
            "table must be between 1 and {table_count}"
        )));
    }

    let food = food.trim();
    if food.is_empty() {
        return Err(ClientError::Command("order needs a food".to_owned()));
    }

    Ok(Command::Order {
        table: TableId::new(table),
        food: food.to_owned(),
    })
}

/// Split off the first whitespace-delimited word.
fn split_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    Some(input.split_once(char::is_whitespace).unwrap_or((input, "")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_order_with_multi_word_food() {
        let command = Command::parse("order 3  Pad Thai ", 4).unwrap();
        assert_eq!(
            command,
            Some(Command::Order {
                table: TableId::new(3),
                food: "Pad Thai".to_owned(),
            })
        );
    }

    #[test]
    fn blank_line_is_not_a_command() {
        assert_eq!(Command::parse("   ", 4).unwrap(), None);
    }

    #[test]
    fn simple_commands_ignore_case() {
        assert_eq!(Command::parse("BOARD", 4).unwrap(), Some(Command::Board));
        assert_eq!(Command::parse("status", 4).unwrap(), Some(Command::Status));
        assert_eq!(Command::parse("?", 4).unwrap(), Some(Command::Help));
        assert_eq!(Command::parse("exit", 4).unwrap(), Some(Command::Quit));
    }

    #[test]
    fn rejects_tables_outside_the_board() {
        assert!(Command::parse("order 0 Soup", 4).is_err());
        assert!(Command::parse("order 5 Soup", 4).is_err());
        assert!(Command::parse("order -1 Soup", 4).is_err());
        assert!(Command::parse("order two Soup", 4).is_err());
    }

    #[test]
    fn rejects_incomplete_orders() {
        assert!(Command::parse("order", 4).is_err());
        assert!(Command::parse("order 2", 4).is_err());
    }

    #[test]
    fn rejects_unknown_commands() {
        let err = Command::parse("dance", 4).unwrap_err();
        assert!(err.to_string().contains("dance"));
    }
}
