//! Terminal front end for the Tableside order board.
//!
//! Connects to the broker, keeps the board current as the kitchen reports
//! ready and failed dishes, and lets staff place orders from stdin.
//!
//! # Architecture
//!
//! ```text
//! stdin --> Command --> Board.track_order + publish_order --> broker
//! broker --> ConnectionManager --> Board stores --> log sinks / `board`
//! ```

mod command;
mod error;
mod render;

use tableside_board::{BoardConfig, Connect, MqttConnector, Session, Subscription, publish_order};
use tableside_types::Order;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::command::{Command, USAGE};
use crate::error::ClientError;
use crate::render::render_board;

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// opens the broker session, then reads commands until `quit` or EOF.
///
/// # Errors
///
/// Returns an error if configuration, the connection, or stdin fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("tableside-client starting");
    run().await?;
    info!("tableside-client stopped");

    Ok(())
}

/// Load configuration, open the session, and serve the prompt.
async fn run() -> Result<(), ClientError> {
    // Load configuration from environment
    let config = BoardConfig::from_env()?;
    info!(
        broker_url = config.broker_url,
        table_count = config.table_count,
        reconnect_ms = config.reconnect_period.as_millis(),
        "configuration loaded"
    );

    let session = Session::new(MqttConnector, config);
    let _sinks = watch_stores(&session);
    session.get_client()?;

    println!("{USAGE}");
    let result = run_prompt(&session).await;

    if let Err(e) = session.close().await {
        warn!(error = %e, "disconnect failed");
    }
    result
}

/// Log every change of the board and connection stores.
fn watch_stores<C: Connect>(session: &Session<C>) -> Vec<Subscription> {
    let board = session.board();
    vec![
        session.state().subscribe(|state| {
            info!(state = ?state, "connection state");
        }),
        board.table_food().subscribe(|lines| {
            let ready: usize = lines.values().map(Vec::len).sum();
            info!(ready = ready, "table food updated");
        }),
        board.errors().subscribe(|lines| {
            let errors: usize = lines.values().map(Vec::len).sum();
            info!(errors = errors, "errors updated");
        }),
        board.in_flight().subscribe(|pending| {
            info!(pending = pending.len(), "in-flight orders updated");
        }),
    ]
}

/// Read and execute commands until `quit` or end of input.
async fn run_prompt<C: Connect>(session: &Session<C>) -> Result<(), ClientError> {
    let table_count = session.config().table_count;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line, table_count) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}\n{USAGE}");
                continue;
            }
        };

        match command {
            Command::Order { table, food } => {
                let order = Order::new(table, food);
                session.board().track_order(order.clone());
                match publish_order(session, &order).await {
                    Ok(()) => println!("order {} sent", order.order_id),
                    Err(e) => println!("order {} not sent: {e}", order.order_id),
                }
            }
            Command::Board => print!("{}", render_board(&session.board().snapshot())),
            Command::Status => println!("{:?}", session.state().get()),
            Command::Help => println!("{USAGE}"),
            Command::Quit => break,
        }
    }
    Ok(())
}
