use anyhow::Context;
use env_logger::Builder;
use log::info;
use std::path::PathBuf;

use xlate_core::config::AppConfig;
use xlate_core::logic::{load_table_order, read_table_list, TopoOrderService};
use xlate_core::model::Operation;

/// Usage: `xlate-order [RELATIONS_FILE] [OPERATION TABLE...]`
///
/// Prints the commit order of every table, or, when an operation and tables
/// are given, the commit sequence of just those tables.
fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .or_else(|| config.tables.path.clone())
        .map(PathBuf::from)
        .context("no table relationship file given (argument or tables.path)")?;

    let relations = read_table_list(&path)
        .with_context(|| format!("reading table relationships from {}", path.display()))?;
    info!("read {} table relationships from {}", relations.len(), path.display());

    let service = TopoOrderService::new(&relations);
    let order = load_table_order(&relations, &service)?;

    match args.next() {
        Some(oper) => {
            let oper: Operation = serde_json::from_value(serde_json::Value::String(
                oper.to_uppercase(),
            ))
            .with_context(|| format!("unknown operation '{}'", oper))?;
            let tables: Vec<String> = args.collect();
            let sequence = order.commit_sequence(&tables, oper);
            println!("{}", serde_json::to_string_pretty(&sequence)?);
        }
        None => println!("{}", serde_json::to_string_pretty(&order)?),
    }

    Ok(())
}
