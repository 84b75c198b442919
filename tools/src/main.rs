//! lookalike-runner: headless runner for the customer analytics core.
//!
//! Usage:
//!   lookalike-runner --data-dir ./data --mode summary
//!   lookalike-runner --data-dir ./data --mode lookalikes --customer C0001 --k 3
//!   lookalike-runner --data-dir ./data --mode segment --clusters 5
//!   lookalike-runner --data-dir ./data --mode recommend --customer C0001
//!   lookalike-runner --data-dir ./data --ipc-mode

use anyhow::Result;
use lookalike_core::{
    config::PipelineConfig,
    dataset::Dataset,
    engine::AnalyticsEngine,
    error::AnalyticsError,
    table::{self, RawTable},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Summary,
    Features,
    Lookalikes {
        customer_id: String,
        #[serde(default)]
        k: Option<usize>,
    },
    Segment {
        #[serde(default)]
        n_clusters: Option<usize>,
    },
    Recommend {
        customer_id: String,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = flag(&args, "--data-dir").unwrap_or("./data");
    let mode = flag(&args, "--mode").unwrap_or("summary");

    let config = match flag(&args, "--config") {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let dataset = load_dataset(data_dir)?;
    log::info!(
        "loaded {} customers, {} products, {} transactions from {data_dir}",
        dataset.customers.len(),
        dataset.products.len(),
        dataset.transactions.len()
    );
    let engine = AnalyticsEngine::new(dataset, config);

    if ipc_mode {
        return run_ipc_loop(&engine);
    }

    let output = match mode {
        "summary" => serde_json::to_value(engine.summary())?,
        "features" => serde_json::to_value(engine.features()?)?,
        "lookalikes" => {
            let customer = required(&args, "--customer")?;
            let k = parse_arg(&args, "--k", engine.config.lookalike.k);
            let neighbors = engine.lookalikes(customer, Some(k))?;
            println!("Customers similar to {customer}:");
            for n in &neighbors {
                println!("  Customer ID: {}, Similarity Score: {:.2}", n.customer_id, n.score);
            }
            serde_json::to_value(neighbors)?
        }
        "segment" => {
            let requested = flag(&args, "--clusters").and_then(|v| v.parse().ok());
            let n = engine.config.segmentation.bounded_clusters(requested)?;
            let view = engine.segment_with_projection(Some(n))?;
            println!("Davies-Bouldin Index: {:.2}", view.outcome.davies_bouldin);
            serde_json::to_value(view)?
        }
        "recommend" => {
            let customer = required(&args, "--customer")?;
            serde_json::to_value(engine.recommendations(customer)?)?
        }
        other => anyhow::bail!("Unknown mode: {other}"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_dataset(data_dir: &str) -> Result<Dataset> {
    let customers = read_table(data_dir, table::CUSTOMERS)?;
    let products = read_table(data_dir, table::PRODUCTS)?;
    let transactions = read_table(data_dir, table::TRANSACTIONS)?;
    Ok(Dataset::from_tables(&customers, &products, &transactions)?)
}

fn read_table(data_dir: &str, name: &str) -> Result<RawTable> {
    let path = format!("{data_dir}/{name}.json");
    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    Ok(RawTable::from_json_str(name, &content)?)
}

/// One JSON command per stdin line, one JSON reply per stdout line.
/// Errors are reported in-band and the loop keeps going.
fn run_ipc_loop(engine: &AnalyticsEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Unparseable command: {}", buffer.trim());
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            cmd => dispatch(&engine, cmd),
        };

        let line = match reply {
            Ok(value) => value,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
    }
    Ok(())
}

/// Answer one IPC command. Cluster requests go through the same
/// `min_clusters..=max_clusters` bound as `--mode segment`.
fn dispatch(engine: &AnalyticsEngine, cmd: IpcCommand) -> Result<serde_json::Value, AnalyticsError> {
    match cmd {
        IpcCommand::Summary => serde_json::to_value(engine.summary()).map_err(Into::into),
        IpcCommand::Features => engine
            .features()
            .and_then(|f| serde_json::to_value(f).map_err(Into::into)),
        IpcCommand::Lookalikes { customer_id, k } => engine
            .lookalikes(&customer_id, k)
            .and_then(|n| serde_json::to_value(n).map_err(Into::into)),
        IpcCommand::Segment { n_clusters } => engine
            .config
            .segmentation
            .bounded_clusters(n_clusters)
            .and_then(|n| engine.segment_with_projection(Some(n)))
            .and_then(|v| serde_json::to_value(v).map_err(Into::into)),
        IpcCommand::Recommend { customer_id } => engine
            .recommendations(&customer_id)
            .and_then(|r| serde_json::to_value(r).map_err(Into::into)),
        IpcCommand::Quit => Ok(serde_json::Value::Null),
    }
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn required<'a>(args: &'a [String], name: &str) -> Result<&'a str> {
    flag(args, name).ok_or_else(|| anyhow::anyhow!("{name} is required"))
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], name: &str, default: T) -> T {
    flag(args, name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
