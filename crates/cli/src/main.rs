//! EduQueue CLI - operator commands against the daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "eduqueue")]
#[command(about = "EduQueue operator CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "EDUQUEUE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

/// Queue identity arguments shared by queue-scoped commands
#[derive(clap::Args)]
struct QueueArgs {
    /// Guild id
    guild: u64,
    /// Channel id
    channel: u64,
}

impl QueueArgs {
    fn params(&self) -> Value {
        json!({ "guild": self.guild, "channel": self.channel })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show daemon status
    Status,

    /// List live queues
    List,

    /// Create a queue in a channel
    Create {
        #[command(flatten)]
        queue: QueueArgs,

        /// review, multireview or question
        #[arg(short, long)]
        variant: String,

        #[arg(long, default_value = "")]
        guild_name: String,

        #[arg(long, default_value = "")]
        channel_name: String,
    },

    /// Switch a queue to another variant
    Convert {
        #[command(flatten)]
        queue: QueueArgs,

        #[arg(short, long)]
        variant: String,

        /// Sub-queue that receives the waiting line (review -> multireview)
        #[arg(long)]
        seed: Option<u32>,
    },

    /// Show queue size
    Size {
        #[command(flatten)]
        queue: QueueArgs,
    },

    /// Show where a participant stands
    Position {
        #[command(flatten)]
        queue: QueueArgs,

        participant: u64,
    },

    /// Open or close an assignment for review
    Toggle {
        #[command(flatten)]
        queue: QueueArgs,

        assignment: u32,
    },

    /// Persist one queue
    Save {
        #[command(flatten)]
        queue: QueueArgs,
    },

    /// Reload one queue from disk, replacing the live copy
    Load {
        #[command(flatten)]
        queue: QueueArgs,
    },

    /// Persist every live queue
    SaveAll,

    /// Load every persisted queue
    LoadAll,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct Identity {
    guild: u64,
    channel: u64,
}

#[derive(Deserialize)]
struct Size {
    variant: String,
    total: usize,
}

#[derive(Deserialize)]
struct Summary {
    identity: Identity,
    guild_name: String,
    channel_name: String,
    size: Size,
}

#[derive(Tabled)]
struct QueueRow {
    guild: u64,
    channel: u64,
    name: String,
    variant: String,
    waiting: usize,
}

impl From<Summary> for QueueRow {
    fn from(summary: Summary) -> Self {
        let name = if summary.channel_name.is_empty() {
            "-".to_string()
        } else {
            format!("{}#{}", summary.guild_name, summary.channel_name)
        };
        Self {
            guild: summary.identity.guild,
            channel: summary.identity.channel,
            name,
            variant: summary.size.variant,
            waiting: summary.size.total,
        }
    }
}

async fn call_rpc(url: &str, method: &str, params: Value) -> Result<Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

/// One-line rendering of a tagged outcome (`{"outcome": "...", ...}`)
fn describe_outcome(value: &Value) -> String {
    let Some(tag) = value.get("outcome").and_then(Value::as_str) else {
        return value.to_string();
    };
    let details: Vec<String> = value
        .as_object()
        .into_iter()
        .flatten()
        .filter(|(key, _)| key.as_str() != "outcome")
        .map(|(key, v)| format!("{key}={v}"))
        .collect();
    if details.is_empty() {
        tag.replace('_', " ")
    } else {
        format!("{} ({})", tag.replace('_', " "), details.join(", "))
    }
}

fn with_merged(base: Value, extra: Value) -> Value {
    match (base, extra) {
        (Value::Object(mut base), Value::Object(extra)) => {
            base.extend(extra);
            Value::Object(base)
        }
        (base, _) => base,
    }
}

fn print_queues(result: Value) -> Result<()> {
    let summaries: Vec<Summary> = serde_json::from_value(result)?;
    if summaries.is_empty() {
        println!("{}", "No live queues".yellow());
        return Ok(());
    }
    let rows: Vec<QueueRow> = summaries.into_iter().map(QueueRow::from).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

fn print_save_report(report: &Value) {
    let saved = report["saved"].as_array().map_or(0, Vec::len);
    println!("{}", format!("✓ {saved} queue(s) saved").green().bold());
    for failure in report["failed"].as_array().into_iter().flatten() {
        println!(
            "  {} {}/{}: {}",
            "✗".red(),
            failure["identity"]["guild"],
            failure["identity"]["channel"],
            failure["reason"].as_str().unwrap_or("unknown")
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let url = cli.rpc_url.as_str();

    match cli.command {
        Commands::Status => {
            println!("{}", "EduQueue Status".cyan().bold());
            println!();

            match call_rpc(url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Queues:".bold(), stats["queues"]);
                    println!("  {} {}", "Waiting:".bold(), stats["waiting"]);
                    println!("  {} {}", "In voice:".bold(), stats["connected"]);
                    println!("  {} {}", "Pending notices:".bold(), stats["pending_notices"]);
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::List => {
            let result = call_rpc(url, "queue.list.v1", json!({})).await?;
            print_queues(result)?;
        }

        Commands::Create {
            queue,
            variant,
            guild_name,
            channel_name,
        } => {
            let params = with_merged(
                queue.params(),
                json!({ "variant": variant, "guild_name": guild_name, "channel_name": channel_name }),
            );
            let result = call_rpc(url, "queue.create.v1", params).await?;
            println!("{}", "✓ Queue created".green().bold());
            print_queues(Value::Array(vec![result]))?;
        }

        Commands::Convert {
            queue,
            variant,
            seed,
        } => {
            let params = with_merged(queue.params(), json!({ "variant": variant, "seed": seed }));
            let result = call_rpc(url, "queue.convert.v1", params).await?;
            println!("{}", describe_outcome(&result).green());
        }

        Commands::Size { queue } => {
            let result = call_rpc(url, "queue.size.v1", queue.params()).await?;
            println!("  {} {}", "Variant:".bold(), result["variant"]);
            println!("  {} {}", "Waiting:".bold(), result["total"]);
            if let Some(lanes) = result["lanes"].as_object() {
                for (assignment, size) in lanes {
                    println!("    assignment {assignment}: {size}");
                }
            }
        }

        Commands::Position { queue, participant } => {
            let params = with_merged(queue.params(), json!({ "participant": participant }));
            let result = call_rpc(url, "queue.position.v1", params).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Toggle { queue, assignment } => {
            let params = with_merged(queue.params(), json!({ "assignment": assignment }));
            let result = call_rpc(url, "review.toggle_assignment.v1", params).await?;
            println!("{}", describe_outcome(&result).green());
        }

        Commands::Save { queue } => {
            call_rpc(url, "admin.save.v1", queue.params()).await?;
            println!(
                "{}",
                format!("✓ Queue {}/{} saved", queue.guild, queue.channel).green().bold()
            );
        }

        Commands::Load { queue } => {
            let result = call_rpc(url, "admin.load.v1", queue.params()).await?;
            let verb = if result["replaced"].as_bool().unwrap_or(false) {
                "reloaded"
            } else {
                "loaded"
            };
            println!("{}", format!("✓ Queue {verb}").green().bold());
            print_queues(Value::Array(vec![result["summary"].clone()]))?;
        }

        Commands::SaveAll => {
            let report = call_rpc(url, "admin.save_all.v1", json!({})).await?;
            print_save_report(&report);
        }

        Commands::LoadAll => {
            let outcomes = call_rpc(url, "admin.load_all.v1", json!({})).await?;
            for outcome in outcomes.as_array().into_iter().flatten() {
                match outcome["outcome"].as_str() {
                    Some("loaded") => println!(
                        "  {} {}/{}",
                        "✓".green(),
                        outcome["summary"]["identity"]["guild"],
                        outcome["summary"]["identity"]["channel"]
                    ),
                    _ => println!(
                        "  {} {}: {}",
                        "✗".red(),
                        outcome["source"].as_str().unwrap_or("?"),
                        outcome["reason"].as_str().unwrap_or("unknown")
                    ),
                }
            }
        }
    }

    Ok(())
}
