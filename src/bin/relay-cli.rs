use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Management CLI for the relay proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show running state, port, routes and captured logs
    Status,
    /// Start the proxy listener
    Start,
    /// Stop the proxy listener
    Stop,
    /// Change the proxy port (proxy must be stopped)
    Port { port: i64 },
    /// Add a route
    Add {
        path_prefix: String,
        target_base_url: String,
    },
    /// Remove a route
    Remove { route_id: String },
    /// Change a route's prefix and target
    Edit {
        route_id: String,
        path_prefix: String,
        target_base_url: String,
    },
    /// Enable or disable a route
    Toggle { route_id: String },
    /// Drop all captured logs
    ClearLogs,
    /// Re-send a captured request
    Repeat { log_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let api = format!("{}/api/proxy", cli.url.trim_end_matches('/'));

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/status", api)),
        Commands::Start => client.post(format!("{}/start", api)),
        Commands::Stop => client.post(format!("{}/stop", api)),
        Commands::Port { port } => client
            .post(format!("{}/port", api))
            .json(&json!({ "port": port })),
        Commands::Add {
            path_prefix,
            target_base_url,
        } => client
            .post(format!("{}/route", api))
            .json(&json!({ "pathPrefix": path_prefix, "targetBaseUrl": target_base_url })),
        Commands::Remove { route_id } => client
            .delete(format!("{}/route", api))
            .json(&json!({ "routeId": route_id })),
        Commands::Edit {
            route_id,
            path_prefix,
            target_base_url,
        } => client.put(format!("{}/route", api)).json(&json!({
            "routeId": route_id,
            "pathPrefix": path_prefix,
            "targetBaseUrl": target_base_url,
        })),
        Commands::Toggle { route_id } => client
            .post(format!("{}/route/toggle", api))
            .json(&json!({ "routeId": route_id })),
        Commands::ClearLogs => client.post(format!("{}/logs/clear", api)),
        Commands::Repeat { log_id } => client
            .post(format!("{}/repeat", api))
            .json(&json!({ "logId": log_id })),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: control API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    if json["success"] == false {
        std::process::exit(1);
    }
    Ok(())
}
