use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;

use fuel::config::{load_config, ClientConfig};
use fuel::interceptor::{
    curl_logging_request_interceptor, logging_request_interceptor, logging_response_interceptor,
};
use fuel::observability::init_logging;
use fuel::{FuelManager, Method, Response};

#[derive(Parser)]
#[command(name = "fuel-cli")]
#[command(about = "Issue a single HTTP request through the fuel pipeline", long_about = None)]
struct Cli {
    /// TOML client configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP method
    #[arg(short = 'X', long = "request", default_value = "GET")]
    method: String,

    /// Request header as `name:value` (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Do not follow redirects
    #[arg(long)]
    no_redirects: bool,

    /// Connect timeout in milliseconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the equivalent curl command before sending
    #[arg(long)]
    curl: bool,

    /// Absolute URL, or a path relative to the configured base path
    url: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    init_logging(&config.logging)?;

    let manager = FuelManager::builder().config(config).own_workers().build()?;
    manager.add_request_interceptor(logging_request_interceptor());
    manager.add_response_interceptor(logging_response_interceptor());
    if cli.curl {
        manager.add_request_interceptor(curl_logging_request_interceptor());
    }

    let method: Method = cli.method.parse()?;
    let mut request = manager
        .request(method, &cli.url, Vec::<(String, String)>::new())?
        .allow_redirects(!cli.no_redirects);

    for header in &cli.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("invalid header '{}', expected name:value", header))?;
        request = request.append_header(name.trim(), value.trim());
    }
    if let Some(data) = cli.data {
        request = request.body(data);
    }
    if let Some(ms) = cli.timeout {
        request = request.timeout(Duration::from_millis(ms));
    }
    if cli.curl {
        println!("{}", request.curl_string());
    }

    let (_, response, result) = manager.blocking_string(request);
    print_response(&response);

    match result {
        Ok(_) => Ok(true),
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(false)
        }
    }
}

fn print_response(response: &Response) {
    if response.is_empty_response() {
        return;
    }
    println!("{} {}", response.status_code(), response.status_message());
    for (name, value) in response.headers().iter() {
        println!("{}: {}", name, value);
    }
    println!();

    let is_json = response
        .headers()
        .get("Content-Type")
        .is_some_and(|ct| ct.contains("json"));
    let pretty = if is_json {
        serde_json::from_slice::<Value>(response.body())
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
    } else {
        None
    };
    println!("{}", pretty.unwrap_or_else(|| response.text_lossy()));
}
