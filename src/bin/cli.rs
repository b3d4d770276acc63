//! respkv CLI Client
//!
//! Sends one command to a respkv server and prints the reply.

use std::io::BufReader;
use std::net::TcpStream;

use clap::Parser;
use respkv::protocol::{read_value, write_value, Value};

/// respkv CLI
#[derive(Parser, Debug)]
#[command(name = "respkv-cli")]
#[command(about = "CLI for the respkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6371")]
    server: String,

    /// Command name followed by its arguments, e.g. `HSET users alice 1`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() {
    let args = Args::parse();

    match run(&args) {
        Ok(reply) => {
            println!("{}", format_reply(&reply, 0));
            if reply.is_error() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Could not talk to {}: {}", args.server, e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> respkv::Result<Value> {
    let stream = TcpStream::connect(&args.server)?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    let request = Value::Array(
        args.command
            .iter()
            .map(|part| Value::bulk(part.clone()))
            .collect(),
    );
    write_value(&mut writer, &request)?;

    read_value(&mut reader)?.ok_or(respkv::KvError::Incomplete)
}

/// Render a reply the way redis-cli does
fn format_reply(value: &Value, indent: usize) -> String {
    match value {
        Value::SimpleString(text) => text.clone(),
        Value::Error(message) => format!("(error) {}", message),
        Value::Integer(n) => format!("(integer) {}", n),
        Value::Bulk(data) => format!("{:?}", String::from_utf8_lossy(data)),
        Value::Null => "(nil)".to_string(),
        Value::Array(items) if items.is_empty() => "(empty array)".to_string(),
        Value::Array(items) => {
            let width = items.len().to_string().len();
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let pad = if i == 0 { 0 } else { indent };
                    format!(
                        "{:pad$}{:>width$}) {}",
                        "",
                        i + 1,
                        format_reply(item, indent + width + 2),
                        pad = pad,
                        width = width
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
