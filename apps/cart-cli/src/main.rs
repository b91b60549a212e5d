//! # GoMarketplace Cart CLI
//!
//! Drives the on-device cart from the shell.
//!
//! ## Usage
//! ```bash
//! # Show the cart
//! cargo run -p gomarket-cli -- list
//!
//! # Add one unit of a product
//! cargo run -p gomarket-cli -- add A "Running Shoe" https://img/a.png 149.9
//!
//! # Change quantities
//! cargo run -p gomarket-cli -- inc A
//! cargo run -p gomarket-cli -- dec A
//!
//! # Use a specific database or config file
//! cargo run -p gomarket-cli -- --db ./cart_dev.db list
//! cargo run -p gomarket-cli -- --config ./cart.toml clear
//! ```
//!
//! Every run hydrates the cart, applies the command, waits for the write to
//! land, prints the cart and exits.

use std::env;
use std::path::PathBuf;

use gomarket_cart::{CartConfig, CartStore, StorageBackend};
use gomarket_core::{NewLineItem, Price};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A cart command from the command line.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    List,
    Add {
        id: String,
        title: String,
        image_url: String,
        price: f64,
    },
    Increment(String),
    Decrement(String),
    Clear,
}

/// Parsed command-line arguments.
#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
    help: bool,
    positional: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, command) = match parse_args(env::args().skip(1).collect()) {
        Ok(args) if args.help => {
            print_help();
            return Ok(());
        }
        Ok(args) => match parse_command(&args.positional) {
            Ok(command) => (args, command),
            Err(message) => usage_error(&message),
        },
        Err(message) => usage_error(&message),
    };

    init_tracing();

    let mut config = CartConfig::load(args.config_path)?;
    if let Some(path) = args.db_path {
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.path = Some(path);
    }

    info!(backend = %config.storage.backend, key = %config.storage_key(), "Opening cart");

    let storage = config.open_storage().await?;
    let cart = CartStore::open(storage, &config).await;

    let outcome = apply(&cart, command);
    cart.shutdown().await?;
    outcome?;

    print_cart(&cart);
    Ok(())
}

fn usage_error(message: &str) -> ! {
    eprintln!("error: {}", message);
    eprintln!();
    print_help();
    std::process::exit(2);
}

/// Applies one command to the cart.
fn apply(cart: &CartStore, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::List => {}
        Command::Add {
            id,
            title,
            image_url,
            price,
        } => {
            let item = NewLineItem::new(id, title, image_url, Price::new(price)?);
            cart.add_to_cart(item);
        }
        Command::Increment(id) => {
            cart.increment(&id)?;
        }
        Command::Decrement(id) => {
            cart.decrement(&id)?;
        }
        Command::Clear => cart.clear(),
    }
    Ok(())
}

fn parse_args(raw: Vec<String>) -> Result<Args, String> {
    let mut args = Args::default();

    let mut i = 0;
    while i < raw.len() {
        match raw[i].as_str() {
            flag @ ("--config" | "-c" | "--db" | "-d") => {
                let value = raw
                    .get(i + 1)
                    .ok_or_else(|| format!("missing value for {}", flag))?;
                let path = Some(PathBuf::from(value));
                if flag == "--config" || flag == "-c" {
                    args.config_path = path;
                } else {
                    args.db_path = path;
                }
                i += 1;
            }
            "--help" | "-h" => args.help = true,
            other => args.positional.push(other.to_string()),
        }
        i += 1;
    }

    Ok(args)
}

fn parse_command(positional: &[String]) -> Result<Command, String> {
    let words: Vec<&str> = positional.iter().map(String::as_str).collect();

    match words.as_slice() {
        [] | ["list"] => Ok(Command::List),
        ["add", id, title, image_url, price] => {
            let price = price
                .parse::<f64>()
                .map_err(|_| format!("invalid price: {}", price))?;
            Ok(Command::Add {
                id: id.to_string(),
                title: title.to_string(),
                image_url: image_url.to_string(),
                price,
            })
        }
        ["add", ..] => Err("usage: add <id> <title> <image_url> <price>".to_string()),
        ["inc", id] => Ok(Command::Increment(id.to_string())),
        ["dec", id] => Ok(Command::Decrement(id.to_string())),
        ["clear"] => Ok(Command::Clear),
        [other, ..] => Err(format!("unknown command or wrong arguments: {}", other)),
    }
}

fn print_cart(cart: &CartStore) {
    let items = cart.products();
    if items.is_empty() {
        println!("Cart is empty");
        return;
    }

    println!("{:<12} {:<28} {:>10} {:>5}", "ID", "TITLE", "PRICE", "QTY");
    for item in &items {
        println!(
            "{:<12} {:<28} {:>10} {:>5}",
            item.id, item.title, item.price, item.quantity
        );
    }

    println!();
    println!(
        "{} line(s), {} unit(s)",
        cart.item_count(),
        cart.total_quantity()
    );
}

fn print_help() {
    println!("GoMarketplace Cart");
    println!();
    println!("Usage: gomarket-cart [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  list                                   Show the cart (default)");
    println!("  add <id> <title> <image_url> <price>   Add one unit of a product");
    println!("  inc <id>                               Increase a line by one");
    println!("  dec <id>                               Decrease a line by one");
    println!("  clear                                  Empty the cart");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>    Config file (default: platform config dir/cart.toml)");
    println!("  -d, --db <PATH>        SQLite database file");
    println!("  -h, --help             Show this help message");
}

/// Logs go to stderr so the printed cart stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gomarket=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_parse_options_and_command() {
        let args = parse_args(strings(&["--db", "/tmp/c.db", "inc", "A"])).unwrap();

        assert_eq!(args.db_path, Some(PathBuf::from("/tmp/c.db")));
        assert!(args.config_path.is_none());
        assert_eq!(
            parse_command(&args.positional),
            Ok(Command::Increment("A".into()))
        );
    }

    #[test]
    fn test_option_without_value_is_an_error() {
        assert!(parse_args(strings(&["list", "--db"])).is_err());
        assert!(parse_args(strings(&["-c"])).is_err());

        let args = parse_args(strings(&["-c", "cart.toml", "-d", "c.db"])).unwrap();
        assert_eq!(args.config_path, Some(PathBuf::from("cart.toml")));
        assert_eq!(args.db_path, Some(PathBuf::from("c.db")));
        assert!(args.positional.is_empty());
    }

    #[test]
    fn test_parse_add() {
        let command = parse_command(&strings(&["add", "A", "Shoe", "u", "10.5"])).unwrap();
        assert_eq!(
            command,
            Command::Add {
                id: "A".into(),
                title: "Shoe".into(),
                image_url: "u".into(),
                price: 10.5,
            }
        );

        assert!(parse_command(&strings(&["add", "A", "Shoe", "u", "cheap"])).is_err());
        assert!(parse_command(&strings(&["add", "A"])).is_err());
    }

    #[test]
    fn test_default_is_list() {
        assert_eq!(parse_command(&[]), Ok(Command::List));
        assert!(parse_command(&strings(&["checkout"])).is_err());
    }

    #[tokio::test]
    async fn test_apply_reports_missing_item() {
        let config = CartConfig::in_memory();
        let storage = config.open_storage().await.unwrap();
        let cart = CartStore::open(storage, &config).await;

        assert!(apply(&cart, Command::Decrement("A".into())).is_err());
        apply(
            &cart,
            Command::Add {
                id: "A".into(),
                title: "Shoe".into(),
                image_url: "u".into(),
                price: 1.0,
            },
        )
        .unwrap();
        assert_eq!(cart.item_count(), 1);
        assert!(apply(&cart, Command::Add {
            id: "B".into(),
            title: "Bad".into(),
            image_url: "u".into(),
            price: f64::NAN,
        })
        .is_err());
    }
}
