//! SKIPTTL - Interactive Shell
//! A small REPL over a `SkipList<i64, String>` for poking at the structure.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use skipttl::config::Config;
use skipttl::engine::{Expiry, SkipList};

fn parse_key(raw: &str) -> Option<i64> {
    match raw.parse() {
        Ok(key) => Some(key),
        Err(_) => {
            println!("  ERROR: key must be an integer, got '{}'", raw);
            None
        }
    }
}

fn main() {
    env_logger::init();

    println!();
    println!("  ╔═══════════════════════════════════════════╗");
    println!("  ║                 SKIPTTL                   ║");
    println!("  ║     Skip List Key-Value Store v1.0.0      ║");
    println!("  ╚═══════════════════════════════════════════╝");
    println!();
    println!("  Commands:");
    println!("    set <key> <value>            - Store a key-value pair");
    println!("    setex <key> <ttl_ms> <value> - Store with a TTL in milliseconds");
    println!("    get <key>                    - Retrieve a value by key");
    println!("    del <key>                    - Delete a key");
    println!("    ttl <key>                    - Show remaining TTL");
    println!("    persist <key>                - Remove a key's TTL");
    println!("    sweep                        - Remove expired entries (snapshot pass)");
    println!("    cleanup                      - Remove expired entries (streaming pass)");
    println!("    dump                         - Show every level");
    println!("    info                         - Show statistics");
    println!("    exit                         - Quit");
    println!();

    let config = Config::default();
    let mut list: SkipList<i64, String> = match SkipList::with_config(&config) {
        Ok(list) => list,
        Err(err) => {
            eprintln!("[ERROR] Failed to create skip list: {}", err);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("skipttl> ");
        if let Err(err) = stdout.flush() {
            eprintln!("[ERROR] Failed to flush output: {}", err);
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(err) => {
                eprintln!("[ERROR] Failed to read input: {}", err);
                break;
            }
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_lowercase().as_str() {
            "set" | "put" => {
                if parts.len() < 3 {
                    println!("  Usage: set <key> <value>");
                    continue;
                }
                let Some(key) = parse_key(parts[1]) else { continue };
                match list.insert(key, parts[2..].join(" ")) {
                    Ok(()) => println!("  OK"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "setex" => {
                if parts.len() < 4 {
                    println!("  Usage: setex <key> <ttl_ms> <value>");
                    continue;
                }
                let Some(key) = parse_key(parts[1]) else { continue };
                let ttl_ms: u64 = match parts[2].parse() {
                    Ok(ms) => ms,
                    Err(_) => {
                        println!("  ERROR: ttl must be a number of milliseconds");
                        continue;
                    }
                };
                let expiry = Expiry::after(Duration::from_millis(ttl_ms));
                match list.insert_with_expiry(key, parts[3..].join(" "), expiry) {
                    Ok(()) => println!("  OK (expires in {} ms)", ttl_ms),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "get" => {
                if parts.len() < 2 {
                    println!("  Usage: get <key>");
                    continue;
                }
                let Some(key) = parse_key(parts[1]) else { continue };
                match list.search(&key) {
                    Some(value) => println!("  \"{}\"", value),
                    None => println!("  (nil)"),
                }
            }
            "del" | "delete" => {
                if parts.len() < 2 {
                    println!("  Usage: del <key>");
                    continue;
                }
                let Some(key) = parse_key(parts[1]) else { continue };
                if list.erase(&key) {
                    println!("  OK (deleted)");
                } else {
                    println!("  (not found)");
                }
            }
            "ttl" => {
                if parts.len() < 2 {
                    println!("  Usage: ttl <key>");
                    continue;
                }
                let Some(key) = parse_key(parts[1]) else { continue };
                match (list.search(&key), list.remaining_ttl(&key)) {
                    (None, _) => println!("  (nil)"),
                    (Some(_), None) => println!("  no ttl"),
                    (Some(_), Some(left)) => println!("  {} ms", left.as_millis()),
                }
            }
            "persist" => {
                if parts.len() < 2 {
                    println!("  Usage: persist <key>");
                    continue;
                }
                let Some(key) = parse_key(parts[1]) else { continue };
                if list.persist(&key) {
                    println!("  OK");
                } else {
                    println!("  (nil)");
                }
            }
            "sweep" => {
                let removed = list.remove_expired_nodes();
                println!("  {} expired entries removed", removed);
            }
            "cleanup" => {
                let removed = list.cleanup_expired_nodes();
                println!("  {} expired entries removed", removed);
            }
            "dump" | "scan" | "list" => {
                let dump = list.dump();
                print!("{}", dump);
                println!("  ({} levels)", dump.depth());
            }
            "info" | "stats" => {
                println!("  Entries:       {}", list.len());
                println!("  Levels:        {} / {}", list.current_level(), list.max_level());
                println!("{}", list.metrics().report());
            }
            "exit" | "quit" | "q" => {
                println!("  Bye.");
                break;
            }
            _ => {
                println!("  Unknown command: '{}'. Type 'exit' to quit.", parts[0]);
            }
        }
    }
}
