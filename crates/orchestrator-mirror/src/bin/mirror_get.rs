//! `mirror-get`: look up one node of a snapshot.
//!
//! Usage:
//!   mirror-get '<access-path>' < snapshot.json
//!
//! Example:
//!   mirror-get 'service_hosts[0].service_proxy_list[2].state' < state.json

use std::io::{self, Read};

use orchestrator_mirror::cli::lookup;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let path = match args.get(1) {
        Some(p) => p.clone(),
        None => {
            eprintln!("First argument must be an access path.");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match lookup(buf.trim(), &path) {
        Ok(node) => println!("{node}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
