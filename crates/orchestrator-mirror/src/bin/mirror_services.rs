//! `mirror-services`: list the services of a snapshot.
//!
//! Usage:
//!   mirror-services [--host <hostname>]... [--tag <tag>]... < snapshot.json
//!
//! A service is listed when it runs on one of the given hosts and carries at
//! least one of the given tags. Omitting `--host` or `--tag` selects all.

use std::io::{self, Read, Write};

use orchestrator_mirror::cli::list_services;
use orchestrator_mirror::ServiceFilter;

fn parse_filter(args: &[String]) -> Result<ServiceFilter, String> {
    let mut filter = ServiceFilter::new();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| format!("{flag} needs a value"))?;
        filter = match flag.as_str() {
            "--host" => filter.with_hostname(value.clone()),
            "--tag" => filter.with_tag(value.clone()),
            other => return Err(format!("unknown option '{other}'")),
        };
    }
    Ok(filter)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let filter = match parse_filter(&args) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match list_services(buf.trim(), &filter) {
        Ok(table) => {
            if io::stdout().write_all(table.as_bytes()).is_err() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
