//! Simulation worker executable. One process simulates one subnet; the
//! launcher prepares and starts it over the wire.

use anyhow::{ensure, Context, Result};
use clap::{App, Arg, ArgMatches};
use engine::{Clock, Parameters, Worker};
use log::info;
use std::fs::File;
use std::net::SocketAddr;
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let matches = App::new("dsim-node")
        .about("A distributed Petri-net simulation worker")
        .arg(
            Arg::with_name("listen")
                .long("listen")
                .value_name("ADDR")
                .help("The address to listen on for peer and launcher traffic")
                .default_value("127.0.0.1:0"),
        )
        .arg(
            Arg::with_name("id")
                .long("id")
                .value_name("NAME")
                .help("The worker id peers route by (defaults to the listen address)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("resultpath")
                .long("resultpath")
                .value_name("PATH")
                .help("Where to write the fired-transition listing")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("logfile")
                .long("logfile")
                .value_name("PATH")
                .help("Redirect log output to this file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("lookahead")
                .long("lookahead")
                .value_name("FLOAT")
                .help("The lookahead promised to downstream neighbors")
                .default_value("1"),
        )
        .get_matches();

    if let Err(e) = run(&matches).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(matches: &ArgMatches<'_>) -> Result<()> {
    let listen = matches.value_of("listen").unwrap();
    let address: SocketAddr = listen
        .parse()
        .with_context(|| format!("invalid listen address '{}'", listen))?;
    let pid = matches.value_of("id").unwrap_or(listen).to_string();
    let result_path = PathBuf::from(matches.value_of("resultpath").unwrap());
    let lookahead: f64 = matches
        .value_of("lookahead")
        .unwrap()
        .parse()
        .context("lookahead must be a number")?;
    ensure!(lookahead > 0.0, "lookahead must be positive");

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = matches.value_of("logfile") {
        let file =
            File::create(path).with_context(|| format!("failed to open log file '{}'", path))?;
        logger.target(env_logger::Target::Pipe(Box::new(file)));
    }
    logger.init();

    let parameters = Parameters {
        lookahead: Clock(lookahead),
        result_path,
    };
    let mut worker = Worker::spawn(pid, address, parameters);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
            std::process::exit(1);
        }
        _ = worker.done.recv() => info!("Simulation node done"),
    }
    Ok(())
}
