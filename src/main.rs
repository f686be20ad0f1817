//! netpong relay entry point
//!
//! Thin bootstrap only: logging, bind address, then the accept loop. All
//! pairing and forwarding logic lives in the library.

use log::error;

#[tokio::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let addr = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("NETPONG_ADDR").ok())
        .unwrap_or_else(|| "0.0.0.0:7777".to_string());

    if let Err(err) = netpong::relay::run(&addr).await {
        error!("relay terminated: {err}");
        std::process::exit(1);
    }
}
