//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use clap::Parser;
use mudgate::TelnetServer;
use mudgate::config::{Arguments, Configuration};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load arguments from the command line
    let arguments: Arguments = Parser::parse();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(true)
        .init();

    // Load configuration from a file with environment variable substitution
    let config: Configuration = Configuration::load(&arguments.config_file)
        .inspect_err(|err| eprintln!("Configuration load error: {}", err))
        .expect("Unable to load configuration file");

    debug!("Configuration loaded: {:?}", config);
    info!("Starting Mudgate Server...");

    if !arguments.telnet {
        info!("Telnet server disabled, nothing to do");
        return;
    }

    let telnet_server = TelnetServer::new(&config);

    // Get telnet config or use defaults
    let telnet_config = config.telnet.unwrap_or_default();

    let telnet_listener = tokio::net::TcpListener::bind(telnet_config.addr.to_addr())
        .await
        .expect("Unable to bind to telnet port");

    info!(
        "Telnet Server listening on {} ({}:{})",
        telnet_config.addr,
        telnet_config.addr.to_ip(),
        telnet_config.addr.to_port(),
    );

    tokio::select! {
        result = telnet_server.run(telnet_listener) => {
            if let Err(e) = result {
                tracing::error!("Telnet server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping");
        }
    }
}
