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
use serde::{Deserialize, Serialize};
use serde_env_field::EnvField;
use std::convert::Infallible;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to configuration file",
        default_value = "config.yaml"
    )]
    pub config_file: String,

    #[arg(
        short = 't',
        long = "telnet",
        help = "Enable telnet server",
        default_value = "true"
    )]
    pub telnet: bool,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            config_file: "config.yaml".to_string(),
            telnet: true,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub protocol: ProtocolConfig,

    pub telnet: Option<TelnetConfig>,
}

impl Configuration {
    pub fn load(path: &str) -> Result<Self, String> {
        tracing::debug!("Loading configuration from file: {}", path);
        let file =
            std::fs::File::open(path).map_err(|e| format!("Failed to open config file: {}", e))?;

        let conf = serde_yaml::from_reader(file)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        Ok(conf)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Name announced over MSDP and MSSP
    #[serde(default)]
    pub name: EnvField<ServerName>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerName(String);

impl ServerName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ServerName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl Default for ServerName {
    fn default() -> Self {
        Self(String::from("Mudgate"))
    }
}

impl std::fmt::Display for ServerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Recovery heuristics for clients with broken NAWS encoders
    #[serde(default = "default_compat_shims")]
    pub compat_shims: bool,

    /// Drop connections idle for this long, in seconds; zero disables
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
}

fn default_compat_shims() -> bool {
    true
}

fn default_idle_timeout() -> u64 {
    0
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            compat_shims: default_compat_shims(),
            idle_timeout: default_idle_timeout(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TelnetConfig {
    pub addr: EnvField<TelnetBinding>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TelnetBinding(SocketAddr);

impl TelnetBinding {
    pub fn to_addr(&self) -> SocketAddr {
        self.0
    }
    pub fn to_ip(&self) -> IpAddr {
        self.0.ip()
    }
    pub fn to_port(&self) -> u16 {
        self.0.port()
    }
}

impl FromStr for TelnetBinding {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(SocketAddr::from_str(s)?))
    }
}

impl Default for TelnetBinding {
    fn default() -> Self {
        Self(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::new(0, 0, 0, 0),
            4000,
        )))
    }
}

impl std::fmt::Display for TelnetBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_telnet_config_default() {
        let config = TelnetConfig::default();
        assert_eq!(
            config.addr.to_addr(),
            SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(0, 0, 0, 0), 4000))
        );
        assert_eq!(config.addr.to_ip(), Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.addr.to_port(), 4000);
    }

    #[test]
    fn test_protocol_config_default() {
        let config = ProtocolConfig::default();
        assert!(config.compat_shims);
        assert_eq!(config.idle_timeout, 0);
    }

    #[test]
    fn test_configuration_new_from_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            r#"
identity:
  name: Testmud
protocol:
  compat_shims: false
  idle_timeout: 600
telnet:
  addr: 127.0.0.1:4001
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        unsafe {
            std::env::remove_var("MUDGATE_TELNET_ADDR");
            std::env::remove_var("MUDGATE_SERVER_NAME");
        }

        let config = Configuration::load(path).unwrap();

        assert_eq!(config.identity.name.as_str(), "Testmud");
        assert!(!config.protocol.compat_shims);
        assert_eq!(config.protocol.idle_timeout, 600);
        assert_eq!(config.telnet.unwrap().addr.to_port(), 4001);
    }

    #[test]
    fn test_configuration_defaults_without_sections() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "telnet:\n  addr: 0.0.0.0:4000").unwrap();

        let path = file.path().to_str().unwrap();
        let config = Configuration::load(path).unwrap();

        assert_eq!(config.identity.name.as_str(), "Mudgate");
        assert!(config.protocol.compat_shims);
    }

    #[test]
    fn test_configuration_env_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            r#"
identity:
  name: "${{MUDGATE_SERVER_NAME:-Fallback}}"
telnet:
  addr: "${{MUDGATE_TELNET_ADDR:-127.0.0.1:4000}}"
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap();

        unsafe {
            std::env::set_var("MUDGATE_SERVER_NAME", "Envmud");
            std::env::set_var("MUDGATE_TELNET_ADDR", "127.0.0.1:9000");
        }

        let config = Configuration::load(path).unwrap();

        unsafe {
            std::env::remove_var("MUDGATE_SERVER_NAME");
            std::env::remove_var("MUDGATE_TELNET_ADDR");
        }

        assert_eq!(config.identity.name.as_str(), "Envmud");
        assert_eq!(config.telnet.unwrap().addr.to_port(), 9000);
    }
}
