//! CLI options, cloud profiles, and the immutable run configuration.
//!
//! The CLI surface mirrors the tool's three modes: `create` floods the
//! control plane with networks/subnets/ports, `clean` tears down everything
//! this host created earlier, `discover-hosts` writes an inventory of agent
//! hosts. Cloud connection details (endpoint, token) live in a `clouds.toml`
//! profile file keyed by `--cloud-name`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use thiserror::Error;

use netheat_common::naming::{MAX_V4_SUBNETS_PER_NETWORK, MAX_V6_SUBNETS_PER_NETWORK};

/// Process exit code for configuration errors.
pub const EXIT_INVALID_CONFIG: i32 = 1;
/// Process exit code when host discovery finds no matching agents.
pub const EXIT_NO_AGENTS_FOUND: i32 = 2;

/// What the invocation should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Create networks, subnets, and bound ports.
    Create,
    /// Delete every resource this host created earlier.
    Clean,
    /// Write an inventory of hosts running the configured agent.
    DiscoverHosts,
}

/// Control-plane load generator.
#[derive(Parser, Debug)]
#[command(name = "netheat", about = "Synthetic load generator for a networking control plane")]
pub struct Cli {
    /// Action to perform.
    #[arg(value_enum)]
    pub action: Action,

    /// Number of networks to create.
    #[arg(long, default_value_t = 10)]
    pub networks: u32,

    /// IPv4 subnets per network (create only).
    #[arg(long, default_value_t = 1)]
    pub ipv4_subnets: u32,

    /// IPv6 subnets per network (create only).
    #[arg(long, default_value_t = 1)]
    pub ipv6_subnets: u32,

    /// Ports per network, bound to this host (create only).
    #[arg(long, default_value_t = 10)]
    pub ports: u32,

    /// Worker pool size. 0 means one worker per network — a full parallel
    /// fan-out against the control plane.
    #[arg(long, default_value_t = 0)]
    pub concurrency: usize,

    /// Cloud profile to use, as defined in the clouds file.
    #[arg(long, default_value = "devstack-admin")]
    pub cloud_name: String,

    /// Cloud region name.
    #[arg(long, default_value = "RegionOne")]
    pub region_name: String,

    /// Skip TLS certificate verification.
    #[arg(long, default_value_t = false)]
    pub insecure: bool,

    /// Path to the cloud profile file.
    #[arg(long, default_value = "clouds.toml")]
    pub clouds_file: PathBuf,

    /// Agent binary to look for with discover-hosts.
    #[arg(long, default_value = "ovn-controller")]
    pub l2_agent_name: String,

    /// Inventory output file. A `.yaml`/`.yml` suffix selects the YAML
    /// format, anything else gets one host per line.
    #[arg(long, default_value = "hosts")]
    pub inventory_file_name: PathBuf,

    /// Hostname override. Defaults to the local hostname, which scopes
    /// every generated resource name to this host.
    #[arg(long)]
    pub hostname: Option<String>,
}

/// One entry in the clouds file.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudProfile {
    /// Base URL of the networking API, e.g. `http://10.0.0.5:9696`.
    pub endpoint: String,
    /// Auth token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
    /// Project whose quotas are lifted before a create run.
    #[serde(default = "default_project")]
    pub project: String,
}

fn default_project() -> String {
    "admin".to_string()
}

#[derive(Debug, Deserialize)]
struct CloudsFile {
    clouds: HashMap<String, CloudProfile>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read clouds file {path}: {source}")]
    CloudsFileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse clouds file {path}: {source}")]
    CloudsFileParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("cloud {0} is not defined in the clouds file")]
    UnknownCloud(String),
    #[error("{requested} IPv4 subnets per network requested, the /24 scheme supports at most {MAX_V4_SUBNETS_PER_NETWORK}")]
    TooManyV4Subnets { requested: u32 },
    #[error("{requested} IPv6 subnets per network requested, the /64 scheme supports at most {MAX_V6_SUBNETS_PER_NETWORK}")]
    TooManyV6Subnets { requested: u32 },
}

/// Immutable run configuration, resolved once per invocation and passed by
/// reference everywhere — there is no global configuration state.
#[derive(Debug, Clone)]
pub struct Config {
    pub action: Action,
    pub networks: u32,
    pub ipv4_subnets: u32,
    pub ipv6_subnets: u32,
    pub ports: u32,
    pub concurrency: usize,
    pub hostname: String,
    pub cloud_name: String,
    pub region_name: String,
    pub insecure: bool,
    pub cloud: CloudProfile,
    pub l2_agent_name: String,
    pub inventory_file_name: PathBuf,
}

impl Config {
    /// Resolve the CLI into a validated configuration.
    ///
    /// Fails fast — before any orchestration — on subnet counts the CIDR
    /// scheme cannot represent, and on missing/unknown cloud profiles.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if cli.ipv4_subnets > MAX_V4_SUBNETS_PER_NETWORK {
            return Err(ConfigError::TooManyV4Subnets {
                requested: cli.ipv4_subnets,
            });
        }
        if cli.ipv6_subnets > MAX_V6_SUBNETS_PER_NETWORK {
            return Err(ConfigError::TooManyV6Subnets {
                requested: cli.ipv6_subnets,
            });
        }

        let cloud = load_cloud_profile(&cli.clouds_file, &cli.cloud_name)?;
        let hostname = cli
            .hostname
            .or_else(local_hostname)
            .unwrap_or_else(|| "netheat".into());

        Ok(Config {
            action: cli.action,
            networks: cli.networks,
            ipv4_subnets: cli.ipv4_subnets,
            ipv6_subnets: cli.ipv6_subnets,
            ports: cli.ports,
            concurrency: cli.concurrency,
            hostname,
            cloud_name: cli.cloud_name,
            region_name: cli.region_name,
            insecure: cli.insecure,
            cloud,
            l2_agent_name: cli.l2_agent_name,
            inventory_file_name: cli.inventory_file_name,
        })
    }
}

fn load_cloud_profile(path: &Path, cloud_name: &str) -> Result<CloudProfile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::CloudsFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut file: CloudsFile =
        toml::from_str(&raw).map_err(|source| ConfigError::CloudsFileParse {
            path: path.to_path_buf(),
            source,
        })?;
    file.clouds
        .remove(cloud_name)
        .ok_or_else(|| ConfigError::UnknownCloud(cloud_name.to_string()))
}

fn local_hostname() -> Option<String> {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli(action: Action) -> Cli {
        Cli {
            action,
            networks: 2,
            ipv4_subnets: 1,
            ipv6_subnets: 1,
            ports: 1,
            concurrency: 0,
            cloud_name: "test".into(),
            region_name: "RegionOne".into(),
            insecure: false,
            clouds_file: PathBuf::from("/nonexistent/clouds.toml"),
            l2_agent_name: "ovn-controller".into(),
            inventory_file_name: PathBuf::from("hosts"),
            hostname: Some("compute-1".into()),
        }
    }

    #[test]
    fn rejects_v4_subnet_count_beyond_cidr_space() {
        let mut cli = base_cli(Action::Create);
        cli.ipv4_subnets = 257;
        assert!(matches!(
            Config::from_cli(cli),
            Err(ConfigError::TooManyV4Subnets { requested: 257 })
        ));
    }

    #[test]
    fn rejects_v6_subnet_count_beyond_cidr_space() {
        let mut cli = base_cli(Action::Create);
        cli.ipv6_subnets = 65537;
        assert!(matches!(
            Config::from_cli(cli),
            Err(ConfigError::TooManyV6Subnets { requested: 65537 })
        ));
    }

    #[test]
    fn missing_clouds_file_is_a_config_error() {
        let cli = base_cli(Action::Create);
        assert!(matches!(
            Config::from_cli(cli),
            Err(ConfigError::CloudsFileRead { .. })
        ));
    }

    #[test]
    fn loads_profile_from_clouds_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clouds.toml");
        std::fs::write(
            &path,
            r#"
[clouds.test]
endpoint = "http://127.0.0.1:9696"
token = "secret"
"#,
        )
        .unwrap();

        let mut cli = base_cli(Action::Clean);
        cli.clouds_file = path;
        let cfg = Config::from_cli(cli).unwrap();
        assert_eq!(cfg.cloud.endpoint, "http://127.0.0.1:9696");
        assert_eq!(cfg.cloud.token.as_deref(), Some("secret"));
        assert_eq!(cfg.cloud.project, "admin");
        assert_eq!(cfg.hostname, "compute-1");
    }

    #[test]
    fn unknown_cloud_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clouds.toml");
        std::fs::write(&path, "[clouds.other]\nendpoint = \"http://x\"\n").unwrap();

        let mut cli = base_cli(Action::Clean);
        cli.clouds_file = path;
        assert!(matches!(
            Config::from_cli(cli),
            Err(ConfigError::UnknownCloud(_))
        ));
    }
}
