use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::models::{AuditParams, LoopbackParams, DEFAULT_LOOPBACK_UNIT};
use crate::utils::{is_valid_ipv4, Ipv4Subnet};

#[derive(Parser, Debug)]
#[command(name = "fw-provision", version, about = "Bulk firewall provisioning over the PAN-OS API")]
pub struct Cli {
    #[arg(long, short = 'd', global = true, default_value = "-", help = "Device list file, one address per line (- for stdin)")]
    pub devices: String,
    #[arg(long, global = true, help = "Maximum concurrent device sessions (FW_CONCURRENCY)")]
    pub concurrency: Option<usize>,
    #[arg(long, global = true, help = "API request timeout in seconds (FW_API_TIMEOUT_SECS)")]
    pub timeout: Option<u64>,
    #[arg(long, global = true, help = "Skip TLS certificate verification (FW_TLS_INSECURE)")]
    pub insecure: bool,
    #[arg(long, short = 'o', global = true, help = "Report file path (FW_OUTPUT_PATH)")]
    pub output: Option<String>,
    #[arg(long, global = true, help = "Report field delimiter (FW_OUTPUT_DELIMITER)")]
    pub delimiter: Option<char>,
    #[arg(long, short = 'u', global = true, help = "API username (FW_USERNAME); the password is read from FW_PASSWORD")]
    pub username: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the management loopback and attach it to zone, router and BGP
    ProvisionLoopback {
        #[arg(long, value_parser = parse_subnet)]
        subnet: Ipv4Subnet,
        #[arg(long, default_value_t = DEFAULT_LOOPBACK_UNIT)]
        unit: u16,
        #[arg(long = "profile", default_value = "allow-mgmt")]
        management_profile: String,
        #[arg(long = "permitted-ip", value_parser = parse_permitted_ip)]
        permitted_ips: Vec<String>,
        #[arg(long, default_value = "trust")]
        zone: String,
        #[arg(long, default_value = "vsys1")]
        vsys: String,
        #[arg(long, default_value = "default")]
        virtual_router: String,
        #[arg(long, default_value_t = false)]
        bgp_redistribution: bool,
        #[arg(long, default_value_t = false)]
        commit: bool,
    },
    /// Read hostname, serial, version and loopback address
    Audit {
        #[arg(long, default_value_t = DEFAULT_LOOPBACK_UNIT)]
        unit: u16,
    },
}

/// What a parsed command asks the run to do
pub enum Goal {
    ProvisionLoopback { params: LoopbackParams, commit: bool },
    Audit(AuditParams),
}

impl Cli {
    /// Command-line flags win over the environment
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(concurrency) = self.concurrency {
            cfg.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            cfg.api_timeout_secs = timeout;
        }
        if self.insecure {
            cfg.tls_insecure = true;
        }
        if let Some(output) = &self.output {
            cfg.output_path = output.clone();
        }
        if let Some(delimiter) = self.delimiter {
            cfg.output_delimiter = delimiter;
        }
        if let Some(username) = &self.username {
            cfg.username = username.clone();
        }
    }

    pub fn goal(&self) -> Goal {
        match &self.command {
            Commands::ProvisionLoopback {
                subnet,
                unit,
                management_profile,
                permitted_ips,
                zone,
                vsys,
                virtual_router,
                bgp_redistribution,
                commit,
            } => Goal::ProvisionLoopback {
                params: LoopbackParams {
                    unit: *unit,
                    subnet: *subnet,
                    management_profile: management_profile.clone(),
                    permitted_ips: permitted_ips.clone(),
                    zone: zone.clone(),
                    vsys: vsys.clone(),
                    virtual_router: virtual_router.clone(),
                    bgp_redistribution: *bgp_redistribution,
                },
                commit: *commit,
            },
            Commands::Audit { unit } => Goal::Audit(AuditParams { unit: *unit }),
        }
    }
}

fn parse_subnet(value: &str) -> Result<Ipv4Subnet, String> {
    value.parse().map_err(|e: anyhow::Error| e.to_string())
}

/// A permitted management source: an IPv4 address or IPv4 prefix
fn parse_permitted_ip(value: &str) -> Result<String, String> {
    let value = value.trim();
    if is_valid_ipv4(value) || (value.contains('/') && value.parse::<Ipv4Subnet>().is_ok()) {
        Ok(value.to_string())
    } else {
        Err(format!("not an IPv4 address or prefix: {}", value))
    }
}
