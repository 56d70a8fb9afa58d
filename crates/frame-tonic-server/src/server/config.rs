use anyhow::bail;
use clap::Parser;

/// Runtime configuration for the `frame-tonic-server` binary.
///
/// Each listener gets its own address. Values come from CLI arguments or
/// environment variables (a `.env` file is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "frame-tonic-server",
    version,
    about = "A gRPC frame service with an HTTP liveness endpoint"
)]
pub struct CliArgs {
    /// Address the gRPC listener binds to.
    ///
    /// A host-less address such as `:8080` binds every interface.
    ///
    /// Environment variable: `RPC_ADDR`
    #[arg(long, env = "RPC_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub rpc_addr: String,

    /// Address the HTTP health listener binds to. Must differ from
    /// `--rpc-addr` for both listeners to come up.
    ///
    /// Environment variable: `HEALTH_ADDR`
    #[arg(long, env = "HEALTH_ADDR", default_value_t = String::from("0.0.0.0:8081"))]
    pub health_addr: String,
}

/// Address configuration for a single listener. Immutable once the host
/// starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    pub addr: String,
}

impl ListenerConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub rpc: ListenerConfig,
    pub health: ListenerConfig,
}

impl TryFrom<CliArgs> for HostConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            rpc: ListenerConfig::new(normalize_addr("RPC_ADDR", &args.rpc_addr)?),
            health: ListenerConfig::new(normalize_addr("HEALTH_ADDR", &args.health_addr)?),
        })
    }
}

/// Expands `:PORT` to `0.0.0.0:PORT`. Anything else is left for the socket
/// layer to accept or reject at bind time.
fn normalize_addr(name: &str, raw: &str) -> anyhow::Result<String> {
    let addr = raw.trim();
    if addr.is_empty() {
        bail!("{name} must not be empty");
    }
    if addr.starts_with(':') {
        return Ok(format!("0.0.0.0{addr}"));
    }
    Ok(addr.to_string())
}
