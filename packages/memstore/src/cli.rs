use std::path::PathBuf;

use clap::Parser;

/// In-memory comment, admin and image store served over JSON-RPC.
///
/// Flags left unset fall through to the config file, then to the built-in
/// defaults.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "memstore", version, about)]
pub struct Cli {
    /// URL path the RPC endpoint is mounted on [default: /]
    #[arg(long, env = "API_ROOT")]
    pub api_root: Option<String>,

    /// Listen port [default: 8080]
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Listen address [default: 0.0.0.0]
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Basic auth user; when unset, requests are not authenticated
    #[arg(long, env = "AUTH_USER")]
    pub auth_user: Option<String>,

    /// Basic auth password
    #[arg(long, env = "AUTH_PASSWD", hide_env_values = true)]
    pub auth_passwd: Option<String>,

    /// Process-wide signing secret
    #[arg(long, env = "SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Enable debug logging
    #[arg(long, env = "DEBUG", value_parser = clap::builder::FalseyValueParser::new())]
    pub debug: bool,

    /// Seconds a comment stays editable after creation [default: 300]
    #[arg(long, env = "EDIT_WINDOW")]
    pub edit_window: Option<u64>,

    /// Largest accepted image, in bytes [default: 5242880]
    #[arg(long, env = "MAX_IMAGE_SIZE")]
    pub max_image_size: Option<u64>,

    /// Seconds a staged image survives before the reaper drops it; 0 disables the reaper [default: 0]
    #[arg(long, env = "IMAGE_TTL")]
    pub image_ttl: Option<u64>,

    /// Seconds between reaper runs [default: 60]
    #[arg(long, env = "CLEANUP_INTERVAL")]
    pub cleanup_interval: Option<u64>,

    /// Config file, without extension
    #[arg(long, env = "CONFIG", default_value = "config/memstore")]
    pub config: PathBuf,
}
