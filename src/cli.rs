use clap::Parser;
use std::path::PathBuf;

/// Sumika - streaming multi-agent chat backend for real-estate exploration
#[derive(Parser, Debug, Clone)]
#[command(name = "sumika", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "SUMIKA_CONFIG", default_value = "sumika.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "SUMIKA_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "SUMIKA_PORT")]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_sumika_toml() {
        let cli = Cli::parse_from(["sumika"]);
        assert_eq!(cli.config, PathBuf::from("sumika.toml"));
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cli = Cli::parse_from(["sumika", "--host", "0.0.0.0", "--port", "8080"]);
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.port, Some(8080));
    }
}
