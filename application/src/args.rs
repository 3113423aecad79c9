//! [`Args`] definitions.

use clap::Parser;

/// Web server signing users up and in.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file.
    ///
    /// Missing file is fine, defaults and `CONF.` environment variables are
    /// used then.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn config_path_defaults() {
        let args = Args::try_parse_from(["application"]).unwrap();

        assert_eq!(args.config, "config.toml");
    }

    #[test]
    fn config_path_is_overridable() {
        let args =
            Args::try_parse_from(["application", "-c", "prod.toml"]).unwrap();

        assert_eq!(args.config, "prod.toml");
    }
}
