use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use trawl_core::SearchSettings;

#[derive(Parser)]
#[command(name = "trawl")]
#[command(about = "Trawl - collect links to profiles by username through search engines")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  trawl search johndoe                    Search every source for a username
  trawl search johndoe -t 150             Stricter junk threshold
  trawl search johndoe -s google,bing     Query selected sources only
  trawl search johndoe --csv out.csv      Also export results to CSV

\x1b[1;36mSources & Settings:\x1b[0m
  trawl sources                           List available search sources
  trawl config show                       View current settings
  trawl config init                       Write a settings file with defaults

\x1b[1;36mEnvironment:\x1b[0m
  SERPAPI_API_KEY                         Key for the naver and baidu sources
  RUST_LOG                                Log filter (e.g. trawl_core=debug)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output (junk score and source per link, debug logging)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Settings file [default: ~/.config/trawl/settings.yaml]
    #[arg(long, global = true, env = "TRAWL_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect links to profiles for a username
    ///
    /// Queries every selected source concurrently, merges and deduplicates the
    /// links, and ranks them by how much they look like a profile page.
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  trawl search johndoe
  trawl search johndoe -v                 Show junk score and source per link
  trawl search johndoe -l                 Print unique URLs only
  trawl search johndoe -d                 Cache raw links in debug_johndoe.json
  trawl search \"John Doe\" --no-url-filter
  trawl search johndoe --proxy socks5://127.0.0.1:9050")]
    Search(SearchArgs),

    /// List available search sources
    #[command(alias = "ls")]
    Sources,

    /// Inspect or create the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct SearchArgs {
    /// Username to search for
    pub username: String,

    /// Junk score threshold for reliable links
    #[arg(short, long)]
    pub threshold: Option<usize>,

    /// Number of results requested from each source
    #[arg(long)]
    pub results_count: Option<u32>,

    /// Keep links whose URL does not contain the username
    #[arg(long)]
    pub no_url_filter: bool,

    /// Comma-separated list of sources to query (default: all)
    #[arg(short, long, value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Interface language passed to sources
    #[arg(long)]
    pub lang: Option<String>,

    /// Proxy URL (http://, https:// or socks5://)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Reuse or write debug_<username>.json and print every raw link
    #[arg(short, long)]
    pub debug: bool,

    /// Print unique URLs only
    #[arg(short, long)]
    pub list: bool,

    /// Save results to a CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

impl SearchArgs {
    /// Overlay command-line flags on stored settings.
    pub fn apply(&self, settings: &mut SearchSettings) {
        if let Some(threshold) = self.threshold {
            settings.threshold = threshold;
        }
        if let Some(count) = self.results_count {
            settings.results_count = count;
        }
        if self.no_url_filter {
            settings.url_filter = false;
        }
        if !self.sources.is_empty() {
            settings.sources = self.sources.clone();
        }
        if let Some(lang) = &self.lang {
            settings.language = lang.clone();
        }
        if let Some(proxy) = &self.proxy {
            settings.proxy = Some(proxy.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.timeout_ms = timeout_ms;
        }
    }
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Show current settings
    Show,
    /// Print the settings file path
    Path,
    /// Write a settings file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Plain text output
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_flags() {
        let cli = Cli::try_parse_from([
            "trawl", "search", "johndoe", "-t", "150", "-s", "google,bing", "--no-url-filter",
            "-d", "--output", "json",
        ])
        .unwrap();

        assert_eq!(cli.output, OutputFormat::Json);
        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.username, "johndoe");
        assert_eq!(args.threshold, Some(150));
        assert_eq!(args.sources, vec!["google", "bing"]);
        assert!(args.no_url_filter);
        assert!(args.debug);
        assert!(!args.list);
    }

    #[test]
    fn test_apply_overrides_only_given_flags() {
        let args = SearchArgs {
            username: "johndoe".into(),
            threshold: Some(120),
            no_url_filter: true,
            proxy: Some("socks5://127.0.0.1:9050".into()),
            ..Default::default()
        };
        let mut settings = SearchSettings {
            language: "ru".into(),
            ..Default::default()
        };
        args.apply(&mut settings);

        assert_eq!(settings.threshold, 120);
        assert!(!settings.url_filter);
        assert_eq!(settings.proxy.as_deref(), Some("socks5://127.0.0.1:9050"));
        assert_eq!(settings.language, "ru");
        assert_eq!(settings.results_count, 100);
        assert!(settings.sources.is_empty());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["trawl", "search", "johndoe", "--timeout-ms", "0"]).is_err());

        let cli =
            Cli::try_parse_from(["trawl", "search", "johndoe", "--timeout-ms", "2500"]).unwrap();
        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.timeout_ms, Some(2500));
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::try_parse_from(["trawl", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }
}
