use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Identify the web application firewall protecting a target and search for tamper bypasses", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit per-step debug and payload logs (global)
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Do not print the banner (global)
    #[arg(long, global = true, default_value_t = false)]
    pub hide_banner: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Detect the firewall in front of one or more targets
    Scan {
        /// Target URL, payloads are appended to it verbatim (e.g. http://example.com/index.php?id=1)
        #[arg(short = 'u', long = "url", required_unless_present = "list")]
        url: Option<String>,

        /// File with newline-delimited target URLs
        #[arg(short = 'l', long)]
        list: Option<String>,

        /// Comma-separated payloads to use instead of the defaults
        #[arg(long, conflicts_with = "payload_file")]
        payloads: Option<String>,

        /// File with one payload per line
        #[arg(long)]
        payload_file: Option<String>,

        /// Use this User-Agent
        #[arg(long)]
        agent: Option<String>,

        /// Pick a random browser User-Agent
        #[arg(long, default_value_t = false)]
        random_agent: bool,

        /// Proxy URL (http://, https:// or socks5://)
        #[arg(long)]
        proxy: Option<String>,

        /// Route traffic through a local Tor SOCKS proxy
        #[arg(long, default_value_t = false)]
        tor: bool,

        /// Use https:// when the target has no scheme
        #[arg(long, default_value_t = false)]
        force_ssl: bool,

        /// Skip the tamper bypass search
        #[arg(long = "skip-bypass", default_value_t = false)]
        skip_bypass: bool,

        /// Request timeout in seconds (default: 15)
        #[arg(long, default_value_t = 15_u64)]
        timeout: u64,

        /// Directory with extra JSON signature definitions
        #[arg(long, value_name = "DIR")]
        signatures: Option<String>,

        /// Directory where unknown firewall fingerprints are stored
        #[arg(long, value_name = "DIR")]
        fingerprint_dir: Option<String>,

        /// Save the scan results as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<String>,
    },

    /// Tamper a single payload
    Encode {
        payload: String,
        /// Tamper identifier (see `tampers`)
        tamper: String,
    },

    /// Tamper every payload in a file
    EncodeList {
        file: String,
        /// Tamper identifier (see `tampers`)
        tamper: String,
        /// Append the results to this file instead of printing them
        #[arg(long, value_name = "FILE")]
        save: Option<String>,
    },

    /// List the available tampers
    Tampers,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
