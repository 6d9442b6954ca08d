use serde::Deserialize;

pub const DEFAULT_USER_AGENT: &str = concat!("wafscope/", env!("CARGO_PKG_VERSION"), " (Language=Rust)");
pub const TOR_PROXY: &str = "socks5://127.0.0.1:9050";

/// Request configuration built once per run and passed by reference into every component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub agent: String,
    pub proxy: Option<String>,
    /// Emit per-step debug and payload logs
    pub verbose: bool,
    /// Suppress the tamper bypass search entirely
    pub skip_bypass_check: bool,
    pub timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            verbose: false,
            skip_bypass_check: false,
            timeout_secs: 15,
        }
    }
}

// Desktop browser agents for --random-agent
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

pub fn random_user_agent() -> &'static str {
    use rand::seq::SliceRandom;
    USER_AGENTS.choose(&mut rand::thread_rng()).copied().unwrap_or(DEFAULT_USER_AGENT)
}

impl ScanConfig {
    /// Resolve agent and proxy the same way the CLI flags combine them:
    /// a personal agent wins over a random one, and Tor wins over a custom proxy.
    pub fn from_flags(
        personal_agent: Option<String>,
        random_agent: bool,
        proxy: Option<String>,
        tor: bool,
        verbose: bool,
        skip_bypass_check: bool,
    ) -> Self {
        let agent = match personal_agent {
            Some(agent) => agent,
            None if random_agent => random_user_agent().to_string(),
            None => DEFAULT_USER_AGENT.to_string(),
        };
        let proxy = if tor { Some(TOR_PROXY.to_string()) } else { proxy };
        Self { agent, proxy, verbose, skip_bypass_check, ..Self::default() }
    }

    pub fn uses_socks_proxy(&self) -> bool {
        self.proxy.as_deref().map(|p| p.starts_with("socks")).unwrap_or(false)
    }
}
