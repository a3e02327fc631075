use clap::Parser;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "douban-gateway")]
#[command(about = "Resilient metadata gateway for the Douban mobile API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Canonical upstream base URL
    #[arg(short, long, default_value = "https://m.douban.com")]
    pub upstream: String,

    // Fallback proxy base URLs (comma-separated)
    // Example: "https://proxy-a.example.com,https://proxy-b.example.com"
    #[arg(
        long,
        default_value = "https://m.douban.cmliussss.net,https://m.douban.cmliussss.com"
    )]
    pub proxies: String,

    // Cache-Control max-age for successful responses, in seconds
    #[arg(short, long, default_value_t = 300)]
    pub cache_ttl: u64,

    // Max retries for direct upstream attempts (total attempts = retries + 1)
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    // Default rate limit max requests per window
    #[arg(long, default_value_t = 100)]
    pub rate_limit: u32,

    // Default rate limit window in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_window: u64,

    // Include raw upstream error messages in error responses (debugging only)
    #[arg(long, default_value_t = false)]
    pub expose_errors: bool,
}

impl Args {
    // Parse the comma-separated proxy list, dropping empties and trailing slashes
    pub fn proxy_list(&self) -> Vec<String> {
        self.proxies
            .split(',')
            .map(|s| s.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }
}
