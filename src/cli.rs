use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    FlagParam, KeyValueParam, NumberParam, ScanKind, ScanParams, StatusListParam, WordListParam,
};

#[derive(Parser)]
#[command(name = "reconkit")]
#[command(version, about = "Controllable crawler, fuzzer and directory brute-forcer")]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Breadth-first crawl of one host
    Crawl {
        #[arg(short, long)]
        url: String,

        #[arg(long)]
        depth: Option<u64>,

        #[arg(long)]
        max_pages: Option<u64>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Inject payloads into a URL, query string or form body
    Fuzz {
        #[arg(short, long)]
        url: String,

        /// Wordlist file, comma/newline separated words, or a single word
        #[arg(short, long)]
        wordlist: Option<String>,

        #[arg(short = 'X', long)]
        method: Option<String>,

        /// Extra form fields sent with POST/PUT, as `a=1&b=2`
        #[arg(short, long)]
        data: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Probe for hidden paths under a base URL
    Brute {
        #[arg(short, long)]
        url: String,

        #[arg(short, long)]
        wordlist: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Render a saved JSON report
    Report {
        #[arg(short, long)]
        input: String,

        #[arg(short, long, default_value = "html")]
        format: String,

        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Cookies as `name=value; name2=value2`
    #[arg(long)]
    pub cookies: Option<String>,

    /// Status codes to drop, comma separated
    #[arg(long)]
    pub hide_status: Option<String>,

    /// Only keep these status codes, comma separated
    #[arg(long)]
    pub show_status: Option<String>,

    /// Body length filter: `N`, `MIN,MAX`, `MIN,`, `,MAX`, `>N` or `<N`
    #[arg(long)]
    pub content_length: Option<String>,

    #[arg(long)]
    pub proxy: Option<String>,

    #[arg(short, long)]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub user_agent: Option<String>,

    /// Seconds to wait between requests
    #[arg(long)]
    pub delay: Option<u64>,

    /// Hold results until the scan ends instead of streaming them
    #[arg(long)]
    pub no_live: bool,

    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub submit_url: Option<String>,

    #[arg(long)]
    pub project: Option<String>,

    /// Print events as JSON lines instead of a progress bar
    #[arg(long)]
    pub json: bool,
}

impl CommonArgs {
    fn apply(&self, params: &mut ScanParams) {
        params.cookies = self.cookies.clone().map(KeyValueParam::Text);
        params.hide_status = self.hide_status.clone().map(StatusListParam::Text);
        params.show_status = self.show_status.clone().map(StatusListParam::Text);
        params.filter_by_content_length = self.content_length.clone().map(NumberParam::Text);
        params.proxy = self.proxy.clone();
        params.timeout = self.timeout.map(NumberParam::Number);
        params.user_agent = self.user_agent.clone();
        params.delay = self.delay.map(NumberParam::Number);
        params.show_results = Some(FlagParam::Bool(!self.no_live));
        params.output_dir = Some(self.output_dir.clone());
        params.submit_url = self.submit_url.clone();
        params.project = self.project.clone();
    }
}

impl Commands {
    /// The scan kind and raw parameters for the scanning subcommands.
    pub fn scan_params(&self) -> Option<(ScanKind, ScanParams, &CommonArgs)> {
        let mut params = ScanParams::default();
        match self {
            Commands::Crawl {
                url,
                depth,
                max_pages,
                common,
            } => {
                params.target_url = Some(url.clone());
                params.depth = depth.map(NumberParam::Number);
                params.max_pages = max_pages.map(NumberParam::Number);
                common.apply(&mut params);
                Some((ScanKind::Crawler, params, common))
            }
            Commands::Fuzz {
                url,
                wordlist,
                method,
                data,
                common,
            } => {
                params.target_url = Some(url.clone());
                params.word_list = wordlist.clone().map(WordListParam::Text);
                params.http_method = method.clone();
                params.additional_parameters = data.clone().map(KeyValueParam::Text);
                common.apply(&mut params);
                Some((ScanKind::Fuzzer, params, common))
            }
            Commands::Brute { url, wordlist, common } => {
                params.target_url = Some(url.clone());
                params.word_list = wordlist.clone().map(WordListParam::Text);
                common.apply(&mut params);
                Some((ScanKind::BruteForcer, params, common))
            }
            Commands::Report { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;

    #[test]
    fn test_brute_args_become_config() {
        let cli = Cli::parse_from([
            "reconkit",
            "brute",
            "--url",
            "example.test",
            "--wordlist",
            "admin,backup",
            "--hide-status",
            "404",
            "--content-length",
            ">10",
            "--no-live",
        ]);
        let (kind, params, _) = cli.command.scan_params().unwrap();
        let config = ScanConfig::from_params(kind, params).unwrap();

        assert_eq!(config.kind, ScanKind::BruteForcer);
        assert_eq!(config.target, "https://example.test");
        assert_eq!(config.payloads, vec!["admin", "backup"]);
        assert_eq!(config.filter.hide_status, vec![404]);
        assert!(!config.filter.admits_length(10));
        assert!(config.filter.admits_length(11));
        assert!(!config.live_updates);
    }

    #[test]
    fn test_fuzz_args_carry_method_and_data() {
        let cli = Cli::parse_from([
            "reconkit",
            "fuzz",
            "-u",
            "http://example.test/login",
            "-X",
            "post",
            "-d",
            "user=admin&submit=1",
        ]);
        let (_, params, _) = cli.command.scan_params().unwrap();
        let config = ScanConfig::from_params(ScanKind::Fuzzer, params).unwrap();
        assert_eq!(config.method, crate::models::HttpMethod::Post);
        assert_eq!(config.extra_params.get("user").map(String::as_str), Some("admin"));
    }

    #[test]
    fn test_report_has_no_scan_params() {
        let cli = Cli::parse_from(["reconkit", "report", "-i", "out.json"]);
        assert!(cli.command.scan_params().is_none());
    }
}
