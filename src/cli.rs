use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Daily job: fetch, unzip, process and notify for one date.
    Run(RunArgs),
    /// Download and extract the matching filings for one date.
    Fetch(FetchArgs),
    /// Extract zip archives already present in a directory.
    Unzip(UnzipArgs),
    /// Process unpacked filings and notify the new ones.
    Process(ProcessArgs),
    /// Send one message to the configured recipient.
    Notify(NotifyArgs),
    /// Inspect or migrate the processed-report store.
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
    /// Serve health checks, manual pushes and the messaging webhook.
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Root directory for downloaded and unpacked filings.
    #[arg(
        long,
        global = true,
        env = "DOWNLOAD_DIR",
        default_value = "edinet_downloads"
    )]
    pub download_dir: PathBuf,

    /// Processed-report store location.
    #[arg(
        long,
        global = true,
        env = "STAKEWATCH_DB",
        default_value = "edinet_reports.db"
    )]
    pub db: PathBuf,

    /// Store backend used for `--db`.
    #[arg(
        long,
        global = true,
        env = "STAKEWATCH_STORE",
        value_enum,
        default_value_t = StoreBackend::Sqlite
    )]
    pub store: StoreBackend,

    /// Log at debug level when `RUST_LOG` is unset.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Sqlite,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct ApiArgs {
    /// Subscription key for the disclosure API.
    #[arg(long, env = "EDINET_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(
        long,
        env = "EDINET_API_BASE",
        default_value = "https://disclosure.edinet-fsa.go.jp/api/v2"
    )]
    pub api_base: String,

    /// Filer code whose filings are downloaded.
    #[arg(long, env = "EDINET_CODE", default_value = "E35239")]
    pub target_code: String,

    /// Filer name fragment whose filings are downloaded.
    #[arg(long, env = "STAKEWATCH_TARGET_NAME", default_value = "光通信")]
    pub target_name: String,

    /// Delay before each API request (politeness).
    #[arg(long, default_value_t = 3000)]
    pub request_delay_ms: u64,
}

#[derive(Debug, Clone, Args)]
pub struct LineArgs {
    /// Channel access token for the push API.
    #[arg(long, env = "LINE_CHANNEL_ACCESS_TOKEN", hide_env_values = true)]
    pub line_token: Option<String>,

    /// Recipient user id.
    #[arg(long, env = "LINE_USER_ID")]
    pub line_user: Option<String>,

    #[arg(long, env = "LINE_API_BASE", default_value = "https://api.line.me")]
    pub line_api_base: String,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Filing date to collect (default: today).
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Print messages instead of pushing them.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub api: ApiArgs,

    #[command(flatten)]
    pub line: LineArgs,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Filing date to collect (default: today).
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Debug, Args)]
pub struct UnzipArgs {
    /// Directory holding the archives (default: the download directory).
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Sub-directory of the download directory to scan.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Print messages instead of pushing them.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub line: LineArgs,
}

#[derive(Debug, Args)]
pub struct NotifyArgs {
    #[arg(long, default_value = "テストメッセージです")]
    pub message: String,

    /// Print the message instead of pushing it.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub line: LineArgs,
}

#[derive(Debug, Subcommand)]
pub enum DbCommand {
    /// Record counts per filing kind.
    Stats,
    /// Every stored record, newest first.
    List,
    /// Records matching all given filters.
    Search(SearchArgs),
    /// Records sharing the most recent submission date.
    Latest,
    /// Copy every record of a JSON store into `--db`.
    Import(ImportArgs),
    /// Write every record of `--db` into a JSON store file.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub security_code: Option<String>,

    /// Substring of the holder name.
    #[arg(long)]
    pub holder: Option<String>,

    #[arg(long)]
    pub report_type: Option<String>,

    /// Substring of the target company name.
    #[arg(long)]
    pub company: Option<String>,

    #[arg(long, default_value_t = crate::store::DEFAULT_SEARCH_LIMIT)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// JSON store file to read.
    #[arg(long, default_value = "processed_reports.json")]
    pub json: PathBuf,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// JSON store file to write.
    #[arg(long, default_value = "processed_reports.json")]
    pub json: PathBuf,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, env = "STAKEWATCH_ADDR", default_value = "127.0.0.1:5000")]
    pub addr: SocketAddr,

    /// Channel secret used to verify webhook signatures.
    #[arg(long, env = "LINE_CHANNEL_SECRET", hide_env_values = true)]
    pub line_secret: Option<String>,

    #[command(flatten)]
    pub line: LineArgs,
}
