mod extract;
mod harvest;
mod session;

use core::time::Duration;
use std::path::PathBuf;

use clap::Parser;

/// Scrape post cards from a Twitter search feed through a WebDriver session.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Search term, typed into the feed's search box verbatim.
    search_term: String,

    /// Account identifier (email or handle).
    #[arg(short, long, env = "TWITTER_USERNAME")]
    username: String,

    /// Account secret; prompted for interactively when absent.
    #[arg(short, long, env = "TWITTER_PASSWORD")]
    password: Option<String>,

    /// Output CSV path; created if absent, appended to if present.
    #[arg(short, long, default_value = "tweets.csv")]
    output: PathBuf,

    /// Consecutive no-movement scroll attempts before the feed counts as drained.
    #[arg(long, default_value_t = 5)]
    scroll_limit: u32,

    /// WebDriver endpoint to attach to.
    #[arg(long, default_value = "http://localhost:9515", env = "WEBDRIVER_URL")]
    webdriver: String,

    /// Keep the browser window visible.
    #[arg(long)]
    headed: bool,

    /// Upper bound, in seconds, on each element/navigation wait.
    #[arg(long, default_value_t = 10)]
    wait_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let args = Args::parse();
    let password = match args.password {
        Some(p) => p,
        None => rpassword::prompt_password(format!("password for {}: ", args.username))?,
    };
    let timeout = Duration::from_secs(args.wait_timeout);

    let driver = tscr::scrape::get_driver(&args.webdriver, !args.headed).await?;
    let driver = session::login(driver, &args.username, &password, timeout).await?;
    let driver = session::search(driver, &args.search_term, timeout).await?;

    let ctx = harvest::Context {
        driver,
        extractor: extract::Extractor::new(),
        output: args.output,
        scroll_limit: args.scroll_limit,
    };
    harvest::run(&ctx).await?;

    ctx.driver.close().await.map_err(Into::into)
}
