use core::time::Duration;

use fantoccini::{
    Client, ClientBuilder,
    error::{CmdError, NewSessionError},
};
use serde_json::json;
use tokio::time::{Instant, sleep};

const CHROME_ARGS: [&str; 3] = [
    "--start-maximized",
    "--disable-infobars",
    "--disable-extensions",
];

/// Attach a WebDriver session to `webdriver_url`. There is no recovery path:
/// a failed session start is fatal for the caller.
pub async fn get_driver(webdriver_url: &str, headless: bool) -> Result<Client, NewSessionError> {
    let mut args = CHROME_ARGS.to_vec();
    if headless {
        args.push("--headless");
    }

    let mut builder = ClientBuilder::native();
    builder.capabilities(
        Some(("goog:chromeOptions".to_owned(), json!({ "args": args })))
            .into_iter()
            .collect(),
    );
    builder.connect(webdriver_url).await
}

/// Bounded poll for the current URL to contain `needle`. Returns `false` once
/// `timeout` elapses without a match; never waits indefinitely.
pub async fn wait_for_url_contains(
    driver: &Client,
    needle: &str,
    timeout: Duration,
) -> Result<bool, CmdError> {
    const PERIOD: Duration = Duration::from_millis(250);

    let deadline = Instant::now() + timeout;
    loop {
        if driver.current_url().await?.as_str().contains(needle) {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(PERIOD).await;
    }
}
