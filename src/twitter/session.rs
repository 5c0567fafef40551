use core::time::Duration;

use fantoccini::{Client, Locator, error::CmdError, key::Key};

const LOGIN_URL: &str = "https://twitter.com/login";
const HOME_MARKER: &str = "/home";

const USERNAME_INPUT: Locator<'static> =
    Locator::Css(r#"input[name="session[username_or_email]"]"#);
const PASSWORD_INPUT: Locator<'static> = Locator::Css(r#"input[name="session[password]"]"#);
const SEARCH_INPUT: Locator<'static> = Locator::Css(r#"input[aria-label="Search query"]"#);

/// Authenticate the session. Consumes the driver and returns it only on
/// success; on either bounded wait running out the session is closed and the
/// run is over. Wrong credentials, a slow network and UI drift are
/// indistinguishable here: all surface as the same timeout.
pub async fn login(
    driver: Client,
    username: &str,
    password: &str,
    timeout: Duration,
) -> anyhow::Result<Client> {
    driver.goto(LOGIN_URL).await?;

    let user_input = match driver
        .wait()
        .at_most(timeout)
        .for_element(USERNAME_INPUT)
        .await
    {
        Ok(element) => element,
        Err(CmdError::WaitTimeout) => {
            tracing::error!(target: "login", "credential form never appeared");
            driver.close().await?;
            anyhow::bail!("login failed: credential form not found");
        }
        Err(e) => return Err(e.into()),
    };
    user_input.send_keys(username).await?;

    let secret_input = driver.find(PASSWORD_INPUT).await?;
    secret_input.send_keys(password).await?;
    secret_input
        .send_keys(&String::from(char::from(Key::Enter)))
        .await?;

    if !tscr::scrape::wait_for_url_contains(&driver, HOME_MARKER, timeout).await? {
        tracing::error!(target: "login", "never reached {HOME_MARKER}; check credentials or connectivity");
        driver.close().await?;
        anyhow::bail!("login failed for {username}");
    }

    tracing::info!(target: "login", "login successful");
    Ok(driver)
}

/// Submit the search term through the feed's search box. The term goes in
/// verbatim, no escaping. Same terminal-failure policy as `login`.
pub async fn search(driver: Client, term: &str, timeout: Duration) -> anyhow::Result<Client> {
    let input = match driver
        .wait()
        .at_most(timeout)
        .for_element(SEARCH_INPUT)
        .await
    {
        Ok(element) => element,
        Err(CmdError::WaitTimeout) => {
            tracing::error!(target: "search", "search input never appeared");
            driver.close().await?;
            anyhow::bail!("search input not found");
        }
        Err(e) => return Err(e.into()),
    };

    let mut keys = term.to_owned();
    keys.push(char::from(Key::Enter));
    input.send_keys(&keys).await?;

    tracing::info!(target: "search", "search initiated for \x1b[36m{term}\x1b[0m");
    Ok(driver)
}
