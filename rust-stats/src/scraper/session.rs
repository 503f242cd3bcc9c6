//! WebDriver-backed browser session
//!
//! Acquired once per run with [`WebDriverSession::connect`] and released with
//! [`WebDriverSession::close`]. Callers must close the session on error paths
//! too; a dropped session leaves the browser running until the driver's own
//! idle timeout.

use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::{BrowserSession, Control, OptionMatch};
use crate::config::ScraperConfig;
use crate::error::FetchError;

pub struct WebDriverSession {
    client: Client,
    wait: Duration,
}

impl WebDriverSession {
    /// Start a Chrome session on the configured WebDriver endpoint
    pub async fn connect(config: &ScraperConfig) -> Result<Self, FetchError> {
        let mut args = vec!["--ignore-certificate-errors", "--incognito"];
        if config.headless {
            args.push("--headless");
        }

        let mut capabilities = serde_json::Map::new();
        capabilities.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        info!("Connecting to WebDriver at {}", config.webdriver_url);
        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| FetchError::Session(e.to_string()))?;

        Ok(Self {
            client,
            wait: Duration::from_secs(config.step_timeout_secs),
        })
    }

    /// End the browser session
    pub async fn close(self) -> Result<(), FetchError> {
        info!("Closing WebDriver session");
        self.client
            .close()
            .await
            .map_err(|e| FetchError::Session(e.to_string()))
    }
}

fn driver_error(step: &str, e: fantoccini::error::CmdError) -> FetchError {
    FetchError::Driver {
        step: step.to_string(),
        message: e.to_string(),
    }
}

impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        debug!("goto {}", url);
        self.client
            .goto(url)
            .await
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn select_option(
        &mut self,
        control: Control,
        matcher: &OptionMatch,
    ) -> Result<bool, FetchError> {
        let dropdown = self
            .client
            .wait()
            .at_most(self.wait)
            .for_element(Locator::Css(control.css()))
            .await
            .map_err(|e| driver_error(control.css(), e))?;

        let options = dropdown
            .find_all(Locator::Css("option"))
            .await
            .map_err(|e| driver_error(control.label(), e))?;

        for option in options {
            let value = option
                .attr("value")
                .await
                .map_err(|e| driver_error(control.label(), e))?;
            let text = option
                .text()
                .await
                .map_err(|e| driver_error(control.label(), e))?;

            if matcher.matches(value.as_deref(), &text) {
                debug!("{}: selecting {:?}", control.label(), text);
                option
                    .click()
                    .await
                    .map_err(|e| driver_error(control.label(), e))?;
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn element_html(&mut self, element_id: &str) -> Result<String, FetchError> {
        let element = self
            .client
            .wait()
            .at_most(self.wait)
            .for_element(Locator::Id(element_id))
            .await
            .map_err(|e| driver_error(element_id, e))?;

        element
            .html(false)
            .await
            .map_err(|e| driver_error(element_id, e))
    }
}
