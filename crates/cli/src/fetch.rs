//! Download of the upstream event payload.
//!
//! `FetchClient` wraps a blocking HTTP client with retry / backoff and maps
//! failures onto the fetch exit codes. The payload is plain JavaScript, so
//! the body is returned as text; parsing lives in `cjedb_io::upstream`.

use std::thread;
use std::time::Duration;

use crate::exit_codes;
use crate::CliError;

// ── Constants ───────────────────────────────────────────────────────

pub(crate) const MAX_RETRIES: u32 = 3;
pub(crate) const USER_AGENT: &str = concat!("cjedb/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ── FetchClient ─────────────────────────────────────────────────────

pub(crate) struct FetchClient {
    http: reqwest::blocking::Client,
    initial_backoff: Duration,
}

impl FetchClient {
    pub(crate) fn new() -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError {
                code: exit_codes::EXIT_ERROR,
                message: format!("failed to build HTTP client: {e}"),
                hint: None,
            })?;

        Ok(Self {
            http,
            initial_backoff: Duration::from_secs(1),
        })
    }

    /// Shorten the first retry delay (doubles on each retry).
    pub(crate) fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// GET `url` and return the body text, retrying 429 / 5xx / network
    /// failures with exponential backoff.
    pub(crate) fn get_text(&self, url: &str) -> Result<String, CliError> {
        let mut backoff = self.initial_backoff;

        for attempt in 0..=MAX_RETRIES {
            let last_attempt = attempt == MAX_RETRIES;

            match self.http.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    // Retryable: 429, 5xx
                    if status == 429 || status >= 500 {
                        if last_attempt {
                            let (code, what) = if status == 429 {
                                (exit_codes::EXIT_FETCH_RATE_LIMIT, "rate limited")
                            } else {
                                (exit_codes::EXIT_FETCH_UPSTREAM, "upstream error")
                            };
                            return Err(CliError {
                                code,
                                message: format!(
                                    "{what} after {} attempts ({status}): {url}",
                                    MAX_RETRIES + 1,
                                ),
                                hint: None,
                            });
                        }

                        // Respect Retry-After header for 429
                        let wait = if status == 429 {
                            retry_after(&resp).unwrap_or(backoff)
                        } else {
                            backoff
                        };

                        tracing::warn!(
                            "retry {}/{} in {:?} (HTTP {})",
                            attempt + 1,
                            MAX_RETRIES,
                            wait,
                            status,
                        );
                        thread::sleep(wait);
                        backoff *= 2;
                        continue;
                    }

                    // Other 4xx: fail immediately
                    if status >= 400 {
                        return Err(CliError {
                            code: exit_codes::EXIT_FETCH_REJECTED,
                            message: format!("upstream rejected request ({status}): {url}"),
                            hint: Some("check --upstream-url".into()),
                        });
                    }

                    let text = resp.text().map_err(|e| CliError {
                        code: exit_codes::EXIT_FETCH_UPSTREAM,
                        message: format!("failed to read upstream response body: {e}"),
                        hint: None,
                    })?;
                    return Ok(text.trim_start_matches('\u{feff}').to_string());
                }
                Err(e) => {
                    // Network/timeout errors: retry
                    if last_attempt {
                        return Err(CliError {
                            code: exit_codes::EXIT_FETCH_UPSTREAM,
                            message: format!(
                                "upstream unreachable after {} attempts: {e}",
                                MAX_RETRIES + 1,
                            ),
                            hint: None,
                        });
                    }

                    tracing::warn!("retry {}/{} in {:?} ({})", attempt + 1, MAX_RETRIES, backoff, e);
                    thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }

        Err(CliError {
            code: exit_codes::EXIT_FETCH_UPSTREAM,
            message: format!("upstream fetch gave up: {url}"),
            hint: None,
        })
    }
}

/// Delay requested by a `Retry-After` header given in seconds.
fn retry_after(resp: &reqwest::blocking::Response) -> Option<Duration> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
