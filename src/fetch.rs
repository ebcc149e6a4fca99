//! Usage fetch cycle: keychain credential, API call, state update

use crate::usage::{normalize_usage, UsageCategory};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

const USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";
const OAUTH_BETA_HEADER: &str = "oauth-2025-04-20";
const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";

const KEYCHAIN_TIMEOUT: Duration = Duration::from_secs(5);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything that can go wrong on the fetch path.
///
/// Carries the display text shown in the error line; none of these
/// are fatal and none of them touch the last good category snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("'security' command not found (macOS only)")]
    KeychainMissing,
    #[error("Failed to read keychain: {0}")]
    Keychain(String),
    #[error("Failed to parse keychain credentials as JSON")]
    CredentialJson,
    #[error("No accessToken found in keychain credentials")]
    TokenMissing,
    #[error("Keychain access timed out")]
    CredentialTimeout,
    #[error("Keychain error: {0}")]
    Credential(String),
    #[error("API error: {status} {reason}")]
    Api { status: u16, reason: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Fetch error: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct CredentialDocument {
    #[serde(rename = "claudeAiOauth", default)]
    claude_ai_oauth: Option<OauthCredentials>,
}

#[derive(Deserialize)]
struct OauthCredentials {
    #[serde(rename = "accessToken", default)]
    access_token: Option<String>,
}

/// Pull the OAuth access token out of the keychain JSON document
fn token_from_json(raw: &str) -> Result<String, FetchError> {
    let document: CredentialDocument =
        serde_json::from_str(raw.trim()).map_err(|_| FetchError::CredentialJson)?;
    document
        .claude_ai_oauth
        .and_then(|oauth| oauth.access_token)
        .filter(|token| !token.is_empty())
        .ok_or(FetchError::TokenMissing)
}

/// Wait for the keychain subprocess, killing it at the deadline
fn wait_with_deadline(child: &mut Child, deadline: Duration) -> Result<ExitStatus, FetchError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(FetchError::CredentialTimeout);
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(err) => return Err(FetchError::Credential(err.to_string())),
        }
    }
}

fn read_pipe(pipe: Option<impl Read>) -> String {
    let mut out = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut out);
    }
    out
}

/// Retrieve the Claude access token from the macOS Keychain.
pub fn access_token() -> Result<String, FetchError> {
    let mut child = Command::new("security")
        .args(["find-generic-password", "-s", KEYCHAIN_SERVICE, "-w"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                FetchError::KeychainMissing
            } else {
                FetchError::Credential(err.to_string())
            }
        })?;

    let status = wait_with_deadline(&mut child, KEYCHAIN_TIMEOUT)?;
    if !status.success() {
        let stderr = read_pipe(child.stderr.take());
        return Err(FetchError::Keychain(stderr.trim().to_string()));
    }
    let stdout = read_pipe(child.stdout.take());
    token_from_json(&stdout)
}

/// Fetch the raw usage payload from the Claude API.
pub fn fetch_usage(token: &str) -> Result<Map<String, Value>, FetchError> {
    let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
    let response = agent
        .get(USAGE_URL)
        .set("Authorization", &format!("Bearer {}", token))
        .set("anthropic-beta", OAUTH_BETA_HEADER)
        .call()
        .map_err(|err| match err {
            ureq::Error::Status(status, response) => FetchError::Api {
                status,
                reason: response.status_text().to_string(),
            },
            ureq::Error::Transport(transport) => FetchError::Network(transport.to_string()),
        })?;
    response
        .into_json::<Map<String, Value>>()
        .map_err(|err| FetchError::Decode(err.to_string()))
}

/// Most recent fetch outcome plus the last good category snapshot.
///
/// Owned by the dashboard loop; replaced in place on each cycle and
/// never shared across threads.
#[derive(Debug, Default)]
pub struct FetchState {
    pub categories: Vec<UsageCategory>,
    pub last_success: Option<Instant>,
    pub last_attempt: Option<Instant>,
    pub error: Option<FetchError>,
}

impl FetchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// One synchronous fetch cycle. Failures set the error and leave
    /// stale categories in place; success replaces the snapshot
    /// atomically and clears the error.
    pub fn refresh(&mut self) {
        self.last_attempt = Some(Instant::now());
        let token = match access_token() {
            Ok(token) => token,
            Err(err) => {
                log::warn!("credential lookup failed: {}", err);
                self.error = Some(err);
                return;
            }
        };
        match fetch_usage(&token) {
            Ok(raw) => {
                self.categories = normalize_usage(&raw);
                self.error = None;
                self.last_success = Some(Instant::now());
                log::debug!("usage refreshed: {} categories", self.categories.len());
            }
            Err(err) => {
                log::warn!("usage fetch failed: {}", err);
                self.error = Some(err);
            }
        }
    }
}
