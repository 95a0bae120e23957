use std::time::Duration;

use anyhow::Context as _;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;

use crate::annotate::AnnotationScheme;
use crate::cli::FetchArgs;
use crate::formats::{RawTableFile, SourceDescriptor};
use crate::layout::ProjectLayout;

const USER_AGENT: &str = concat!("difftable/", env!("CARGO_PKG_VERSION"));

/// How a single table download is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the first one; `0` behaves like `1`.
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub retry_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
            retry_statuses: vec![
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        }
    }
}

impl RetryPolicy {
    pub fn from_args(args: &FetchArgs) -> Self {
        Self {
            max_attempts: args.retries,
            base_backoff: Duration::from_millis(args.backoff_ms),
            ..Self::default()
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait before attempt `failed_attempt + 1`.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1_u32 << exponent)
    }

    pub fn retries_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub saved: usize,
    pub failed: usize,
    pub invalid: usize,
    pub write_failed: usize,
}

impl FetchReport {
    /// Fails when any downloaded table could not be saved.
    pub fn ensure_written(&self) -> anyhow::Result<()> {
        if self.write_failed > 0 {
            anyhow::bail!("failed to write {} table file(s)", self.write_failed);
        }
        Ok(())
    }
}

pub async fn run(args: FetchArgs) -> anyhow::Result<FetchReport> {
    let report = fetch_all(args).await?;
    report.ensure_written()?;
    Ok(report)
}

/// Downloads every table of the catalog. Only a catalog failure is an error;
/// per-table failures are logged and counted in the report.
pub async fn fetch_all(args: FetchArgs) -> anyhow::Result<FetchReport> {
    let layout = ProjectLayout::new(&args.root);
    let catalog = crate::catalog::load(&layout.catalog_path())?;

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(args.connect_timeout_secs))
        .timeout(Duration::from_secs(args.timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .context("build http client")?;
    let policy = RetryPolicy::from_args(&args);
    let delay = Duration::from_millis(args.delay_ms);

    let mut report = FetchReport::default();
    let mut first_request = true;

    for source in &catalog {
        if let Some(field) = crate::catalog::missing_required_field(source) {
            tracing::error!(
                table = source.display_name(),
                field,
                "catalog entry is incomplete; skipping"
            );
            report.invalid += 1;
            continue;
        }
        if source.short_name.trim().is_empty() {
            tracing::warn!(
                table = %source.internal_file_name,
                "catalog entry has no shortName; using empty string"
            );
        }

        if !first_request && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        first_request = false;

        let table = match fetch_table(&client, &policy, source, args.annotation_scheme).await {
            Ok(table) => table,
            Err(err) => {
                tracing::error!(
                    table = %source.internal_file_name,
                    url = %source.url,
                    error = %format!("{err:#}"),
                    "fetch failed; skipping"
                );
                report.failed += 1;
                continue;
            }
        };

        let path = layout.raw_table_path(&source.internal_file_name);
        match crate::store::write_json_pretty(&path, &table) {
            Ok(()) => {
                tracing::info!(
                    table = %source.internal_file_name,
                    out = %path.display(),
                    "saved table"
                );
                report.saved += 1;
            }
            Err(err) => {
                tracing::error!(
                    table = %source.internal_file_name,
                    error = %format!("{err:#}"),
                    "could not write table file"
                );
                report.write_failed += 1;
            }
        }
    }

    tracing::info!(
        saved = report.saved,
        failed = report.failed,
        invalid = report.invalid,
        write_failed = report.write_failed,
        "fetch finished"
    );

    Ok(report)
}

/// Downloads one table and wraps it the way `merge` expects to read it.
pub async fn fetch_table(
    client: &reqwest::Client,
    policy: &RetryPolicy,
    source: &SourceDescriptor,
    scheme: AnnotationScheme,
) -> anyhow::Result<RawTableFile> {
    let body = get_with_retry(client, policy, &source.url).await?;
    let mut songs: serde_json::Value = serde_json::from_str(&body)
        .with_context(|| format!("response from {} is not valid JSON", source.url))?;

    let rule = scheme.rule_for(&source.url);
    let annotated = crate::annotate::annotate(&mut songs, rule);
    tracing::debug!(
        table = %source.internal_file_name,
        field = rule.field,
        key = rule.key,
        annotated,
        "annotated records"
    );

    Ok(RawTableFile {
        short_name: source.short_name.clone(),
        songs,
    })
}

async fn get_with_retry(
    client: &reqwest::Client,
    policy: &RetryPolicy,
    url: &str,
) -> anyhow::Result<String> {
    let attempts = policy.attempts();
    let mut attempt = 1_u32;

    loop {
        let reason = match client
            .get(url)
            .header(ACCEPT, "application/json,text/plain;q=0.9,*/*;q=0.8")
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return response
                        .text()
                        .await
                        .with_context(|| format!("read response body from {url}"));
                }
                if attempt >= attempts || !policy.retries_status(status) {
                    anyhow::bail!("GET {url}: HTTP {status} (attempt {attempt}/{attempts})");
                }
                format!("HTTP {status}")
            }
            Err(err) => {
                if attempt >= attempts || !is_transient(&err) {
                    return Err(err)
                        .with_context(|| format!("GET {url} (attempt {attempt}/{attempts})"));
                }
                err.to_string()
            }
        };

        let backoff = policy.backoff(attempt);
        tracing::warn!(
            url,
            attempt,
            attempts,
            backoff_ms = backoff.as_millis() as u64,
            reason = %reason,
            "request failed; retrying"
        );
        tokio::time::sleep(backoff).await;
        attempt += 1;
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
