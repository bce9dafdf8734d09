use serde_json::{json, Value};
use std::time::Duration;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

pub fn health_url(base: &str) -> String {
    format!("{}/health", base.trim_end_matches('/'))
}

/// GET {url}/health and report the result.
pub async fn ping(url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
    let target = health_url(url);

    let response = match client.get(&target).send().await {
        Ok(response) => response,
        Err(e) => {
            output_error(output_format, &format!("{} unreachable: {}", target, e), Some("UNREACHABLE"))?;
            anyhow::bail!("server unreachable");
        }
    };

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if status.is_success() {
        output_success(
            output_format,
            &format!("{} is up", url),
            Some(json!({ "status": status.as_u16(), "health": body })),
        )
    } else {
        output_error(output_format, &format!("{} answered {}", target, status), Some("DEGRADED"))?;
        anyhow::bail!("server degraded")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_url_ignores_trailing_slash() {
        assert_eq!(health_url("http://localhost:3000/"), "http://localhost:3000/health");
        assert_eq!(health_url("http://localhost:3000"), "http://localhost:3000/health");
    }
}
