//! OLAP client factory: opens one pooled
//! HTTP client per worker against the ClickHouse HTTP interface and runs
//! typed queries over it.
//!
//! A thin pool-wrapper type handed to handlers via injection, adapted from
//! a connection-pool repository shape to a pooled `reqwest::Client`, since
//! query execution against a specific OLAP engine's wire protocol is out of
//! scope; only the client lifecycle and a text-query escape hatch are
//! implemented here.

use reqwest::Client;
use serde_json::Value;

use crate::config::ClickhouseConfig;
use crate::error::{CoreError, CoreResult};

/// A pooled, typed connection to the configured ClickHouse instance.
///
/// One instance is built per worker and shared for the worker's lifetime.
#[derive(Clone)]
pub struct OlapClient {
    http: Client,
    base_url: String,
    database: String,
    user: String,
    password: String,
}

impl OlapClient {
    /// Build a client from resolved ClickHouse config. Does not dial the
    /// server — connections are established lazily per request.
    pub fn new(config: &ClickhouseConfig) -> CoreResult<Self> {
        let scheme = if config.use_ssl { "https" } else { "http" };
        let http = Client::builder()
            .build()
            .map_err(|e| CoreError::Olap(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: format!("{scheme}://{}:{}", config.host, config.host_port),
            database: config.db_name.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Execute a raw SQL query and decode the response as `JSONEachRow`
    /// (one JSON object per line), ClickHouse's row-oriented HTTP format.
    pub async fn query_raw(&self, sql: &str) -> CoreResult<Vec<Value>> {
        let formatted = format!("{sql} FORMAT JSONEachRow");
        let response = self
            .http
            .post(&self.base_url)
            .query(&[("database", self.database.as_str())])
            .basic_auth(&self.user, Some(&self.password))
            .body(formatted)
            .send()
            .await
            .map_err(|e| CoreError::Olap(format!("query request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Olap(format!("ClickHouse returned {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Olap(format!("failed to read response body: {e}")))?;

        body.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|e| CoreError::Olap(format!("malformed JSONEachRow line: {e}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_http_scheme_url_by_default() {
        let config = ClickhouseConfig {
            host: "localhost".into(),
            host_port: 8123,
            user: "default".into(),
            password: String::new(),
            db_name: "local".into(),
            use_ssl: false,
        };
        let client = OlapClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8123");
    }

    #[test]
    fn builds_https_scheme_url_when_ssl_enabled() {
        let config = ClickhouseConfig {
            use_ssl: true,
            ..ClickhouseConfig::default()
        };
        let client = OlapClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://localhost:8123");
    }
}
