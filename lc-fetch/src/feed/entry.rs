//! Entry point resolution.
//!
//! Each feed publishes an index document describing how to address a page
//! covering a given departure time (and optionally a stop), as a hydra
//! search template. [`EntryResolver`] fetches that index, caches the
//! template, and expands it per request — so a stream probing many stops
//! pays for the index fetch once, not per probe.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use moka::future::Cache as MokaCache;
use url::Url;

use crate::domain::StopId;
use crate::fetch::{BoundedClient, Fetch};

use super::error::{DecodeError, ResolutionError};
use super::types::IndexDocument;

/// TTL for cached search templates. Indexes change rarely; an hour keeps a
/// long-running fetcher honest without refetching per candidate probe.
const TEMPLATE_TTL: Duration = Duration::from_secs(60 * 60);

/// Maximum cached templates.
const TEMPLATE_CAPACITY: u64 = 64;

/// Template variable carrying the departure time.
const VAR_DEPARTURE_TIME: &str = "departureTime";

/// Template variable carrying the stop id.
const VAR_STOP: &str = "stop";

/// Resolves `(departure time, stop?)` to the URL of the feed page covering
/// that window.
pub struct EntryResolver<T> {
    entrypoint: Url,
    http: Arc<BoundedClient<T>>,
    templates: MokaCache<Url, String>,
}

impl<T: Fetch> EntryResolver<T> {
    /// Create a resolver for one entry point.
    pub fn new(entrypoint: Url, http: Arc<BoundedClient<T>>) -> Self {
        let templates = MokaCache::builder()
            .time_to_live(TEMPLATE_TTL)
            .max_capacity(TEMPLATE_CAPACITY)
            .build();

        Self {
            entrypoint,
            http,
            templates,
        }
    }

    /// The entry point this resolver serves.
    pub fn entrypoint(&self) -> &Url {
        &self.entrypoint
    }

    /// Resolve the URL of the page covering `departure_time` (and, when
    /// given, `stop`). Failures are not retried here; the calling stream
    /// decides what a failed resolution means.
    pub async fn first_url(
        &self,
        departure_time: DateTime<Utc>,
        stop: Option<&StopId>,
    ) -> Result<Url, ResolutionError> {
        let template = self.search_template().await?;

        let time = departure_time.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut values: Vec<(&str, &str)> = vec![(VAR_DEPARTURE_TIME, time.as_str())];
        if let Some(stop) = stop {
            values.push((VAR_STOP, stop.as_str()));
        }

        let expanded = expand_template(&template, &values);
        Url::parse(&expanded).map_err(|e| ResolutionError::InvalidUrl(format!("{expanded}: {e}")))
    }

    async fn search_template(&self) -> Result<String, ResolutionError> {
        if let Some(template) = self.templates.get(&self.entrypoint).await {
            return Ok(template);
        }

        let response = self.http.get(&self.entrypoint).await?;
        let index: IndexDocument =
            serde_json::from_str(&response.body).map_err(|e| DecodeError::Json {
                message: e.to_string(),
                body: Some(response.body.chars().take(500).collect()),
            })?;

        let template = index
            .search
            .and_then(|search| search.template)
            .ok_or(ResolutionError::NoMatchingPage)?;

        // A template that cannot take a departure time cannot address a
        // time window at all.
        if !template.contains(VAR_DEPARTURE_TIME) {
            return Err(ResolutionError::NoMatchingPage);
        }

        self.templates
            .insert(self.entrypoint.clone(), template.clone())
            .await;

        Ok(template)
    }
}

/// Expand a URI template against named values.
///
/// Supports the subset feeds actually use: `{?name,name}` query groups,
/// `{&name,name}` continuation groups, and bare `{name}` substitutions.
/// Variables without a value are skipped; values are percent-encoded.
fn expand_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after_brace = &rest[start + 1..];

        let Some(end) = after_brace.find('}') else {
            // Unterminated expression; emit verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let expr = &after_brace[..end];
        expand_expression(expr, values, &mut out);
        rest = &after_brace[end + 1..];
    }

    out.push_str(rest);
    out
}

fn expand_expression(expr: &str, values: &[(&str, &str)], out: &mut String) {
    let (operator, names) = if let Some(rest) = expr.strip_prefix('?') {
        (Some('?'), rest)
    } else if let Some(rest) = expr.strip_prefix('&') {
        (Some('&'), rest)
    } else {
        (None, expr)
    };

    match operator {
        Some(first_separator) => {
            let mut separator = first_separator;
            for name in names.split(',') {
                if let Some(value) = lookup(values, name) {
                    out.push(separator);
                    out.push_str(name);
                    out.push('=');
                    out.push_str(&encode(value));
                    separator = '&';
                }
            }
        }
        None => {
            if let Some(value) = lookup(values, names) {
                out.push_str(&encode(value));
            }
        }
    }
}

fn lookup<'a>(values: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    values
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, value)| *value)
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{ClientConfig, MockTransport};
    use chrono::TimeZone;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn client_with(transport: MockTransport) -> Arc<BoundedClient<MockTransport>> {
        Arc::new(BoundedClient::with_transport(
            transport,
            &ClientConfig::new(),
        ))
    }

    const INDEX: &str = r#"{
        "hydra:search": {
            "hydra:template": "http://feed.test/connections{?departureTime,stop}"
        }
    }"#;

    #[test]
    fn expand_query_group() {
        let expanded = expand_template(
            "http://feed.test/connections{?departureTime,stop}",
            &[("departureTime", "2024-03-15T10:00:00Z"), ("stop", "X")],
        );
        assert_eq!(
            expanded,
            "http://feed.test/connections?departureTime=2024-03-15T10%3A00%3A00Z&stop=X"
        );
    }

    #[test]
    fn expand_skips_missing_values() {
        let expanded = expand_template(
            "http://feed.test/connections{?departureTime,stop}",
            &[("departureTime", "2024-03-15T10:00:00Z")],
        );
        assert_eq!(
            expanded,
            "http://feed.test/connections?departureTime=2024-03-15T10%3A00%3A00Z"
        );
    }

    #[test]
    fn expand_continuation_group() {
        let expanded = expand_template(
            "http://feed.test/connections?format=json{&departureTime}",
            &[("departureTime", "2024-03-15T10:00:00Z")],
        );
        assert_eq!(
            expanded,
            "http://feed.test/connections?format=json&departureTime=2024-03-15T10%3A00%3A00Z"
        );
    }

    #[test]
    fn expand_bare_variable() {
        let expanded = expand_template(
            "http://feed.test/by-time/{departureTime}",
            &[("departureTime", "2024-03-15T10:00:00Z")],
        );
        assert_eq!(
            expanded,
            "http://feed.test/by-time/2024-03-15T10%3A00%3A00Z"
        );
    }

    #[tokio::test]
    async fn resolves_first_url() {
        let transport = MockTransport::new();
        transport.insert(url("http://feed.test/"), INDEX);

        let resolver = EntryResolver::new(url("http://feed.test/"), client_with(transport));
        let time = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        let resolved = resolver
            .first_url(time, Some(&StopId::parse("X").unwrap()))
            .await
            .unwrap();
        assert_eq!(
            resolved.as_str(),
            "http://feed.test/connections?departureTime=2024-03-15T10%3A00%3A00Z&stop=X"
        );

        let without_stop = resolver.first_url(time, None).await.unwrap();
        assert_eq!(
            without_stop.as_str(),
            "http://feed.test/connections?departureTime=2024-03-15T10%3A00%3A00Z"
        );
    }

    #[tokio::test]
    async fn template_is_cached() {
        let transport = Arc::new(MockTransport::new());
        transport.insert(url("http://feed.test/"), INDEX);

        let client = Arc::new(BoundedClient::with_transport(
            Arc::clone(&transport),
            &ClientConfig::new(),
        ));
        let resolver = EntryResolver::new(url("http://feed.test/"), client);
        let time = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        resolver.first_url(time, None).await.unwrap();

        // Break the index; the cached template keeps resolution working.
        transport.insert_error(url("http://feed.test/"), "index down");
        let later = Utc.with_ymd_and_hms(2024, 3, 15, 11, 0, 0).unwrap();
        assert!(resolver.first_url(later, None).await.is_ok());
    }

    #[tokio::test]
    async fn missing_template_is_no_matching_page() {
        let transport = MockTransport::new();
        transport.insert(url("http://feed.test/"), r#"{"@id": "http://feed.test/"}"#);

        let resolver = EntryResolver::new(url("http://feed.test/"), client_with(transport));
        let time = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        let result = resolver.first_url(time, None).await;
        assert!(matches!(result, Err(ResolutionError::NoMatchingPage)));
    }

    #[tokio::test]
    async fn template_without_time_variable_is_rejected() {
        let transport = MockTransport::new();
        transport.insert(
            url("http://feed.test/"),
            r#"{"hydra:search": {"hydra:template": "http://feed.test/all{?stop}"}}"#,
        );

        let resolver = EntryResolver::new(url("http://feed.test/"), client_with(transport));
        let time = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        let result = resolver.first_url(time, None).await;
        assert!(matches!(result, Err(ResolutionError::NoMatchingPage)));
    }

    #[tokio::test]
    async fn fetch_failure_surfaces() {
        let transport = MockTransport::new();
        transport.insert_error(url("http://feed.test/"), "index down");

        let resolver = EntryResolver::new(url("http://feed.test/"), client_with(transport));
        let time = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        let result = resolver.first_url(time, None).await;
        assert!(matches!(result, Err(ResolutionError::Fetch(_))));
    }
}
