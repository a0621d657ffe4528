/*
 * search.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Related-question search
 */

//! Question search for the `search` section.
//!
//! The default collaborator asks the Stack Exchange search API for answered
//! questions whose title matches the fault message. A failed request is
//! reported as [`FaultlineError::SearchUnavailable`]; the assembler turns
//! that into a notice instead of failing the report.

use serde::Deserialize;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

use crate::config::SearchConfig;
use crate::error::{FaultlineError, Result};

/// One related question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
}

/// Looks up questions related to a fault message.
pub trait SearchCollaborator {
    fn search(&self, message: &str) -> Result<Vec<SearchHit>>;
}

/// Stack Exchange `/search` client.
pub struct StackExchangeSearch {
    agent: Agent,
    config: SearchConfig,
}

impl StackExchangeSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            agent: agent(),
            config,
        }
    }
}

/// HTTP agent using the platform TLS stack and root certificates.
fn agent() -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .build()
        .into()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    is_answered: bool,
}

impl SearchCollaborator for StackExchangeSearch {
    fn search(&self, message: &str) -> Result<Vec<SearchHit>> {
        tracing::debug!(endpoint = %self.config.endpoint, "Searching for related questions");

        let mut body = self
            .agent
            .get(&self.config.endpoint)
            .query("order", "desc")
            .query("sort", "activity")
            .query("tagged", &self.config.tag)
            .query("intitle", message)
            .query("site", &self.config.site)
            .header("User-Agent", "faultline")
            .call()
            .map_err(|e| FaultlineError::SearchUnavailable(e.to_string()))?
            .into_body();

        let text = body
            .read_to_string()
            .map_err(|e| FaultlineError::SearchUnavailable(e.to_string()))?;

        parse_response(&text)
    }
}

/// Decode a search response, keeping answered questions only.
pub fn parse_response(text: &str) -> Result<Vec<SearchHit>> {
    let response: SearchResponse = serde_json::from_str(text)
        .map_err(|e| FaultlineError::SearchUnavailable(format!("unexpected response: {}", e)))?;

    Ok(response
        .items
        .into_iter()
        .filter(|item| item.is_answered)
        .map(|item| SearchHit {
            title: unescape_html(&item.title),
            link: item.link,
        })
        .collect())
}

/// Titles arrive HTML-escaped. A title with an entity outside the XML set
/// is shown as it came.
fn unescape_html(text: &str) -> String {
    match quick_xml::escape::unescape(text) {
        Ok(title) => title.into_owned(),
        Err(e) => {
            tracing::debug!("Leaving title escaped ({}): {}", e, text);
            text.to_string()
        }
    }
}
