//! Durable session snapshot records

use serde::{Deserialize, Serialize};

use super::entry::CacheEntry;
use super::key::CacheKey;
use crate::domain::search::SearchTarget;

/// Last active search, saved so a fresh session can pick up where it left off
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub search_query: String,
    pub company: String,
    pub position: String,
    pub round: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_context: Option<String>,
}

impl SessionSnapshot {
    pub fn new(search_query: impl Into<String>, target: &SearchTarget) -> Self {
        Self {
            search_query: search_query.into(),
            company: target.company.clone(),
            position: target.position.clone(),
            round: target.round.clone(),
            job_url: None,
            job_context: None,
        }
    }

    pub fn with_job(mut self, job_url: Option<String>, job_context: Option<String>) -> Self {
        self.job_url = job_url;
        self.job_context = job_context;
        self
    }

    pub fn target(&self) -> SearchTarget {
        SearchTarget::new(&self.company, &self.position, &self.round)
    }
}

/// The most recently written entry, mirrored into the durable tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastFetched {
    pub key: CacheKey,
    pub entry: CacheEntry,
}
