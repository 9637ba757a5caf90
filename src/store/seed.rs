//! Bulk seed data for populating a fresh store

use crate::recruitment::{
    Application, Candidate, Document, Interview, Job, Message, Notification,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initial contents of every collection. All lists default to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub jobs: Vec<Job>,
    pub candidates: Vec<Candidate>,
    pub applications: Vec<Application>,
    pub interviews: Vec<Interview>,
    pub messages: Vec<Message>,
    pub documents: Vec<Document>,
    pub notifications: Vec<Notification>,
}

impl SeedData {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid seed data")
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed = Self::from_yaml_str(&contents)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;
        tracing::info!(
            jobs = seed.jobs.len(),
            candidates = seed.candidates.len(),
            applications = seed.applications.len(),
            "Loaded seed data from {}",
            path.display()
        );
        Ok(seed)
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
            && self.candidates.is_empty()
            && self.applications.is_empty()
            && self.interviews.is_empty()
            && self.messages.is_empty()
            && self.documents.is_empty()
            && self.notifications.is_empty()
    }
}
