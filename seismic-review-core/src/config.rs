//! Review engine configuration types
//!
//! This module defines the small set of knobs the lifecycle engine needs: the
//! free-text descriptions attached to each transition and whether newly
//! admitted events get an initial ledger entry.

use serde::{Deserialize, Serialize};

/// Configuration for the review engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Seed an open `AutoDetected` entry when an event is admitted
    #[serde(default)]
    pub seed_creation_entry: bool,

    /// Description for the creation entry
    #[serde(default = "default_creation_description")]
    pub creation_description: String,

    /// Description recorded when an analyst locks an event
    #[serde(default = "default_lock_description")]
    pub lock_description: String,

    /// Description recorded on confirmation
    #[serde(default = "default_confirm_description")]
    pub confirm_description: String,

    /// Description recorded on rejection
    #[serde(default = "default_reject_description")]
    pub reject_description: String,

    /// Description recorded when escalating to an expert
    #[serde(default = "default_expert_description")]
    pub expert_description: String,

    /// State description set when a review is cancelled
    #[serde(default = "default_cancel_description")]
    pub cancel_description: String,
}

fn default_creation_description() -> String {
    crate::event::DETECTED_DESCRIPTION.to_string()
}

fn default_lock_description() -> String {
    "Locked for manual review".to_string()
}

fn default_confirm_description() -> String {
    "Confirmed by manual analysis".to_string()
}

fn default_reject_description() -> String {
    "Rejected by analysis".to_string()
}

fn default_expert_description() -> String {
    "Escalated to expert for review".to_string()
}

fn default_cancel_description() -> String {
    "Reverted to unreviewed".to_string()
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            seed_creation_entry: false,
            creation_description: default_creation_description(),
            lock_description: default_lock_description(),
            confirm_description: default_confirm_description(),
            reject_description: default_reject_description(),
            expert_description: default_expert_description(),
            cancel_description: default_cancel_description(),
        }
    }
}

impl ReviewConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: seed a creation entry on admission
    pub fn with_creation_entry(mut self, enabled: bool) -> Self {
        self.seed_creation_entry = enabled;
        self
    }

    /// Builder method: override the lock description
    pub fn with_lock_description(mut self, description: impl Into<String>) -> Self {
        self.lock_description = description.into();
        self
    }

    /// Builder method: override the confirmation description
    pub fn with_confirm_description(mut self, description: impl Into<String>) -> Self {
        self.confirm_description = description.into();
        self
    }

    /// Builder method: override the rejection description
    pub fn with_reject_description(mut self, description: impl Into<String>) -> Self {
        self.reject_description = description.into();
        self
    }

    /// Builder method: override the escalation description
    pub fn with_expert_description(mut self, description: impl Into<String>) -> Self {
        self.expert_description = description.into();
        self
    }

    /// Builder method: override the description set on cancel
    pub fn with_cancel_description(mut self, description: impl Into<String>) -> Self {
        self.cancel_description = description.into();
        self
    }
}
