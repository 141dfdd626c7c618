// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Takedown submission validator.
//!
//! Validation is a pure function over the submitted payload. It never
//! touches the store and returns every failing field at once:
//! - requester contact must be a syntactically valid email
//! - at least one of `target_url` / `target_link_id`
//! - work title and claim details within their length bounds
//! - both sworn statements explicitly `true`

use crate::config::ValidationConfig;
use crate::models::LinkId;
use crate::resolver::TargetSelector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// Raw submission body as received.
///
/// The sworn statements are kept as raw JSON values so that anything other
/// than a literal `true` is reported as a field error instead of failing
/// deserialization of the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TakedownSubmission {
    pub requester_contact: Option<String>,
    pub requester_name: Option<String>,
    pub requester_company: Option<String>,
    pub target_url: Option<String>,
    pub target_link_id: Option<LinkId>,
    pub work_title: Option<String>,
    pub claim_details: Option<String>,
    pub good_faith_statement: Option<serde_json::Value>,
    pub accuracy_statement: Option<serde_json::Value>,
}

/// Field name to error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub requester_contact: String,
    pub requester_name: Option<String>,
    pub requester_company: Option<String>,
    /// How the target is located; an explicit id wins over a URL
    pub target: TargetSelector,
    /// Submitted URL, kept for the record even when an id was also given
    pub target_url: Option<String>,
    pub work_title: String,
    pub claim_details: String,
}

impl ValidSubmission {
    pub fn target_link_id(&self) -> Option<LinkId> {
        match self.target {
            TargetSelector::ById(id) => Some(id),
            TargetSelector::ByUrl(_) => None,
        }
    }
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    Valid(ValidSubmission),
    Invalid(FieldErrors),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(errors) => Some(errors),
        }
    }
}

/// Takedown submission validator.
#[derive(Debug, Clone)]
pub struct SubmissionValidator {
    config: ValidationConfig,
}

impl SubmissionValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a complete submission.
    pub fn validate(&self, submission: &TakedownSubmission) -> ValidationResult {
        let mut errors = FieldErrors::default();

        let contact = submission.requester_contact.as_deref().unwrap_or("");
        if !is_valid_email(contact) {
            errors.add("requester_contact", "Must be a valid email address");
        }

        let target_url = submission
            .target_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(raw) = target_url {
            if !is_http_url(raw) {
                errors.add("target_url", "Must be a valid http or https URL");
            }
        }
        let target = TargetSelector::from_parts(submission.target_link_id, target_url);
        if target.is_none() {
            errors.add("target_url", "Either target_url or target_link_id is required");
        }

        let work_title = submission.work_title.as_deref().unwrap_or("");
        let title_len = work_title.chars().count();
        if title_len == 0 || title_len > self.config.work_title_max {
            errors.add(
                "work_title",
                format!(
                    "Must be between 1 and {} characters",
                    self.config.work_title_max
                ),
            );
        }

        let claim_details = submission.claim_details.as_deref().unwrap_or("");
        let details_len = claim_details.chars().count();
        if details_len < self.config.claim_details_min
            || details_len > self.config.claim_details_max
        {
            errors.add(
                "claim_details",
                format!(
                    "Must be between {} and {} characters",
                    self.config.claim_details_min, self.config.claim_details_max
                ),
            );
        }

        if !is_affirmed(submission.good_faith_statement.as_ref()) {
            errors.add(
                "good_faith_statement",
                "You must affirm the good faith statement",
            );
        }
        if !is_affirmed(submission.accuracy_statement.as_ref()) {
            errors.add("accuracy_statement", "You must affirm the accuracy statement");
        }

        let target = match target {
            Some(target) if errors.is_empty() => target,
            _ => {
                debug!(fields = ?errors.fields().collect::<Vec<_>>(), "Submission invalid");
                return ValidationResult::Invalid(errors);
            }
        };

        ValidationResult::Valid(ValidSubmission {
            requester_contact: contact.to_string(),
            requester_name: non_blank(submission.requester_name.as_deref()),
            requester_company: non_blank(submission.requester_company.as_deref()),
            target,
            target_url: target_url.map(str::to_string),
            work_title: work_title.to_string(),
            claim_details: claim_details.to_string(),
        })
    }
}

fn is_affirmed(value: Option<&serde_json::Value>) -> bool {
    matches!(value, Some(serde_json::Value::Bool(true)))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Syntactic email check: one `@`, a non-empty local part and a dotted
/// domain made of non-empty labels, no whitespace.
fn is_valid_email(value: &str) -> bool {
    if value.is_empty() || value.len() > 254 || value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}
