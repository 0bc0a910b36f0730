//! Issue and severity model shared by every sensor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::HealthStatus;

/// Unique identifier for a detected issue
pub type IssueId = Uuid;

/// Severity tiers, ordered from least to most impactful
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Blocking,
}

impl Severity {
    /// Whether an issue of this severity should drive the aggregate status to critical
    pub fn is_critical(self) -> bool {
        self >= Severity::High
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
            Severity::Blocking => "BLOCKING",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a detected problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    SyntaxError,
    TypeMismatch,
    DependencyMissing,
    DependencyVersionConflict,
    ArchitecturalInconsistency,
    PerformanceDegradation,
    SecurityVulnerability,
    CodeQuality,
}

/// Where an issue was found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueContext {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    pub scope: String,
    pub related_files: Vec<String>,
}

impl IssueContext {
    /// Context pointing at a whole file
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
            scope: "file".to_string(),
            related_files: Vec::new(),
        }
    }

    /// Context pointing at a 1-based line and column inside a file
    pub fn at(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            line: Some(line),
            column: Some(column),
            ..Self::file(file)
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_related_files(mut self, related: Vec<String>) -> Self {
        self.related_files = related;
        self
    }
}

/// Detection provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueMetadata {
    pub detected_at: DateTime<Utc>,
    pub detected_by: String,
    pub confidence: f64,
    pub tags: Vec<String>,
}

/// A problem reported by a sensor
///
/// Issues are plain values: they hold no references back into the sensor that
/// produced them and can be serialized as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationalIssue {
    pub id: IssueId,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    pub context: IssueContext,
    pub metadata: IssueMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl ComputationalIssue {
    /// Create an issue with full confidence and no tags
    pub fn new(
        issue_type: IssueType,
        severity: Severity,
        description: impl Into<String>,
        context: IssueContext,
        detected_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            issue_type,
            severity,
            description: description.into(),
            context,
            metadata: IssueMetadata {
                detected_at: Utc::now(),
                detected_by: detected_by.into(),
                confidence: 1.0,
                tags: Vec::new(),
            },
            suggested_fix: None,
        }
    }

    /// Set the confidence, clamped into `[0, 1]`. NaN becomes 0.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.metadata.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.metadata.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.iter().any(|t| t == tag)
    }
}

/// Derive the aggregate status of an issue set.
///
/// No issues is healthy, a worst severity of low or medium is a warning, and
/// anything from high upwards is critical.
pub fn classify_status(issues: &[ComputationalIssue]) -> HealthStatus {
    match issues.iter().map(|issue| issue.severity).max() {
        None => HealthStatus::Healthy,
        Some(severity) if severity.is_critical() => HealthStatus::Critical,
        Some(_) => HealthStatus::Warning,
    }
}
