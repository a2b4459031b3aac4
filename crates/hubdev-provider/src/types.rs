//! Container snapshot types

use std::collections::BTreeMap;

/// Container ID wrapper
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// First 12 characters, as the runtime abbreviates ids
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Health classification derived from the runtime's status text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HealthStatus {
    Starting,
    Healthy,
    Unhealthy,
    Restarting,
    Unknown,
}

/// Substrings of `docker ps` status text, tested in order. The patterns do
/// not overlap, so the order only matters for readability.
const STATUS_PATTERNS: &[(&str, HealthStatus)] = &[
    ("(unhealthy)", HealthStatus::Unhealthy),
    ("(healthy)", HealthStatus::Healthy),
    ("Restarting (", HealthStatus::Restarting),
    ("(health: starting)", HealthStatus::Starting),
];

impl HealthStatus {
    /// Classify raw status text such as `Up 2 minutes (healthy)`.
    /// Text matching no pattern is `Unknown`.
    pub fn classify(status_text: &str) -> Self {
        STATUS_PATTERNS
            .iter()
            .find(|(pattern, _)| status_text.contains(pattern))
            .map(|(_, status)| *status)
            .unwrap_or(Self::Unknown)
    }

    /// Unhealthy and restarting containers end a poll with a failure
    pub fn is_failing(&self) -> bool {
        matches!(self, Self::Unhealthy | Self::Restarting)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::Restarting => "restarting",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for HealthStatus {
    fn from(s: &str) -> Self {
        Self::classify(s)
    }
}

/// One row of a container listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: ContainerId,
    pub name: String,
    pub status: HealthStatus,
    /// Status text exactly as reported by the runtime
    pub status_text: String,
}

impl Container {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status_text: impl Into<String>) -> Self {
        let status_text = status_text.into();
        Self {
            id: ContainerId::new(id),
            name: name.into(),
            status: HealthStatus::classify(&status_text),
            status_text,
        }
    }

    fn group_key(&self, key: GroupKey) -> String {
        match key {
            GroupKey::Name => self.name.clone(),
            GroupKey::Status => self.status.as_str().to_string(),
        }
    }
}

/// Field used to group containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Name,
    Status,
}

/// Containers keyed by a grouping field
pub type ContainerGroups = BTreeMap<String, Vec<Container>>;

/// Partition containers by `key`, keeping every container exactly once
pub fn group_by(containers: &[Container], key: GroupKey) -> ContainerGroups {
    let mut groups = ContainerGroups::new();
    for container in containers {
        groups
            .entry(container.group_key(key))
            .or_default()
            .push(container.clone());
    }
    groups
}
