// Issue status domain model
use serde::{Deserialize, Serialize};

/// Numeric status value as stored by the issue tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(pub u32);

/// Named statuses the reporting code refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    New,
    Feedback,
    Acknowledged,
    Analyzed,
    Accepted,
    Opened,
    Deferred,
    Resolved,
    Delivered,
    Closed,
}

/// Status ids resolved once from configuration and passed explicitly
/// to every piece of code that needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCatalog {
    pub new: StatusId,
    pub acknowledged: StatusId,
    pub resolved: StatusId,
    pub closed: StatusId,
    pub feedback: Option<StatusId>,
    pub analyzed: Option<StatusId>,
    pub accepted: Option<StatusId>,
    pub opened: Option<StatusId>,
    pub deferred: Option<StatusId>,
    pub delivered: Option<StatusId>,
    /// Statuses at or above this value count as resolved for reporting.
    pub resolved_threshold: StatusId,
}

impl StatusCatalog {
    pub fn get(&self, kind: StatusKind) -> Option<StatusId> {
        match kind {
            StatusKind::New => Some(self.new),
            StatusKind::Feedback => self.feedback,
            StatusKind::Acknowledged => Some(self.acknowledged),
            StatusKind::Analyzed => self.analyzed,
            StatusKind::Accepted => self.accepted,
            StatusKind::Opened => self.opened,
            StatusKind::Deferred => self.deferred,
            StatusKind::Resolved => Some(self.resolved),
            StatusKind::Delivered => self.delivered,
            StatusKind::Closed => Some(self.closed),
        }
    }

    pub fn is_resolved(&self, status: StatusId) -> bool {
        status >= self.resolved_threshold
    }

    /// Display name for a status id, falling back to the raw number.
    pub fn name_of(&self, status: StatusId) -> String {
        const KINDS: [(StatusKind, &str); 10] = [
            (StatusKind::New, "new"),
            (StatusKind::Feedback, "feedback"),
            (StatusKind::Acknowledged, "acknowledged"),
            (StatusKind::Analyzed, "analyzed"),
            (StatusKind::Accepted, "accepted"),
            (StatusKind::Opened, "opened"),
            (StatusKind::Deferred, "deferred"),
            (StatusKind::Resolved, "resolved"),
            (StatusKind::Delivered, "delivered"),
            (StatusKind::Closed, "closed"),
        ];

        KINDS
            .iter()
            .find(|(kind, _)| self.get(*kind) == Some(status))
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| format!("status {}", status.0))
    }
}

#[cfg(test)]
pub(crate) fn mantis_catalog() -> StatusCatalog {
    StatusCatalog {
        new: StatusId(10),
        feedback: Some(StatusId(20)),
        acknowledged: StatusId(30),
        analyzed: None,
        accepted: None,
        opened: Some(StatusId(50)),
        deferred: None,
        resolved: StatusId(80),
        delivered: Some(StatusId(85)),
        closed: StatusId(90),
        resolved_threshold: StatusId(80),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_threshold() {
        let catalog = mantis_catalog();
        assert!(!catalog.is_resolved(StatusId(50)));
        assert!(catalog.is_resolved(StatusId(80)));
        assert!(catalog.is_resolved(StatusId(90)));
    }

    #[test]
    fn test_name_of() {
        let catalog = mantis_catalog();
        assert_eq!(catalog.name_of(StatusId(30)), "acknowledged");
        assert_eq!(catalog.name_of(StatusId(85)), "delivered");
        assert_eq!(catalog.name_of(StatusId(42)), "status 42");
    }
}
