use std::collections::HashMap;
use std::str::FromStr;

use strum::IntoEnumIterator;
use thiserror::Error;

use crate::model::approval_level::ApprovalLevel;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("malformed approval permission entry `{0}`, expected level=permission")]
    Malformed(String),
    #[error("unknown approval level `{0}`")]
    UnknownLevel(String),
}

/// Which permission a user must hold to decide at each approval level.
///
/// Built once from configuration and handed to the service that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPolicy {
    permissions: HashMap<ApprovalLevel, String>,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl ApprovalPolicy {
    /// Levels missing from `overrides` fall back to their default permission.
    pub fn new(overrides: HashMap<ApprovalLevel, String>) -> Self {
        let permissions = ApprovalLevel::iter()
            .map(|level| {
                let permission = overrides
                    .get(&level)
                    .cloned()
                    .unwrap_or_else(|| level.default_permission().to_string());
                (level, permission)
            })
            .collect();

        Self { permissions }
    }

    /// Parses `direct_manager=perm.a,human_resources=perm.b`.
    pub fn parse(value: &str) -> Result<Self, PolicyError> {
        let mut overrides = HashMap::new();

        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (level, permission) = entry
                .split_once('=')
                .ok_or_else(|| PolicyError::Malformed(entry.to_string()))?;
            let (level, permission) = (level.trim(), permission.trim());
            if permission.is_empty() {
                return Err(PolicyError::Malformed(entry.to_string()));
            }
            let level = ApprovalLevel::from_str(level)
                .map_err(|_| PolicyError::UnknownLevel(level.to_string()))?;
            overrides.insert(level, permission.to_string());
        }

        Ok(Self::new(overrides))
    }

    pub fn permission_for(&self, level: ApprovalLevel) -> &str {
        self.permissions
            .get(&level)
            .map(String::as_str)
            .unwrap_or_else(|| level.default_permission())
    }

    pub fn can_approve(&self, level: ApprovalLevel, granted: &[String]) -> bool {
        let required = self.permission_for(level);
        granted.iter().any(|p| p == required)
    }

    /// Levels the holder of `granted` may decide at, lowest first.
    pub fn levels_granted(&self, granted: &[String]) -> Vec<ApprovalLevel> {
        ApprovalLevel::iter()
            .filter(|level| self.can_approve(*level, granted))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_level() {
        let policy = ApprovalPolicy::default();
        for level in ApprovalLevel::iter() {
            assert_eq!(policy.permission_for(level), level.default_permission());
        }
    }

    #[test]
    fn parse_overrides_selected_levels() {
        let policy = ApprovalPolicy::parse(" human_resources = hr.leave.sign , ").unwrap();

        assert_eq!(policy.permission_for(ApprovalLevel::HumanResources), "hr.leave.sign");
        assert_eq!(
            policy.permission_for(ApprovalLevel::DirectManager),
            "leave.approve.direct_manager"
        );
    }

    #[test]
    fn parse_rejects_bad_entries() {
        assert_eq!(
            ApprovalPolicy::parse("ceo=leave.all"),
            Err(PolicyError::UnknownLevel("ceo".to_string()))
        );
        assert_eq!(
            ApprovalPolicy::parse("direct_manager"),
            Err(PolicyError::Malformed("direct_manager".to_string()))
        );
        assert!(ApprovalPolicy::parse("direct_manager=").is_err());
    }

    #[test]
    fn granted_levels_follow_permissions() {
        let policy = ApprovalPolicy::default();
        let granted = vec![
            "leave.approve.human_resources".to_string(),
            "employee.read".to_string(),
        ];

        assert_eq!(policy.levels_granted(&granted), vec![ApprovalLevel::HumanResources]);
        assert!(!policy.can_approve(ApprovalLevel::DirectManager, &granted));
    }
}
