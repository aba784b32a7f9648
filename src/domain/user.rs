// ==========================================
// 禽场生产跟踪系统 - 用户名册
// ==========================================
// 说明: 密码为明文比对，不构成安全模型
// ==========================================

use crate::domain::types::UserRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 用户名册：username -> User
pub type UserRoster = BTreeMap<String, User>;

/// 内置管理员账号（不可删除）
pub const BUILTIN_ADMIN: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub password: String,
    pub role: UserRole,
    /// 可访问的场区（空 = 全部）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub farms: Vec<String>,
}

impl User {
    pub fn new(password: &str, role: UserRole) -> Self {
        Self {
            password: password.to_string(),
            role,
            farms: Vec::new(),
        }
    }

    pub fn can_access_farm(&self, farm_name: &str) -> bool {
        self.role.is_admin() || self.farms.is_empty() || self.farms.iter().any(|f| f == farm_name)
    }
}

/// 内置默认名册
pub fn default_users() -> UserRoster {
    let mut roster = UserRoster::new();
    roster.insert(BUILTIN_ADMIN.to_string(), User::new("admin123", UserRole::Admin));
    roster.insert("supervisor".to_string(), User::new("super123", UserRole::Supervisor));
    roster
}

/// 合并导入名册到默认名册
///
/// 以 username 为键：导入值覆盖冲突项，默认值填补缺失项
pub fn merge_with_defaults(imported: UserRoster) -> UserRoster {
    let mut merged = default_users();
    merged.extend(imported);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_imported_wins_defaults_fill() {
        let mut imported = UserRoster::new();
        imported.insert("admin".to_string(), User::new("changed", UserRole::Admin));
        imported.insert("farm1".to_string(), User::new("f1", UserRole::User));

        let merged = merge_with_defaults(imported);

        assert_eq!(merged["admin"].password, "changed");
        assert!(merged.contains_key("supervisor"));
        assert_eq!(merged["farm1"].role, UserRole::User);
    }

    #[test]
    fn test_default_roster_has_only_builtin_accounts() {
        let roster = default_users();
        let names: Vec<&str> = roster.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["admin", "supervisor"]);
        assert_eq!(roster["admin"].role, UserRole::Admin);
        assert_eq!(roster["supervisor"].role, UserRole::Supervisor);
        assert!(roster.values().all(|u| u.role != UserRole::User));
    }

    #[test]
    fn test_farm_access() {
        let mut user = User::new("x", UserRole::User);
        assert!(user.can_access_farm("Any"));
        user.farms.push("Farm A".to_string());
        assert!(user.can_access_farm("Farm A"));
        assert!(!user.can_access_farm("Farm B"));
    }
}
