// ==========================================
// 禽场生产跟踪系统 - 管理 API
// ==========================================
// 职责: 用户名册、登录校验、维护模式、通知、员工查询
// 说明: 密码为明文比对，不构成安全模型
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::farm_state::FarmStateHandle;
use crate::domain::user::BUILTIN_ADMIN;
use crate::domain::{Employee, Notification, User, UserRole, UserRoster};
use crate::engine::ActivityAction;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// 登录结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AuthOutcome {
    Granted {
        username: String,
        role: UserRole,
        farms: Vec<String>,
    },
    InvalidCredentials,
    /// 维护模式下仅管理员可登录
    MaintenanceMode,
}

impl AuthOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, AuthOutcome::Granted { .. })
    }
}

pub struct AdminApi {
    state: Arc<FarmStateHandle>,
}

impl AdminApi {
    pub fn new(state: Arc<FarmStateHandle>) -> Self {
        Self { state }
    }

    // ==========================================
    // 用户
    // ==========================================

    pub fn authenticate(&self, username: &str, password: &str) -> ApiResult<AuthOutcome> {
        let outcome = self.state.read(|data| match data.users.get(username) {
            Some(user) if user.password == password => {
                if data.is_maintenance_mode && !user.role.is_admin() {
                    AuthOutcome::MaintenanceMode
                } else {
                    AuthOutcome::Granted {
                        username: username.to_string(),
                        role: user.role,
                        farms: user.farms.clone(),
                    }
                }
            }
            _ => AuthOutcome::InvalidCredentials,
        })?;

        match &outcome {
            AuthOutcome::Granted { role, .. } => info!(username, role = %role, "登录成功"),
            AuthOutcome::MaintenanceMode => warn!(username, "维护模式中，拒绝非管理员登录"),
            AuthOutcome::InvalidCredentials => warn!(username, "用户名或密码错误"),
        }
        Ok(outcome)
    }

    pub fn list_users(&self) -> ApiResult<UserRoster> {
        self.state.read(|data| data.users.clone())
    }

    /// 新增或修改用户
    pub fn upsert_user(&self, username: &str, user: User) -> ApiResult<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ApiError::InvalidInput("用户名不能为空".to_string()));
        }
        if user.password.is_empty() {
            return Err(ApiError::InvalidInput("密码不能为空".to_string()));
        }
        if username == BUILTIN_ADMIN && !user.role.is_admin() {
            return Err(ApiError::BusinessRuleViolation(
                "内置管理员账号的角色不可修改".to_string(),
            ));
        }

        let role = user.role;
        self.state.commit(
            ActivityAction::UpsertUser,
            |data| {
                let mut next = data.clone();
                next.users.insert(username.to_string(), user);
                Ok((next, ()))
            },
            |_| json!({ "username": username, "role": role }),
        )
    }

    /// 删除用户；内置管理员不可删除
    pub fn remove_user(&self, username: &str) -> ApiResult<()> {
        if username == BUILTIN_ADMIN {
            return Err(ApiError::BusinessRuleViolation(
                "内置管理员账号不可删除".to_string(),
            ));
        }
        self.state.commit(
            ActivityAction::RemoveUser,
            |data| {
                let mut next = data.clone();
                next.users
                    .remove(username)
                    .ok_or_else(|| ApiError::NotFound(format!("用户 {}", username)))?;
                Ok((next, ()))
            },
            |_| json!({ "username": username }),
        )
    }

    // ==========================================
    // 维护模式
    // ==========================================

    pub fn is_maintenance_mode(&self) -> ApiResult<bool> {
        self.state.read(|data| data.is_maintenance_mode)
    }

    pub fn set_maintenance_mode(&self, enabled: bool) -> ApiResult<()> {
        self.state.commit(
            ActivityAction::SetMaintenanceMode,
            |data| {
                let mut next = data.clone();
                next.is_maintenance_mode = enabled;
                Ok((next, ()))
            },
            |_| json!({ "enabled": enabled }),
        )?;
        info!(enabled, "维护模式已切换");
        Ok(())
    }

    // ==========================================
    // 通知
    // ==========================================

    pub fn push_notification(&self, message: &str, farm_name: Option<&str>) -> ApiResult<Notification> {
        if message.trim().is_empty() {
            return Err(ApiError::InvalidInput("通知内容不能为空".to_string()));
        }
        self.state.commit(
            ActivityAction::PushNotification,
            |data| {
                let notification = Notification::new(message, farm_name, Utc::now());
                let mut next = data.clone();
                next.push_notification(notification.clone());
                Ok((next, notification))
            },
            |n| json!({ "id": n.id, "farmName": n.farm_name }),
        )
    }

    pub fn mark_notification_read(&self, id: &str) -> ApiResult<()> {
        self.state.commit(
            ActivityAction::MarkNotificationRead,
            |data| {
                let mut next = data.clone();
                let notification = next
                    .notifications
                    .iter_mut()
                    .find(|n| n.id == id)
                    .ok_or_else(|| ApiError::NotFound(format!("通知 {}", id)))?;
                notification.read = true;
                Ok((next, ()))
            },
            |_| json!({ "id": id }),
        )
    }

    pub fn list_notifications(&self) -> ApiResult<Vec<Notification>> {
        self.state.read(|data| data.notifications.clone())
    }

    pub fn unread_notification_count(&self) -> ApiResult<usize> {
        self.state.read(|data| data.unread_notifications())
    }

    // ==========================================
    // 员工
    // ==========================================

    pub fn list_employees(&self) -> ApiResult<Vec<Employee>> {
        self.state.read(|data| data.employees.clone())
    }

    pub fn find_employee(&self, sap_no: &str) -> ApiResult<Option<Employee>> {
        self.state.read(|data| data.find_employee(sap_no).cloned())
    }
}
