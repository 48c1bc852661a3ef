//! App users, registration and sessions.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::access::Requester;
use crate::error::LendingError;
use crate::models::{AppUser, Role};
use crate::types::Id;
use crate::LendingResult;

use super::Portfolio;

/// Sign-up form fields. `id` comes from the authentication subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Id,
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// An authenticated, active user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: AppUser,
}

impl Session {
    pub fn requester(&self) -> Requester {
        Requester::new(self.user.id, self.user.role)
    }
}

impl Portfolio {
    /// Open a session for `user_id`. Inactive accounts are refused, which is
    /// the equivalent of signing them out right after login.
    pub fn establish_session(&self, user_id: Id) -> LendingResult<Session> {
        let user = self
            .users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| LendingError::NotFound {
                entity: "AppUser".into(),
                id: user_id.to_string(),
            })?;

        if !user.active {
            tracing::warn!(user = %user.id, "session refused for inactive user");
            return Err(LendingError::InactiveUser(user.email.clone()));
        }

        tracing::debug!(user = %user.id, role = ?user.role, "session established");
        Ok(Session { user: user.clone() })
    }

    /// Create the user row for a new sign-up as an inactive lender. Signing
    /// up twice with the same email returns the existing row unchanged.
    pub fn register_user(&mut self, registration: Registration) -> LendingResult<AppUser> {
        let email = registration.email.trim();
        if email.is_empty() {
            return Err(LendingError::invalid("email", "is required"));
        }
        if registration.first_name.trim().is_empty() {
            return Err(LendingError::invalid("first_name", "is required"));
        }

        if let Some(existing) = self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
        {
            return Ok(existing.clone());
        }
        if self.users.iter().any(|u| u.id == registration.id) {
            return Err(LendingError::Conflict(format!(
                "user id {} is already registered with another email",
                registration.id
            )));
        }

        let now = Utc::now();
        let user = AppUser {
            id: registration.id,
            email: email.to_string(),
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
            document: registration.document,
            phone: registration.phone,
            role: Role::Lender,
            active: false,
            created_at: now,
            updated_at: now,
        };
        tracing::info!(user = %user.id, "registered user pending approval");
        self.users.push(user.clone());
        Ok(user)
    }

    pub fn users(&self, requester: &Requester) -> LendingResult<Vec<&AppUser>> {
        require_admin(requester, "list users")?;
        Ok(self.users.iter().collect())
    }

    /// Users still waiting for approval.
    pub fn pending_users(&self, requester: &Requester) -> LendingResult<Vec<&AppUser>> {
        require_admin(requester, "list users")?;
        Ok(self.users.iter().filter(|u| !u.active).collect())
    }

    pub fn approve_user(&mut self, requester: &Requester, user_id: Id) -> LendingResult<AppUser> {
        require_admin(requester, "approve users")?;
        let user = self.user_mut(user_id)?;
        user.active = true;
        user.updated_at = Utc::now();
        tracing::info!(user = %user_id, approved_by = %requester.id, "user approved");
        Ok(user.clone())
    }

    pub fn delete_user(&mut self, requester: &Requester, user_id: Id) -> LendingResult<()> {
        require_admin(requester, "delete users")?;
        if requester.id == user_id {
            return Err(LendingError::Conflict("admins cannot delete their own account".into()));
        }
        self.user_mut(user_id)?;
        self.users.retain(|u| u.id != user_id);
        tracing::info!(user = %user_id, deleted_by = %requester.id, "user deleted");
        Ok(())
    }

    fn user_mut(&mut self, user_id: Id) -> LendingResult<&mut AppUser> {
        self.users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| LendingError::NotFound {
                entity: "AppUser".into(),
                id: user_id.to_string(),
            })
    }
}

pub(crate) fn require_admin(requester: &Requester, action: &str) -> LendingResult<()> {
    if requester.is_admin() {
        Ok(())
    } else {
        tracing::warn!(requester = %requester.id, action, "admin-only action refused");
        Err(LendingError::AccessDenied {
            entity: "admin".into(),
            id: action.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn registration(email: &str) -> Registration {
        Registration {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: "Luis".into(),
            last_name: "Gómez".into(),
            document: Some("V-1".into()),
            phone: None,
        }
    }

    #[test]
    fn test_new_registration_is_inactive_lender() {
        let mut portfolio = Portfolio::new();
        let user = portfolio.register_user(registration("luis@example.com")).unwrap();
        assert_eq!(user.role, Role::Lender);
        assert!(!user.active);
        assert!(matches!(
            portfolio.establish_session(user.id),
            Err(LendingError::InactiveUser(_))
        ));
    }

    #[test]
    fn test_registration_is_idempotent_by_email() {
        let mut portfolio = Portfolio::new();
        let first = portfolio.register_user(registration("luis@example.com")).unwrap();
        let again = portfolio.register_user(registration("LUIS@example.com")).unwrap();
        assert_eq!(first.id, again.id);
    }

    #[test]
    fn test_only_admin_approves() {
        let mut portfolio = Portfolio::new();
        let user = portfolio.register_user(registration("luis@example.com")).unwrap();
        let lender = Requester::new(Uuid::new_v4(), Role::Lender);
        assert!(portfolio.approve_user(&lender, user.id).is_err());

        let admin = Requester::new(Uuid::new_v4(), Role::Admin);
        portfolio.approve_user(&admin, user.id).unwrap();
        let session = portfolio.establish_session(user.id).unwrap();
        assert_eq!(session.requester(), Requester::new(user.id, Role::Lender));
    }

    #[test]
    fn test_unknown_user_has_no_session() {
        let portfolio = Portfolio::new();
        assert!(matches!(
            portfolio.establish_session(Uuid::new_v4()),
            Err(LendingError::NotFound { .. })
        ));
    }
}
