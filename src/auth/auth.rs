use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

use crate::error::{HrError, HrResult};
use crate::model::role::Role;

/// Identity of the caller, placed in request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to a worker record
    pub worker_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(actix_web::error::ErrorUnauthorized("Missing token"))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> HrResult<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(HrError::forbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> HrResult<()> {
        if matches!(self.role, Role::Admin | Role::Hr) {
            Ok(())
        } else {
            Err(HrError::forbidden("HR/Admin only"))
        }
    }

    /// Anything that moves cash through a vault.
    pub fn require_finance(&self) -> HrResult<()> {
        if matches!(self.role, Role::Admin | Role::Accountant) {
            Ok(())
        } else {
            Err(HrError::forbidden("Admin/Accountant only"))
        }
    }

    /// Worker record the caller acts as, for self-service attendance.
    pub fn require_worker(&self) -> HrResult<u64> {
        self.worker_id
            .ok_or_else(|| HrError::forbidden("No worker profile linked to this account"))
    }

    pub fn is_staff(&self) -> bool {
        self.role != Role::Worker
    }
}

#[cfg(test)]
pub(crate) fn test_user(role: Role, worker_id: Option<u64>) -> AuthUser {
    AuthUser {
        user_id: 1,
        username: "tester".into(),
        role,
        worker_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_gates() {
        let hr = test_user(Role::Hr, None);
        assert!(hr.require_hr_or_admin().is_ok());
        assert!(matches!(hr.require_finance(), Err(HrError::Forbidden(_))));

        let accountant = test_user(Role::Accountant, None);
        assert!(accountant.require_finance().is_ok());
        assert!(accountant.require_hr_or_admin().is_err());

        let admin = test_user(Role::Admin, None);
        assert!(admin.require_admin().is_ok());
        assert!(admin.require_finance().is_ok());
        assert!(admin.require_hr_or_admin().is_ok());
    }

    #[test]
    fn worker_profile_required_for_self_service() {
        assert_eq!(test_user(Role::Worker, Some(12)).require_worker().unwrap(), 12);
        assert!(test_user(Role::Hr, None).require_worker().is_err());
        assert!(!test_user(Role::Worker, Some(12)).is_staff());
    }
}
