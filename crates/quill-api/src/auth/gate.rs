//! Authorization gate.
//!
//! Stateless checks over an explicit [`AuthContext`]. No session resolves to a 401;
//! insufficient role or ownership to a 403. Role order is `author < editor < admin`.

use quill_core::models::{Role, User};
use quill_core::AppError;
use serde::Serialize;

/// Who is calling, as resolved from their session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn require_role(&self, min_role: Role) -> Result<(), AppError> {
        if self.role.at_least(min_role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "This action requires the {} role",
                min_role
            )))
        }
    }

    /// Editors and admins always pass; authors only for their own resources.
    pub fn require_owner_or_editor(&self, owner_id: i64) -> Result<(), AppError> {
        if self.role.at_least(Role::Editor) || self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only the owner or an editor may do this".to_string(),
            ))
        }
    }
}

impl From<&User> for AuthContext {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

fn resolved(session: Option<&AuthContext>) -> Result<&AuthContext, AppError> {
    session.ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))
}

/// The session must resolve and carry at least `min_role`. Ownership checks run on
/// the resolved context via [`AuthContext::require_owner_or_editor`].
pub fn require(session: Option<&AuthContext>, min_role: Role) -> Result<AuthContext, AppError> {
    let ctx = resolved(session)?;
    ctx.require_role(min_role)?;
    Ok(*ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: i64 = 5;

    #[test]
    fn test_owner_or_editor_matrix() {
        let cases = [
            (AuthContext::new(OWNER, Role::Author), true),
            (AuthContext::new(6, Role::Author), false),
            (AuthContext::new(7, Role::Editor), true),
            (AuthContext::new(8, Role::Admin), true),
        ];
        for (ctx, allowed) in cases {
            let result = ctx.require_owner_or_editor(OWNER);
            assert_eq!(result.is_ok(), allowed, "{:?}", ctx);
            if !allowed {
                assert!(matches!(result, Err(AppError::Forbidden(_))));
            }
        }
    }

    #[test]
    fn test_require_role() {
        let author = AuthContext::new(1, Role::Author);
        let editor = AuthContext::new(2, Role::Editor);
        let admin = AuthContext::new(3, Role::Admin);

        assert!(require(Some(&author), Role::Author).is_ok());
        assert!(matches!(
            require(Some(&author), Role::Editor),
            Err(AppError::Forbidden(_))
        ));
        assert!(require(Some(&editor), Role::Editor).is_ok());
        assert!(require(Some(&editor), Role::Admin).is_err());
        assert_eq!(require(Some(&admin), Role::Editor).unwrap(), admin);
        assert!(matches!(
            require(None, Role::Author),
            Err(AppError::Unauthenticated(_))
        ));
    }
}
