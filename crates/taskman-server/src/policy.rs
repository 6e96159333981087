//! Central authorization table.
//!
//! Every handler resolves ownership facts first, then asks this module for a
//! decision. Rules live nowhere else; handlers only act on the returned
//! [`Decision`].

use taskman_shared::Role;

/// Ownership facts for a task, loaded eagerly before any check runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskOwnership {
    pub is_creator: bool,
    pub is_active_assignee: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Read,
    Update,
    Delete,
    Assign,
    Unassign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    Read,
    Update,
    Delete,
    ListTasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Update may touch the status field only; everything else is ignored.
    StatusOnly,
    Deny,
}

fn has(roles: &[Role], role: Role) -> bool {
    roles.contains(&role)
}

/// Admin and Manager see every task and project in list endpoints;
/// everyone else is scoped to creator-or-active-assignee.
pub fn can_list_all(roles: &[Role]) -> bool {
    has(roles, Role::Admin) || has(roles, Role::Manager)
}

pub fn authorize_task(roles: &[Role], action: TaskAction, ownership: TaskOwnership) -> Decision {
    let admin = has(roles, Role::Admin);
    let manager = has(roles, Role::Manager);

    match action {
        TaskAction::Read => {
            if admin || manager || ownership.is_creator || ownership.is_active_assignee {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        TaskAction::Update => {
            if admin || manager || ownership.is_creator {
                Decision::Allow
            } else if ownership.is_active_assignee {
                Decision::StatusOnly
            } else {
                Decision::Deny
            }
        }
        // Managers may delete only their own tasks. The source history
        // disagreed with itself here; creator-only is the resolved rule.
        TaskAction::Delete => {
            if admin || (manager && ownership.is_creator) {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        TaskAction::Assign | TaskAction::Unassign => {
            if admin || manager {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
    }
}

pub fn authorize_project(roles: &[Role], action: ProjectAction, is_creator: bool) -> Decision {
    let admin = has(roles, Role::Admin);
    let manager = has(roles, Role::Manager);

    match action {
        ProjectAction::Read | ProjectAction::Update | ProjectAction::ListTasks => {
            if admin || manager || is_creator {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        // No ownership check: any Manager or Admin may delete projects.
        ProjectAction::Delete => {
            if admin || manager {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
    }
}

/// Role mutation is Admin-only and never applies to the caller's own
/// account. The role set itself is constrained by the `Role` enum.
pub fn can_update_roles(roles: &[Role], caller: uuid::Uuid, target: uuid::Uuid) -> bool {
    has(roles, Role::Admin) && caller != target
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const NONE: &[Role] = &[];
    const USER: &[Role] = &[Role::User];
    const MANAGER: &[Role] = &[Role::Manager];
    const ADMIN: &[Role] = &[Role::Admin];

    fn creator() -> TaskOwnership {
        TaskOwnership {
            is_creator: true,
            is_active_assignee: false,
        }
    }

    fn assignee() -> TaskOwnership {
        TaskOwnership {
            is_creator: false,
            is_active_assignee: true,
        }
    }

    fn stranger() -> TaskOwnership {
        TaskOwnership::default()
    }

    #[test]
    fn elevated_roles_list_everything() {
        assert!(can_list_all(ADMIN));
        assert!(can_list_all(MANAGER));
        assert!(can_list_all(&[Role::User, Role::Manager]));
        assert!(!can_list_all(USER));
        assert!(!can_list_all(NONE));
    }

    #[test]
    fn task_read_allows_creator_and_active_assignee() {
        assert_eq!(authorize_task(USER, TaskAction::Read, creator()), Decision::Allow);
        assert_eq!(authorize_task(USER, TaskAction::Read, assignee()), Decision::Allow);
        assert_eq!(authorize_task(ADMIN, TaskAction::Read, stranger()), Decision::Allow);
        assert_eq!(authorize_task(MANAGER, TaskAction::Read, stranger()), Decision::Allow);
        assert_eq!(authorize_task(USER, TaskAction::Read, stranger()), Decision::Deny);
    }

    #[test]
    fn assignee_only_update_is_status_scoped() {
        assert_eq!(
            authorize_task(USER, TaskAction::Update, assignee()),
            Decision::StatusOnly
        );
        // Creator who is also assignee gets the full update.
        let both = TaskOwnership {
            is_creator: true,
            is_active_assignee: true,
        };
        assert_eq!(authorize_task(USER, TaskAction::Update, both), Decision::Allow);
        assert_eq!(authorize_task(USER, TaskAction::Update, stranger()), Decision::Deny);
    }

    #[test]
    fn manager_deletes_only_own_tasks() {
        assert_eq!(authorize_task(MANAGER, TaskAction::Delete, creator()), Decision::Allow);
        assert_eq!(authorize_task(MANAGER, TaskAction::Delete, stranger()), Decision::Deny);
        assert_eq!(authorize_task(MANAGER, TaskAction::Delete, assignee()), Decision::Deny);
    }

    #[test]
    fn admin_always_deletes() {
        assert_eq!(authorize_task(ADMIN, TaskAction::Delete, stranger()), Decision::Allow);
        assert_eq!(authorize_task(ADMIN, TaskAction::Delete, creator()), Decision::Allow);
    }

    #[test]
    fn plain_creator_cannot_delete() {
        assert_eq!(authorize_task(USER, TaskAction::Delete, creator()), Decision::Deny);
    }

    #[test]
    fn assignment_is_role_gated() {
        for action in [TaskAction::Assign, TaskAction::Unassign] {
            assert_eq!(authorize_task(ADMIN, action, stranger()), Decision::Allow);
            assert_eq!(authorize_task(MANAGER, action, stranger()), Decision::Allow);
            assert_eq!(authorize_task(USER, action, creator()), Decision::Deny);
        }
    }

    #[test]
    fn project_delete_has_no_ownership_check() {
        assert_eq!(
            authorize_project(MANAGER, ProjectAction::Delete, false),
            Decision::Allow
        );
        assert_eq!(
            authorize_project(USER, ProjectAction::Delete, true),
            Decision::Deny
        );
    }

    #[test]
    fn project_read_and_update_allow_creator() {
        for action in [ProjectAction::Read, ProjectAction::Update, ProjectAction::ListTasks] {
            assert_eq!(authorize_project(USER, action, true), Decision::Allow);
            assert_eq!(authorize_project(USER, action, false), Decision::Deny);
            assert_eq!(authorize_project(ADMIN, action, false), Decision::Allow);
        }
    }

    #[test]
    fn role_mutation_is_admin_only_and_never_self() {
        let caller = Uuid::new_v4();
        let target = Uuid::new_v4();

        assert!(can_update_roles(ADMIN, caller, target));
        assert!(!can_update_roles(ADMIN, caller, caller));
        assert!(!can_update_roles(MANAGER, caller, target));
        assert!(!can_update_roles(USER, caller, target));
    }
}
