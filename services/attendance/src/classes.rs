//! Class management service
//!
//! Creation is gated by the authorization policy and by the rule that a
//! class must reference an existing teacher account. Listing is the
//! timetable view: open to every signed-in role, with teachers scoped
//! to their own classes.

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::jwt::Claims;
use crate::models::{Class, NewClass, Role};
use crate::policy::{self, Action, ClassAction, Decision};
use crate::store::{ClassStore, UserStore};

/// Class management service
#[derive(Clone)]
pub struct ClassService {
    classes: Arc<dyn ClassStore>,
    users: Arc<dyn UserStore>,
}

impl ClassService {
    /// Create a new class service
    pub fn new(classes: Arc<dyn ClassStore>, users: Arc<dyn UserStore>) -> Self {
        Self { classes, users }
    }

    /// Create a class owned by `new_class.teacher_id`.
    pub async fn create(&self, claims: &Claims, new_class: NewClass) -> ServiceResult<Class> {
        if new_class.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Class name is required".to_string(),
            ));
        }

        policy::ensure(
            claims,
            &Action::CreateClass {
                teacher_id: new_class.teacher_id,
            },
        )?;

        // The owner must be an existing teacher account.
        let teacher = self
            .users
            .get(new_class.teacher_id)
            .await
            .map_err(|e| {
                error!("Teacher lookup failed: {}", e);
                ServiceError::Unavailable
            })?
            .ok_or(ServiceError::InvalidTeacher)?;
        if teacher.role != Role::Teacher {
            return Err(ServiceError::InvalidTeacher);
        }

        let class = self.classes.insert(new_class).await.map_err(|e| {
            error!("Class insert failed: {}", e);
            ServiceError::Unavailable
        })?;

        info!("Created class {} for teacher {}", class.name, class.teacher_id);
        Ok(class)
    }

    /// The caller's timetable: teachers see the classes they own,
    /// students and admins see all classes.
    pub async fn list_for(&self, claims: &Claims) -> ServiceResult<Vec<Class>> {
        policy::ensure(claims, &Action::ListClasses)?;

        let classes = match claims.role {
            Role::Teacher => self.classes.list_by_teacher(claims.sub).await,
            Role::Student | Role::Admin => self.classes.list().await,
        };
        classes.map_err(|e| {
            error!("Class listing failed: {}", e);
            ServiceError::Unavailable
        })
    }

    /// Classes owned by a given teacher.
    pub async fn list_by_teacher(
        &self,
        claims: &Claims,
        teacher_id: Uuid,
    ) -> ServiceResult<Vec<Class>> {
        policy::ensure(claims, &Action::ListClasses)?;

        self.classes.list_by_teacher(teacher_id).await.map_err(|e| {
            error!("Class listing failed: {}", e);
            ServiceError::Unavailable
        })
    }

    /// Fetch a single class.
    pub async fn get(&self, claims: &Claims, class_id: Uuid) -> ServiceResult<Class> {
        policy::ensure(claims, &Action::ListClasses)?;

        self.classes
            .get(class_id)
            .await
            .map_err(|e| {
                error!("Class lookup failed: {}", e);
                ServiceError::Unavailable
            })?
            .ok_or(ServiceError::ClassNotFound)
    }

    /// Decide whether `claims` may perform `action` on the class,
    /// without performing it. Fails with [`ServiceError::ClassNotFound`]
    /// when the class does not exist.
    pub async fn authorize_class_action(
        &self,
        claims: &Claims,
        class_id: Uuid,
        action: ClassAction,
    ) -> ServiceResult<Decision> {
        let class = self
            .classes
            .get(class_id)
            .await
            .map_err(|e| {
                error!("Class lookup failed: {}", e);
                ServiceError::Unavailable
            })?
            .ok_or(ServiceError::ClassNotFound)?;

        Ok(policy::authorize(
            claims,
            &action.with_owner(class.teacher_id),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::models::NewUser;

    async fn seeded_user(store: &MemoryStore, username: &str, role: Role) -> crate::models::User {
        crate::store::UserStore::insert(
            store,
            NewUser {
                username: username.to_string(),
                full_name: format!("{username} test"),
                email: format!("{username}@school.test"),
                password_hash: String::new(),
                role,
            },
        )
        .await
        .unwrap()
    }

    fn claims_for(user: &crate::models::User) -> Claims {
        Claims {
            sub: user.id,
            role: user.role,
            iat: 0,
            exp: i64::MAX,
        }
    }

    fn service(store: &MemoryStore) -> ClassService {
        ClassService::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    fn new_class(name: &str, teacher_id: Uuid) -> NewClass {
        NewClass {
            name: name.to_string(),
            teacher_id,
            room: "B12".to_string(),
            schedule: vec![],
        }
    }

    #[tokio::test]
    async fn teacher_creates_their_own_class() {
        let store = MemoryStore::new();
        let teacher = seeded_user(&store, "alice", Role::Teacher).await;
        let classes = service(&store);

        let class = classes
            .create(&claims_for(&teacher), new_class("Mathematics", teacher.id))
            .await
            .unwrap();
        assert_eq!(class.teacher_id, teacher.id);
        assert_eq!(class.name, "Mathematics");
    }

    #[tokio::test]
    async fn teacher_cannot_create_for_someone_else() {
        let store = MemoryStore::new();
        let alice = seeded_user(&store, "alice", Role::Teacher).await;
        let bob = seeded_user(&store, "bob", Role::Teacher).await;
        let classes = service(&store);

        let err = classes
            .create(&claims_for(&alice), new_class("History", bob.id))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Forbidden);
    }

    #[tokio::test]
    async fn admin_creates_for_any_teacher() {
        let store = MemoryStore::new();
        let admin = seeded_user(&store, "root", Role::Admin).await;
        let teacher = seeded_user(&store, "alice", Role::Teacher).await;
        let classes = service(&store);

        let class = classes
            .create(&claims_for(&admin), new_class("Physics", teacher.id))
            .await
            .unwrap();
        assert_eq!(class.teacher_id, teacher.id);
    }

    #[tokio::test]
    async fn owner_must_be_a_teacher_account() {
        let store = MemoryStore::new();
        let admin = seeded_user(&store, "root", Role::Admin).await;
        let student = seeded_user(&store, "carol", Role::Student).await;
        let classes = service(&store);

        let unknown = classes
            .create(&claims_for(&admin), new_class("Art", Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(unknown, ServiceError::InvalidTeacher);

        let not_a_teacher = classes
            .create(&claims_for(&admin), new_class("Art", student.id))
            .await
            .unwrap_err();
        assert_eq!(not_a_teacher, ServiceError::InvalidTeacher);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let store = MemoryStore::new();
        let teacher = seeded_user(&store, "alice", Role::Teacher).await;
        let classes = service(&store);

        let err = classes
            .create(&claims_for(&teacher), new_class("   ", teacher.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn listing_scopes_teachers_to_their_classes() {
        let store = MemoryStore::new();
        let alice = seeded_user(&store, "alice", Role::Teacher).await;
        let bob = seeded_user(&store, "bob", Role::Teacher).await;
        let student = seeded_user(&store, "carol", Role::Student).await;
        let classes = service(&store);

        classes
            .create(&claims_for(&alice), new_class("Mathematics", alice.id))
            .await
            .unwrap();
        classes
            .create(&claims_for(&bob), new_class("History", bob.id))
            .await
            .unwrap();

        let alices_view = classes.list_for(&claims_for(&alice)).await.unwrap();
        assert_eq!(alices_view.len(), 1);
        assert_eq!(alices_view[0].name, "Mathematics");

        // Students see the whole timetable.
        let student_view = classes.list_for(&claims_for(&student)).await.unwrap();
        assert_eq!(student_view.len(), 2);
    }

    #[tokio::test]
    async fn get_misses_with_class_not_found() {
        let store = MemoryStore::new();
        let student = seeded_user(&store, "carol", Role::Student).await;
        let classes = service(&store);

        let err = classes
            .get(&claims_for(&student), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::ClassNotFound);
    }

    #[tokio::test]
    async fn authorize_class_action_resolves_ownership() {
        let store = MemoryStore::new();
        let alice = seeded_user(&store, "alice", Role::Teacher).await;
        let bob = seeded_user(&store, "bob", Role::Teacher).await;
        let classes = service(&store);

        let class = classes
            .create(&claims_for(&alice), new_class("Mathematics", alice.id))
            .await
            .unwrap();

        let own = classes
            .authorize_class_action(&claims_for(&alice), class.id, ClassAction::MarkAttendance)
            .await
            .unwrap();
        assert_eq!(own, Decision::Allow);

        let other = classes
            .authorize_class_action(&claims_for(&bob), class.id, ClassAction::MarkAttendance)
            .await
            .unwrap();
        assert_eq!(other, Decision::Deny);

        let missing = classes
            .authorize_class_action(&claims_for(&alice), Uuid::new_v4(), ClassAction::ReadRoster)
            .await
            .unwrap_err();
        assert_eq!(missing, ServiceError::ClassNotFound);
    }
}
