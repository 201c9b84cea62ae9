// Account repository behavior: normalization, partial updates, seeding and
// the admin self-edit rules

mod common;

use common::{test_pool, test_settings};
use hub_runtime::{verify_password, Role, UserOps, UserUpdate};

#[tokio::test]
async fn create_and_get_user_is_case_and_whitespace_insensitive() {
    let pool = test_pool().await;

    let uid = UserOps::create_user(&pool, "  Test@A.com ", "abc12345", Role::User, true)
        .await
        .unwrap();

    for variant in ["test@a.com", "TEST@A.COM", "  test@a.com  ", "Test@a.Com"] {
        let user = UserOps::get_user_by_email(&pool, variant)
            .await
            .unwrap()
            .expect("lookup should hit regardless of casing");
        assert_eq!(user.id, uid);
        assert_eq!(user.email, "test@a.com");
        assert_eq!(user.role, Role::User);
        assert!(user.active);
    }
}

#[tokio::test]
async fn create_user_validates_before_any_mutation() {
    let pool = test_pool().await;

    assert!(UserOps::create_user(&pool, "   ", "abc12345", Role::User, true)
        .await
        .unwrap_err()
        .is_validation());
    assert!(UserOps::create_user(&pool, "x@a.com", "short", Role::User, true)
        .await
        .unwrap_err()
        .is_validation());

    assert!(UserOps::list_users(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_user_changes_only_supplied_fields() {
    let pool = test_pool().await;
    let uid = UserOps::create_user(&pool, "x@a.com", "abc12345", Role::User, true)
        .await
        .unwrap();

    UserOps::update_user(
        &pool,
        uid,
        &UserUpdate {
            role: Some(Role::Compliance),
            active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let user = UserOps::get_user_by_email(&pool, "x@a.com").await.unwrap().unwrap();
    assert_eq!(user.role, Role::Compliance);
    assert!(!user.active);
    assert_eq!(user.email, "x@a.com");
    assert!(user.updated_at >= user.created_at);

    // Empty update is a no-op
    let before = UserOps::get_user(&pool, uid).await.unwrap().unwrap();
    UserOps::update_user(&pool, uid, &UserUpdate::default()).await.unwrap();
    let after = UserOps::get_user(&pool, uid).await.unwrap().unwrap();
    assert_eq!(before.updated_at, after.updated_at);
}

#[tokio::test]
async fn set_password_rehashes() {
    let pool = test_pool().await;
    let uid = UserOps::create_user(&pool, "p@a.com", "oldpass123", Role::User, true)
        .await
        .unwrap();

    let u1 = UserOps::get_user_by_email(&pool, "p@a.com").await.unwrap().unwrap();
    assert!(verify_password("oldpass123", &u1.password_hash));

    UserOps::set_password(&pool, uid, "newpass123").await.unwrap();
    let u2 = UserOps::get_user_by_email(&pool, "p@a.com").await.unwrap().unwrap();
    assert!(verify_password("newpass123", &u2.password_hash));
    assert!(!verify_password("oldpass123", &u2.password_hash));
}

#[tokio::test]
async fn list_users_newest_first() {
    let pool = test_pool().await;
    UserOps::create_user(&pool, "a@a.com", "pw123456", Role::User, true).await.unwrap();
    UserOps::create_user(&pool, "b@a.com", "pw123456", Role::Admin, true).await.unwrap();

    let users = UserOps::list_users(&pool).await.unwrap();
    assert_eq!(users.len(), 2);
    // Same-second creations fall back to id ordering, newest first
    assert_eq!(users[0].email, "b@a.com");
    assert_eq!(users[1].email, "a@a.com");
}

#[tokio::test]
async fn admin_cannot_deactivate_self() {
    let pool = test_pool().await;
    let admin = UserOps::create_user(&pool, "admin@a.com", "pw123456", Role::Admin, true)
        .await
        .unwrap();

    let err = UserOps::apply_admin_edit(
        &pool,
        admin,
        admin,
        &UserUpdate {
            active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(err.is_validation());

    let user = UserOps::get_user(&pool, admin).await.unwrap().unwrap();
    assert!(user.active);
}

#[tokio::test]
async fn admin_cannot_remove_own_admin_role() {
    let pool = test_pool().await;
    let admin = UserOps::create_user(&pool, "admin@a.com", "pw123456", Role::Admin, true)
        .await
        .unwrap();

    let err = UserOps::apply_admin_edit(
        &pool,
        admin,
        admin,
        &UserUpdate {
            role: Some(Role::User),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(err.is_validation());

    let user = UserOps::get_user(&pool, admin).await.unwrap().unwrap();
    assert_eq!(user.role, Role::Admin);

    // Editing someone else stays allowed
    let other = UserOps::create_user(&pool, "user@a.com", "pw123456", Role::User, true)
        .await
        .unwrap();
    UserOps::apply_admin_edit(
        &pool,
        admin,
        other,
        &UserUpdate {
            active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(!UserOps::get_user(&pool, other).await.unwrap().unwrap().active);
}

#[tokio::test]
async fn verify_login_rejects_wrong_password_and_inactive_accounts() {
    let pool = test_pool().await;
    let uid = UserOps::create_user(&pool, "login@a.com", "pw123456", Role::User, true)
        .await
        .unwrap();

    assert!(UserOps::verify_login(&pool, "LOGIN@a.com", "pw123456")
        .await
        .unwrap()
        .is_some());
    assert!(UserOps::verify_login(&pool, "login@a.com", "wrongpass")
        .await
        .unwrap()
        .is_none());
    assert!(UserOps::verify_login(&pool, "ghost@a.com", "pw123456")
        .await
        .unwrap()
        .is_none());

    UserOps::update_user(
        &pool,
        uid,
        &UserUpdate {
            active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(UserOps::verify_login(&pool, "login@a.com", "pw123456")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn ensure_admin_seeds_exactly_once() {
    let pool = test_pool().await;
    let settings = test_settings();

    let first = UserOps::ensure_admin(&pool, &settings).await.unwrap();
    assert!(first.is_some());
    let second = UserOps::ensure_admin(&pool, &settings).await.unwrap();
    assert!(second.is_none());

    let admin = UserOps::get_user_by_email(&pool, &settings.admin_email)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert!(admin.active);
}
