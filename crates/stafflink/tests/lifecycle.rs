//! End-to-end tests for the identity core: account lifecycle, employee
//! links, sessions and login, wired through `IdentityCore`.

use std::sync::Arc;
use std::time::Duration;

use stafflink::prelude::*;
use stafflink::session::SessionError;
use stafflink_types::ManualClock;
use tracing_subscriber::EnvFilter;

// =========================================================================
// Helpers
// =========================================================================

fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn cheap_config() -> StafflinkConfig {
    StafflinkConfig {
        credential: CredentialConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        },
        reaper_interval_secs: 0,
        ..StafflinkConfig::default()
    }
}

async fn core_with(config: StafflinkConfig, clock: Arc<ManualClock>) -> IdentityCore {
    init_test_tracing();
    IdentityCore::builder()
        .config(config)
        .clock(clock)
        .build()
        .await
        .unwrap()
}

async fn core() -> IdentityCore {
    core_with(cheap_config(), Arc::new(ManualClock::default())).await
}

fn admin() -> Principal {
    Principal::new("admin", RoleSet::single(Role::Admin))
}

async fn account(core: &IdentityCore, username: &str, password: &str) -> Account {
    core.create_account(
        &admin(),
        NewAccount {
            username: username.into(),
            email: format!("{username}@example.com"),
            roles: RoleSet::single(Role::User),
        },
        password,
        None,
    )
    .await
    .unwrap()
    .account
}

async fn employee(core: &IdentityCore, first: &str, last: &str) -> Employee {
    core.links()
        .create_employee(
            &admin(),
            NewEmployee {
                first_name: first.into(),
                last_name: last.into(),
                email: None,
            },
            None,
        )
        .await
        .unwrap()
        .employee
}

// =========================================================================
// Session cut-off
// =========================================================================

#[tokio::test]
async fn test_disable_with_two_sessions_cuts_off_and_blocks_login() {
    let core = core().await;
    let alice = account(&core, "alice", "alice-pw").await;
    let first = core.gateway().login("alice", "alice-pw").await.unwrap();
    core.gateway().login("alice", "alice-pw").await.unwrap();
    assert_eq!(core.count_active("alice").await, 2);

    core.state()
        .set_status(&admin(), alice.id(), false, false)
        .await
        .unwrap();

    assert_eq!(core.count_active("alice").await, 0);
    let err = core.gateway().login("alice", "alice-pw").await.unwrap_err();
    assert!(matches!(err, IdentityError::AccountDisabled(_)));
    assert!(core.gateway().resume(first.session_id()).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_session_survives_disable_racing_logins() {
    let core = Arc::new(core().await);
    let alice = account(&core, "alice", "alice-pw").await;

    let mut logins = Vec::new();
    for _ in 0..8 {
        let core = Arc::clone(&core);
        logins.push(tokio::spawn(async move {
            core.gateway().login("alice", "alice-pw").await
        }));
    }
    let disable = {
        let core = Arc::clone(&core);
        tokio::spawn(async move {
            core.state()
                .set_status(&admin(), alice.id(), false, false)
                .await
        })
    };

    for login in logins {
        // each login either succeeded before the cut-off or saw the
        // disabled account; both are fine
        let _ = login.await.unwrap();
    }
    disable.await.unwrap().unwrap();

    assert_eq!(core.count_active("alice").await, 0);
}

#[tokio::test]
async fn test_invalidate_all_twice_is_idempotent() {
    let core = core().await;
    account(&core, "alice", "alice-pw").await;
    core.gateway().login("alice", "alice-pw").await.unwrap();

    assert_eq!(core.invalidate_all("alice").await, 1);
    assert_eq!(core.count_active("alice").await, 0);
    assert_eq!(core.invalidate_all("alice").await, 0);
    assert_eq!(core.count_active("alice").await, 0);
    assert_eq!(core.invalidate_all("nobody").await, 0);
}

// =========================================================================
// Password rotation
// =========================================================================

#[tokio::test]
async fn test_password_rotation_without_flag_keeps_session_count() {
    let core = core().await;
    let alice = account(&core, "alice", "old-pw-1").await;
    let ctx = core.gateway().login("alice", "old-pw-1").await.unwrap();
    core.gateway().login("alice", "old-pw-1").await.unwrap();
    let before = core.count_active("alice").await;

    core.state()
        .set_password(&admin(), alice.id(), "new-pw-2", false)
        .await
        .unwrap();

    assert_eq!(core.count_active("alice").await, before);
    assert!(core.gateway().resume(ctx.session_id()).await.is_ok());
    assert!(matches!(
        core.gateway().login("alice", "old-pw-1").await,
        Err(IdentityError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_password_rotation_with_flag_ends_sessions() {
    let core = core().await;
    let alice = account(&core, "alice", "old-pw-1").await;
    core.gateway().login("alice", "old-pw-1").await.unwrap();

    core.state()
        .set_password(&admin(), alice.id(), "new-pw-2", true)
        .await
        .unwrap();

    assert_eq!(core.count_active("alice").await, 0);
    assert!(core.gateway().login("alice", "new-pw-2").await.is_ok());
}

// =========================================================================
// Employee links
// =========================================================================

#[tokio::test]
async fn test_second_account_cannot_take_linked_employee() {
    let core = core().await;
    let u1 = account(&core, "user1", "pw-one").await;
    let u2 = account(&core, "user2", "pw-two").await;
    let e1 = employee(&core, "Ada", "Lovelace").await;

    core.links()
        .link_employee_to_account(&admin(), u1.id(), Some(e1.id()))
        .await
        .unwrap();
    let err = core
        .links()
        .link_employee_to_account(&admin(), u2.id(), Some(e1.id()))
        .await
        .unwrap_err();

    assert!(matches!(err, IdentityError::ConflictingLink { .. }));
    let repo = core.repository();
    assert_eq!(repo.find_employee(e1.id()).await.unwrap().user_ref(), Some(u1.id()));
    assert_eq!(repo.find_by_id(u1.id()).await.unwrap().employee_ref(), Some(e1.id()));
    assert_eq!(repo.find_by_id(u2.id()).await.unwrap().employee_ref(), None);
}

#[tokio::test]
async fn test_unlinked_searches_follow_link_changes() {
    let core = core().await;
    let u1 = account(&core, "user1", "pw-one").await;
    account(&core, "user2", "pw-two").await;
    let e1 = employee(&core, "Ada", "Lovelace").await;
    employee(&core, "Alan", "Turing").await;
    let repo = core.repository();

    core.links()
        .link_account_to_employee(&admin(), e1.id(), Some(u1.id()))
        .await
        .unwrap();

    let accounts = repo.search_unlinked_accounts("user").await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].username(), "user2");
    let employees = repo.search_unlinked_employees("").await.unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0].last_name, "Turing");
}

#[tokio::test]
async fn test_delete_linked_account_releases_employee_and_login() {
    let core = core().await;
    let u1 = account(&core, "user1", "pw-one").await;
    let e1 = employee(&core, "Ada", "Lovelace").await;
    core.links()
        .link_employee_to_account(&admin(), u1.id(), Some(e1.id()))
        .await
        .unwrap();
    let ctx = core.gateway().login("user1", "pw-one").await.unwrap();

    core.links().delete_account(&admin(), u1.id()).await.unwrap();

    let e1 = core.repository().find_employee(e1.id()).await.unwrap();
    assert_eq!(e1.user_ref(), None);
    assert_eq!(core.count_active("user1").await, 0);
    assert!(core.gateway().resume(ctx.session_id()).await.is_err());
    assert!(matches!(
        core.gateway().login("user1", "pw-one").await,
        Err(IdentityError::InvalidCredentials)
    ));

    // the employee can now be taken by a new account
    let u2 = account(&core, "user2", "pw-two").await;
    core.links()
        .link_employee_to_account(&admin(), u2.id(), Some(e1.id()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_exclusive_link_after_relinks_and_deletes() {
    let core = core().await;
    let mut accounts = Vec::new();
    for name in ["user1", "user2", "user3", "user4"] {
        accounts.push(account(&core, name, "pw-xyz").await.id());
    }
    let mut employees = Vec::new();
    for (first, last) in [("Ada", "Lovelace"), ("Grace", "Hopper"), ("Alan", "Turing")] {
        employees.push(employee(&core, first, last).await.id());
    }
    let links = core.links();

    let _ = links.link_employee_to_account(&admin(), accounts[0], Some(employees[0])).await;
    let _ = links.link_account_to_employee(&admin(), employees[1], Some(accounts[1])).await;
    let _ = links.link_employee_to_account(&admin(), accounts[2], Some(employees[0])).await;
    let _ = links.link_employee_to_account(&admin(), accounts[0], Some(employees[2])).await;
    let _ = links.link_account_to_employee(&admin(), employees[0], Some(accounts[3])).await;
    let _ = links.link_account_to_employee(&admin(), employees[1], Some(accounts[0])).await;
    links.delete_employee(&admin(), employees[2]).await.unwrap();
    links.delete_account(&admin(), accounts[3]).await.unwrap();
    let _ = links.link_employee_to_account(&admin(), accounts[1], None).await;

    let repo = core.repository();
    let live_accounts = repo.search("").await.unwrap();
    let live_employees = repo.search_employees("").await.unwrap();
    assert_eq!(live_accounts.len(), 3);
    assert_eq!(live_employees.len(), 2);

    for a in &live_accounts {
        for e in &live_employees {
            assert_eq!(
                a.employee_ref() == Some(e.id()),
                e.user_ref() == Some(a.id()),
                "link sides disagree for {} / {}",
                a.id(),
                e.id()
            );
        }
        // every reference points at a live record
        if let Some(e) = a.employee_ref() {
            assert!(live_employees.iter().any(|emp| emp.id() == e));
        }
    }
    for e in &live_employees {
        if let Some(a) = e.user_ref() {
            assert!(live_accounts.iter().any(|acc| acc.id() == a));
        }
    }
}

// =========================================================================
// Session policy
// =========================================================================

#[tokio::test]
async fn test_session_cap_evicts_oldest() {
    let mut config = cheap_config();
    config.session.max_sessions_per_principal = Some(2);
    let core = core_with(config, Arc::new(ManualClock::default())).await;
    account(&core, "alice", "alice-pw").await;

    let first = core.gateway().login("alice", "alice-pw").await.unwrap();
    core.gateway().login("alice", "alice-pw").await.unwrap();
    core.gateway().login("alice", "alice-pw").await.unwrap();

    assert_eq!(core.count_active("alice").await, 2);
    let err = core.gateway().resume(first.session_id()).await.unwrap_err();
    assert!(matches!(err, IdentityError::Session(SessionError::NotFound(_))));
}

#[tokio::test]
async fn test_list_sessions_marks_idle_sessions_expired() {
    let clock = Arc::new(ManualClock::default());
    let mut config = cheap_config();
    config.session.idle_timeout_secs = 60;
    let core = core_with(config, clock.clone()).await;
    account(&core, "alice", "alice-pw").await;

    core.gateway().login("alice", "alice-pw").await.unwrap();
    clock.advance(chrono::Duration::seconds(61));
    core.gateway().login("alice", "alice-pw").await.unwrap();

    let sessions = core.list_sessions("alice").await;
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0].expired);
    assert!(!sessions[1].expired);
    assert!(sessions[0].created_at < sessions[1].created_at);
    assert_eq!(core.count_active("alice").await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reaper_removes_idle_sessions() {
    let clock = Arc::new(ManualClock::default());
    let mut config = cheap_config();
    config.session.idle_timeout_secs = 60;
    config.reaper_interval_secs = 10;
    let core = core_with(config, clock.clone()).await;
    account(&core, "alice", "alice-pw").await;
    core.gateway().login("alice", "alice-pw").await.unwrap();

    clock.advance(chrono::Duration::seconds(61));
    tokio::time::sleep(Duration::from_secs(11)).await;
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    assert!(core.list_sessions("alice").await.is_empty());
}

#[tokio::test]
async fn test_logout_then_logout_again_is_not_found() {
    let core = core().await;
    account(&core, "alice", "alice-pw").await;
    let ctx = core.gateway().login("alice", "alice-pw").await.unwrap();
    let again = ctx.clone();

    core.gateway().logout(ctx).await.unwrap();
    let err = core.gateway().logout(again).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(core.count_active("alice").await, 0);
}
