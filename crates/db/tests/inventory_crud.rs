//! Integration tests for the device, warranty and user repositories.
//!
//! - Serial number uniqueness enforced at insert
//! - Assignment and status transitions under row locks
//! - Delete guard for pending requests, warranty cascade
//! - Device-scoped warranty mutations
//! - Lockout counters

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, Utc};
use inventory_core::device_request::{RequestPriority, RequestType};
use inventory_core::error::CoreError;
use inventory_core::inventory::{DeviceCondition, DeviceLocation, DeviceStatus};
use inventory_core::lockout::LockoutPolicy;
use inventory_core::roles::{Department, Role};
use inventory_core::warranty::WarrantyType;
use inventory_db::models::device::{CreateDevice, DeviceSearch, UpdateDevice};
use inventory_db::models::device_request::CreateDeviceRequest;
use inventory_db::models::user::{CreateUser, UpdateUser, UserSearch};
use inventory_db::models::warranty::{CreateWarranty, UpdateWarranty};
use inventory_db::repositories::{
    AssignOutcome, DeleteOutcome, DeviceRepo, DeviceRequestRepo, StatusChangeOutcome,
    UpdateOutcome, UserRepo, WarrantyRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_user(username: &str, role: Role) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "not-a-real-hash".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone_number: None,
        role,
        department: Department::Tech,
    }
}

fn new_device(serial: &str) -> CreateDevice {
    CreateDevice {
        serial_number: serial.to_string(),
        manufacturer: "Lenovo".to_string(),
        model_name: "ThinkPad T14".to_string(),
        condition: DeviceCondition::New,
        location: DeviceLocation::Warehouse,
        purchase_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    }
}

fn new_warranty(code: &str) -> CreateWarranty {
    CreateWarranty {
        warranty_code: code.to_string(),
        warranty_type: WarrantyType::Standard,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2027, 1, 15).unwrap(),
        description: None,
    }
}

fn assignment_request(device_id: i64) -> CreateDeviceRequest {
    CreateDeviceRequest {
        request_type: RequestType::DeviceAssignment,
        device_id: Some(device_id),
        quantity: None,
        priority: RequestPriority::Medium,
        notes: None,
        requested_date: None,
    }
}

fn constraint_of(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|e| e.constraint())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_device_starts_available(pool: PgPool) {
    let device = DeviceRepo::create(&pool, &new_device("SN-001")).await.unwrap();
    assert_eq!(device.status, DeviceStatus::Available);
    assert_eq!(device.location, DeviceLocation::Warehouse);
    assert!(device.assigned_user_id.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_serial_number_conflicts_without_mutation(pool: PgPool) {
    let original = DeviceRepo::create(&pool, &new_device("SN-DUP")).await.unwrap();

    let mut dup = new_device("SN-DUP");
    dup.manufacturer = "Dell".to_string();
    let err = DeviceRepo::create(&pool, &dup).await.unwrap_err();
    assert_eq!(constraint_of(&err).as_deref(), Some("uq_devices_serial_number"));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM devices")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
    let stored = DeviceRepo::find_by_id(&pool, original.id).await.unwrap().unwrap();
    assert_eq!(stored.manufacturer, "Lenovo");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_to_taken_serial_number_conflicts(pool: PgPool) {
    DeviceRepo::create(&pool, &new_device("SN-A")).await.unwrap();
    let b = DeviceRepo::create(&pool, &new_device("SN-B")).await.unwrap();

    let input = UpdateDevice {
        serial_number: Some("SN-A".to_string()),
        ..Default::default()
    };
    let err = DeviceRepo::update(&pool, b.id, &input).await.unwrap_err();
    assert_eq!(constraint_of(&err).as_deref(), Some("uq_devices_serial_number"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_cannot_relocate_assigned_device(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("erin", Role::Employee)).await.unwrap();
    let device = DeviceRepo::create(&pool, &new_device("SN-REL")).await.unwrap();
    DeviceRepo::assign(&pool, device.id, user.id).await.unwrap();

    let input = UpdateDevice {
        model_name: Some("ThinkPad T16".to_string()),
        location: Some(DeviceLocation::Warehouse),
        ..Default::default()
    };
    let outcome = DeviceRepo::update(&pool, device.id, &input).await.unwrap();
    assert_matches!(outcome, UpdateOutcome::Refused(CoreError::Conflict(_)));

    let stored = DeviceRepo::find_by_id(&pool, device.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DeviceStatus::Assigned);
    assert_eq!(stored.location, DeviceLocation::WithEmployee);
    assert_eq!(stored.assigned_user_id, Some(user.id));
    assert_eq!(stored.model_name, "ThinkPad T14");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_relocates_stock_device(pool: PgPool) {
    let device = DeviceRepo::create(&pool, &new_device("SN-MOVE")).await.unwrap();

    let to_employee = UpdateDevice {
        location: Some(DeviceLocation::WithEmployee),
        ..Default::default()
    };
    let outcome = DeviceRepo::update(&pool, device.id, &to_employee).await.unwrap();
    assert_matches!(outcome, UpdateOutcome::Refused(CoreError::Validation(_)));

    let to_office = UpdateDevice {
        location: Some(DeviceLocation::OfficeHq),
        ..Default::default()
    };
    let outcome = DeviceRepo::update(&pool, device.id, &to_office).await.unwrap();
    let moved = assert_matches!(outcome, UpdateOutcome::Updated(d) => d);
    assert_eq!(moved.location, DeviceLocation::OfficeHq);
    assert_eq!(moved.status, DeviceStatus::Available);

    let missing = DeviceRepo::update(&pool, 999_999, &to_office).await.unwrap();
    assert_matches!(missing, UpdateOutcome::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_filters_by_serial_and_status(pool: PgPool) {
    DeviceRepo::create(&pool, &new_device("LAP-100")).await.unwrap();
    DeviceRepo::create(&pool, &new_device("LAP-200")).await.unwrap();
    let other = DeviceRepo::create(&pool, &new_device("MON-100")).await.unwrap();
    DeviceRepo::change_status(&pool, other.id, DeviceStatus::Maintenance)
        .await
        .unwrap();

    let laptops = DeviceRepo::search(
        &pool,
        &DeviceSearch {
            serial_number: Some("lap".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(laptops.len(), 2);

    let in_maintenance = DeviceRepo::search(
        &pool,
        &DeviceSearch {
            status: Some(DeviceStatus::Maintenance),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(in_maintenance.len(), 1);
    assert_eq!(in_maintenance[0].serial_number, "MON-100");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_assign_sets_placement(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("alice", Role::Employee)).await.unwrap();
    let device = DeviceRepo::create(&pool, &new_device("SN-001")).await.unwrap();

    let outcome = DeviceRepo::assign(&pool, device.id, user.id).await.unwrap();
    let assigned = assert_matches!(outcome, AssignOutcome::Assigned(d) => d);
    assert_eq!(assigned.status, DeviceStatus::Assigned);
    assert_eq!(assigned.location, DeviceLocation::WithEmployee);
    assert_eq!(assigned.assigned_user_id, Some(user.id));

    let again = DeviceRepo::assign(&pool, device.id, user.id).await.unwrap();
    assert_matches!(again, AssignOutcome::Refused(CoreError::Conflict(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_assign_rejects_missing_or_inactive_user(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("bob", Role::Employee)).await.unwrap();
    let device = DeviceRepo::create(&pool, &new_device("SN-002")).await.unwrap();

    assert_matches!(
        DeviceRepo::assign(&pool, device.id, 999_999).await.unwrap(),
        AssignOutcome::UserNotFound
    );
    assert_matches!(
        DeviceRepo::assign(&pool, 999_999, user.id).await.unwrap(),
        AssignOutcome::DeviceNotFound
    );

    UserRepo::deactivate(&pool, user.id).await.unwrap();
    assert_matches!(
        DeviceRepo::assign(&pool, device.id, user.id).await.unwrap(),
        AssignOutcome::UserInactive
    );
    let stored = DeviceRepo::find_by_id(&pool, device.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DeviceStatus::Available);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_status_change_returns_device_to_warehouse(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("carol", Role::Employee)).await.unwrap();
    let device = DeviceRepo::create(&pool, &new_device("SN-003")).await.unwrap();
    DeviceRepo::assign(&pool, device.id, user.id).await.unwrap();

    let outcome = DeviceRepo::change_status(&pool, device.id, DeviceStatus::Available)
        .await
        .unwrap();
    let returned = assert_matches!(outcome, StatusChangeOutcome::Changed(d) => d);
    assert_eq!(returned.status, DeviceStatus::Available);
    assert_eq!(returned.location, DeviceLocation::Warehouse);
    assert!(returned.assigned_user_id.is_none());

    let same = DeviceRepo::change_status(&pool, device.id, DeviceStatus::Available)
        .await
        .unwrap();
    assert_matches!(same, StatusChangeOutcome::Refused(CoreError::Conflict(_)));

    let missing = DeviceRepo::change_status(&pool, 999_999, DeviceStatus::Maintenance)
        .await
        .unwrap();
    assert_matches!(missing, StatusChangeOutcome::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_blocked_by_pending_request(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("dave", Role::Employee)).await.unwrap();
    let device = DeviceRepo::create(&pool, &new_device("SN-004")).await.unwrap();
    let request = DeviceRequestRepo::create(&pool, user.id, &assignment_request(device.id))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        DeviceRepo::delete(&pool, device.id).await.unwrap(),
        DeleteOutcome::PendingRequests(1)
    );

    DeviceRequestRepo::delete(&pool, request.id).await.unwrap();
    assert_eq!(DeviceRepo::delete(&pool, device.id).await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(DeviceRepo::delete(&pool, device.id).await.unwrap(), DeleteOutcome::NotFound);
}

// ---------------------------------------------------------------------------
// Warranties
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_warranties_cascade_with_device(pool: PgPool) {
    let device = DeviceRepo::create(&pool, &new_device("SN-W1")).await.unwrap();
    let warranty = WarrantyRepo::create(&pool, device.id, &new_warranty("W-001"))
        .await
        .unwrap()
        .unwrap();

    DeviceRepo::delete(&pool, device.id).await.unwrap();
    assert!(WarrantyRepo::find_by_id(&pool, warranty.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_warranty_on_missing_device_is_not_created(pool: PgPool) {
    let created = WarrantyRepo::create(&pool, 999_999, &new_warranty("W-404")).await.unwrap();
    assert!(created.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_warranty_mutations_are_scoped_to_device(pool: PgPool) {
    let a = DeviceRepo::create(&pool, &new_device("SN-WA")).await.unwrap();
    let b = DeviceRepo::create(&pool, &new_device("SN-WB")).await.unwrap();
    let warranty = WarrantyRepo::create(&pool, a.id, &new_warranty("W-A"))
        .await
        .unwrap()
        .unwrap();

    let input = UpdateWarranty {
        description: Some("moved".to_string()),
        ..Default::default()
    };
    assert!(WarrantyRepo::update(&pool, b.id, warranty.id, &input)
        .await
        .unwrap()
        .is_none());
    assert!(!WarrantyRepo::delete(&pool, b.id, warranty.id).await.unwrap());

    let updated = WarrantyRepo::update(&pool, a.id, warranty.id, &input)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("moved"));
    assert!(WarrantyRepo::delete(&pool, a.id, warranty.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_warranty_code_conflicts(pool: PgPool) {
    let device = DeviceRepo::create(&pool, &new_device("SN-W2")).await.unwrap();
    WarrantyRepo::create(&pool, device.id, &new_warranty("W-DUP"))
        .await
        .unwrap();
    let err = WarrantyRepo::create(&pool, device.id, &new_warranty("W-DUP"))
        .await
        .unwrap_err();
    assert_eq!(constraint_of(&err).as_deref(), Some("uq_warranties_warranty_code"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inverted_warranty_period_rejected_by_schema(pool: PgPool) {
    let device = DeviceRepo::create(&pool, &new_device("SN-W3")).await.unwrap();
    let mut input = new_warranty("W-BAD");
    input.start_date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    input.end_date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let err = WarrantyRepo::create(&pool, device.id, &input).await.unwrap_err();
    assert_eq!(constraint_of(&err).as_deref(), Some("ck_warranties_period"));
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_username_conflicts(pool: PgPool) {
    UserRepo::create(&pool, &new_user("erin", Role::Employee)).await.unwrap();
    let mut dup = new_user("erin", Role::Admin);
    dup.email = "other@example.com".to_string();
    let err = UserRepo::create(&pool, &dup).await.unwrap_err();
    assert_eq!(constraint_of(&err).as_deref(), Some("uq_users_username"));
    assert!(UserRepo::username_exists(&pool, "erin").await.unwrap());
    assert!(!UserRepo::email_exists(&pool, "nobody@example.com").await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_users_by_role_and_text(pool: PgPool) {
    UserRepo::create(&pool, &new_user("frank", Role::Employee)).await.unwrap();
    UserRepo::create(&pool, &new_user("grace", Role::Admin)).await.unwrap();
    UserRepo::create(&pool, &new_user("franny", Role::Admin)).await.unwrap();

    let employees = UserRepo::search(
        &pool,
        &UserSearch {
            role: Some(Role::Employee),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0].username, "frank");

    let fran = UserRepo::search(
        &pool,
        &UserSearch {
            search: Some("FRAN".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(fran.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_and_deactivate_user(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("heidi", Role::Employee)).await.unwrap();
    let input = UpdateUser {
        department: Some(Department::Finance),
        ..Default::default()
    };
    let updated = UserRepo::update(&pool, user.id, &input).await.unwrap().unwrap();
    assert_eq!(updated.department, Department::Finance);
    assert_eq!(updated.role, Role::Employee);

    assert!(UserRepo::deactivate(&pool, user.id).await.unwrap());
    assert!(!UserRepo::deactivate(&pool, user.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lockout_after_five_failures_and_recovery(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("ivan", Role::Employee)).await.unwrap();
    let policy = LockoutPolicy::default();
    let now = Utc::now();

    let mut last = None;
    for _ in 0..5 {
        last = UserRepo::record_failed_login(&pool, user.id, &policy, now)
            .await
            .unwrap();
    }
    let counters = last.unwrap();
    assert_eq!(counters.failed_login_count, 5);
    let until = counters.locked_until.unwrap();
    assert_eq!(until, now + Duration::minutes(60));

    // Still locked: the success write is refused.
    let refused = UserRepo::record_successful_login(&pool, user.id, now + Duration::minutes(1))
        .await
        .unwrap();
    assert!(refused.is_none());

    // After the window elapses the success resets the counters.
    let later = until + Duration::seconds(1);
    let user = UserRepo::record_successful_login(&pool, user.id, later)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.failed_login_count, 0);
    assert!(user.locked_until.is_none());
    assert!(user.last_login_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failure_after_expired_lock_starts_fresh_window(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("judy", Role::Employee)).await.unwrap();
    let policy = LockoutPolicy::default();
    let now = Utc::now();

    for _ in 0..5 {
        UserRepo::record_failed_login(&pool, user.id, &policy, now)
            .await
            .unwrap();
    }
    let after = now + Duration::minutes(61);
    let counters = UserRepo::record_failed_login(&pool, user.id, &policy, after)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(counters.failed_login_count, 1);
    assert!(counters.locked_until.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_failures_are_all_counted(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("ken", Role::Employee)).await.unwrap();
    let policy = LockoutPolicy::default();
    let now = Utc::now();

    let (a, b, c) = tokio::join!(
        UserRepo::record_failed_login(&pool, user.id, &policy, now),
        UserRepo::record_failed_login(&pool, user.id, &policy, now),
        UserRepo::record_failed_login(&pool, user.id, &policy, now),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let stored = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_count, 3);
}
