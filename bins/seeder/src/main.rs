//! Database seeder for Fundline development and testing.
//!
//! Seeds a demo organization with users, an expense-category and
//! donor-fund registry, and one budget application walked through its
//! first approval, for local development against a migrated database.
//!
//! Usage: cargo run --bin seeder

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use fundline_db::entities::{
    budget_applications, donor_funds, expense_categories, organizations, sequences, users,
};
use fundline_db::repositories::{
    ApplicationRepository, ApprovalRepository, BudgetLineRepository, CreateApplicationInput,
    CreateBudgetLineInput, BUDGET_APPLICATION_SEQUENCE,
};

/// Demo organization ID (consistent for all seeds)
const DEMO_ORG_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo requester ID (consistent for all seeds)
const DEMO_REQUESTER_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Demo approver ID (consistent for all seeds)
const DEMO_APPROVER_ID: &str = "00000000-0000-0000-0000-000000000003";
/// Demo expense category ID
const DEMO_CATEGORY_ID: &str = "00000000-0000-0000-0000-000000000004";
/// Demo donor fund ID
const DEMO_FUND_ID: &str = "00000000-0000-0000-0000-000000000005";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = fundline_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding demo organization...");
    seed_demo_organization(&db).await;

    println!("Seeding demo users...");
    seed_demo_users(&db).await;

    println!("Seeding registries...");
    seed_registries(&db).await;

    println!("Seeding a walked-through budget application...");
    seed_demo_application(&db).await;

    println!("Seeding complete!");
}

fn demo_org_id() -> Uuid {
    Uuid::parse_str(DEMO_ORG_ID).unwrap()
}

fn demo_requester_id() -> Uuid {
    Uuid::parse_str(DEMO_REQUESTER_ID).unwrap()
}

fn demo_approver_id() -> Uuid {
    Uuid::parse_str(DEMO_APPROVER_ID).unwrap()
}

/// Seeds the demo organization and its reference sequence.
async fn seed_demo_organization(db: &DatabaseConnection) {
    if organizations::Entity::find_by_id(demo_org_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Demo organization already exists, skipping...");
        return;
    }

    let now = Utc::now().into();
    let org = organizations::ActiveModel {
        id: Set(demo_org_id()),
        name: Set("Fundline Demo NGO".to_string()),
        base_currency: Set("USD".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    org.insert(db).await.expect("Failed to seed organization");

    let sequence = sequences::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(demo_org_id()),
        code: Set(BUDGET_APPLICATION_SEQUENCE.to_string()),
        prefix: Set("BA/".to_string()),
        padding: Set(5),
        next_value: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    };
    sequence.insert(db).await.expect("Failed to seed sequence");
}

/// Seeds the demo requester and approver.
async fn seed_demo_users(db: &DatabaseConnection) {
    let now = Utc::now().into();

    for (id, email, name) in [
        (
            demo_requester_id(),
            "requester@fundline.dev",
            "Demo Requester",
        ),
        (demo_approver_id(), "approver@fundline.dev", "Demo Approver"),
    ] {
        if users::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  User {email} already exists, skipping...");
            continue;
        }

        let user = users::ActiveModel {
            id: Set(id),
            organization_id: Set(demo_org_id()),
            email: Set(email.to_string()),
            full_name: Set(name.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        user.insert(db).await.expect("Failed to seed user");
    }
}

/// Seeds one expense category and one donor fund.
async fn seed_registries(db: &DatabaseConnection) {
    let now = Utc::now().into();
    let category_id = Uuid::parse_str(DEMO_CATEGORY_ID).unwrap();
    let fund_id = Uuid::parse_str(DEMO_FUND_ID).unwrap();

    if expense_categories::Entity::find_by_id(category_id)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_none()
    {
        let category = expense_categories::ActiveModel {
            id: Set(category_id),
            organization_id: Set(demo_org_id()),
            code: Set("TRAVEL".to_string()),
            name: Set("Travel & Transport".to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        category
            .insert(db)
            .await
            .expect("Failed to seed expense category");
    } else {
        println!("  Expense category already exists, skipping...");
    }

    if donor_funds::Entity::find_by_id(fund_id)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_none()
    {
        let fund = donor_funds::ActiveModel {
            id: Set(fund_id),
            organization_id: Set(demo_org_id()),
            code: Set("GF-2026".to_string()),
            name: Set("General Fund 2026".to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        fund.insert(db).await.expect("Failed to seed donor fund");
    } else {
        println!("  Donor fund already exists, skipping...");
    }
}

/// Seeds one budget application with a line, submitted and approved once.
async fn seed_demo_application(db: &DatabaseConnection) {
    let existing = budget_applications::Entity::find()
        .filter(budget_applications::Column::OrganizationId.eq(demo_org_id()))
        .one(db)
        .await
        .ok()
        .flatten();
    if existing.is_some() {
        println!("  Demo application already exists, skipping...");
        return;
    }

    let app_repo = ApplicationRepository::new(db.clone());
    let app = app_repo
        .create_application(CreateApplicationInput {
            organization_id: demo_org_id(),
            reference: None,
            description: Some("Field office Q3 operating budget".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
            total_budget: Some(Decimal::new(25_000, 0)),
            currency: None,
            created_by: demo_requester_id(),
        })
        .await
        .expect("Failed to seed application");
    println!("  Created {}", app.reference);

    BudgetLineRepository::new(db.clone())
        .create_line(
            demo_org_id(),
            app.id,
            CreateBudgetLineInput {
                name: "Vehicle hire".to_string(),
                expense_category_id: Uuid::parse_str(DEMO_CATEGORY_ID).unwrap(),
                donor_fund_id: Some(Uuid::parse_str(DEMO_FUND_ID).unwrap()),
                allocated_amount: Decimal::new(12_000, 0),
                actual_spend: None,
            },
        )
        .await
        .expect("Failed to seed budget line");

    let approval_repo = ApprovalRepository::new(db.clone());
    approval_repo
        .submit(demo_org_id(), app.id)
        .await
        .expect("Failed to submit application");
    approval_repo
        .approve(
            demo_org_id(),
            app.id,
            Some("First level sign-off".to_string()),
        )
        .await
        .expect("Failed to approve application");
    println!("  Walked {} to level 2", app.reference);
}
