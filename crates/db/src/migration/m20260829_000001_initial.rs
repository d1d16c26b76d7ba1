//! Initial database migration.
//!
//! Creates all tables, enums, and triggers for the budget application
//! approval workflow, plus the seeded currency reference data.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: DIRECTORY TABLES
        // ============================================================
        db.execute_unprepared(CURRENCIES_SQL).await?;
        db.execute_unprepared(ORGANIZATIONS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(SEQUENCES_SQL).await?;

        // ============================================================
        // PART 3: REGISTRIES
        // ============================================================
        db.execute_unprepared(EXPENSE_CATEGORIES_SQL).await?;
        db.execute_unprepared(DONOR_FUNDS_SQL).await?;

        // ============================================================
        // PART 4: BUDGET APPLICATIONS & CHILDREN
        // ============================================================
        db.execute_unprepared(BUDGET_APPLICATIONS_SQL).await?;
        db.execute_unprepared(APPROVAL_LINES_SQL).await?;
        db.execute_unprepared(BUDGET_LINES_SQL).await?;
        db.execute_unprepared(FOLLOWERS_SQL).await?;
        db.execute_unprepared(STAGE_EVENTS_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        // ============================================================
        // PART 6: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_CURRENCIES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// PART 1: ENUMS
// ============================================================
const ENUMS_SQL: &str = r"
CREATE TYPE application_status AS ENUM ('draft', 'approved', 'rejected');
CREATE TYPE approval_stage AS ENUM ('draft', 'level_1', 'level_2', 'level_3', 'approved', 'rejected');
CREATE TYPE approval_line_status AS ENUM ('pending', 'approved', 'rejected');
";

const CURRENCIES_SQL: &str = r"
CREATE TABLE currencies (
    code CHAR(3) PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    symbol VARCHAR(10) NOT NULL,
    decimal_places SMALLINT NOT NULL DEFAULT 2,
    is_active BOOLEAN NOT NULL DEFAULT true,
    CONSTRAINT chk_currency_code CHECK (code ~ '^[A-Z]{3}$'),
    CONSTRAINT chk_decimal_places CHECK (decimal_places BETWEEN 0 AND 4)
);
";

const ORGANIZATIONS_SQL: &str = r"
CREATE TABLE organizations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    base_currency CHAR(3) NOT NULL REFERENCES currencies(code),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_users_org ON users(organization_id);
";

const SEQUENCES_SQL: &str = r"
CREATE TABLE sequences (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    code VARCHAR(100) NOT NULL,
    prefix VARCHAR(20) NOT NULL DEFAULT '',
    padding INTEGER NOT NULL DEFAULT 5,
    next_value BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id, code)
);
";

const EXPENSE_CATEGORIES_SQL: &str = r"
CREATE TABLE expense_categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    code VARCHAR(50) NOT NULL,
    name VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id, code)
);
";

const DONOR_FUNDS_SQL: &str = r"
CREATE TABLE donor_funds (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    code VARCHAR(50) NOT NULL,
    name VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (organization_id, code)
);
";

const BUDGET_APPLICATIONS_SQL: &str = r"
CREATE TABLE budget_applications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    reference VARCHAR(100) NOT NULL,
    description TEXT,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    total_budget NUMERIC(19, 4) NOT NULL DEFAULT 0,
    currency CHAR(3) NOT NULL REFERENCES currencies(code),
    status application_status NOT NULL DEFAULT 'draft',
    approval_stage approval_stage NOT NULL DEFAULT 'draft',
    current_approver_id UUID REFERENCES users(id),
    created_by UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_budget_applications_org ON budget_applications(organization_id);
CREATE INDEX idx_budget_applications_stage ON budget_applications(organization_id, approval_stage);
CREATE INDEX idx_budget_applications_reference ON budget_applications(reference);
";

const APPROVAL_LINES_SQL: &str = r"
CREATE TABLE approval_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    budget_application_id UUID NOT NULL REFERENCES budget_applications(id) ON DELETE CASCADE,
    level VARCHAR(10) NOT NULL,
    status approval_line_status NOT NULL DEFAULT 'pending',
    approver_id UUID REFERENCES users(id),
    approval_date DATE,
    comments TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (budget_application_id, level)
);

CREATE INDEX idx_approval_lines_app ON approval_lines(budget_application_id);
CREATE INDEX idx_approval_lines_pending ON approval_lines(budget_application_id) WHERE status = 'pending';
";

const BUDGET_LINES_SQL: &str = r"
CREATE TABLE budget_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    budget_application_id UUID NOT NULL REFERENCES budget_applications(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    expense_category_id UUID NOT NULL REFERENCES expense_categories(id),
    donor_fund_id UUID REFERENCES donor_funds(id),
    allocated_amount NUMERIC(19, 4) NOT NULL,
    actual_spend NUMERIC(19, 4) NOT NULL DEFAULT 0,
    variance NUMERIC(19, 4) NOT NULL,
    currency CHAR(3) NOT NULL REFERENCES currencies(code),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_budget_lines_app ON budget_lines(budget_application_id);
";

const FOLLOWERS_SQL: &str = r"
CREATE TABLE followers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    budget_application_id UUID NOT NULL REFERENCES budget_applications(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (budget_application_id, user_id)
);
";

const STAGE_EVENTS_SQL: &str = r"
CREATE TABLE stage_events (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    budget_application_id UUID NOT NULL REFERENCES budget_applications(id) ON DELETE CASCADE,
    from_stage approval_stage NOT NULL,
    to_stage approval_stage NOT NULL,
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_stage_events_app ON stage_events(budget_application_id, created_at);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_resolved_line_modification
-- An approval line is resolved exactly once; any UPDATE to a row
-- whose status is no longer 'pending' is rejected at the schema level.
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_resolved_line_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.status <> 'pending' THEN
        RAISE EXCEPTION 'Approval line % is already % and cannot be modified',
            OLD.id, OLD.status;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_resolved_line_mod
BEFORE UPDATE ON approval_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_resolved_line_modification();
";

const SEED_CURRENCIES_SQL: &str = r"
INSERT INTO currencies (code, name, symbol, decimal_places) VALUES
    ('USD', 'US Dollar', '$', 2),
    ('EUR', 'Euro', '€', 2),
    ('GBP', 'British Pound', '£', 2),
    ('KES', 'Kenyan Shilling', 'KSh', 2),
    ('NGN', 'Nigerian Naira', '₦', 2),
    ('INR', 'Indian Rupee', '₹', 2),
    ('JPY', 'Japanese Yen', '¥', 0);
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

-- Drop triggers
DROP TRIGGER IF EXISTS trg_prevent_resolved_line_mod ON approval_lines;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_resolved_line_modification();

-- Drop tables (children first)
DROP TABLE IF EXISTS stage_events CASCADE;
DROP TABLE IF EXISTS followers CASCADE;
DROP TABLE IF EXISTS budget_lines CASCADE;
DROP TABLE IF EXISTS approval_lines CASCADE;
DROP TABLE IF EXISTS budget_applications CASCADE;
DROP TABLE IF EXISTS donor_funds CASCADE;
DROP TABLE IF EXISTS expense_categories CASCADE;
DROP TABLE IF EXISTS sequences CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS organizations CASCADE;
DROP TABLE IF EXISTS currencies CASCADE;

-- Drop enums
DROP TYPE IF EXISTS approval_line_status;
DROP TYPE IF EXISTS approval_stage;
DROP TYPE IF EXISTS application_status;
";
