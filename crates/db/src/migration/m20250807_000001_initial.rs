//! Initial database migration.
//!
//! Creates the enums, tables, indexes, and `updated_at` triggers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(MILK_RATES_SQL).await?;
        db.execute_unprepared(MILK_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('admin', 'seller', 'buyer');

CREATE TYPE milk_type AS ENUM ('cow', 'buffalo');

CREATE TYPE delivery_session AS ENUM ('morning', 'evening');

CREATE TYPE transaction_status AS ENUM ('pending', 'delivered', 'cancelled');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    mobile VARCHAR(20) NOT NULL UNIQUE,
    email VARCHAR(255),
    password_hash VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'seller',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    opening_pending_amount DECIMAL(10, 2) NOT NULL DEFAULT 0,
    pending_amount DECIMAL(10, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_users_role ON users (role);
";

const MILK_RATES_SQL: &str = r"
CREATE TABLE milk_rates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    milk_type milk_type NOT NULL,
    delivery_session delivery_session,
    price_per_unit DECIMAL(10, 2) NOT NULL CHECK (price_per_unit >= 0),
    effective_from DATE NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- The rate key. NULLS NOT DISTINCT makes the catch-all (NULL session) row
-- unique per (milk_type, effective_from) as well.
CREATE UNIQUE INDEX ux_milk_rates_key
    ON milk_rates (milk_type, delivery_session, effective_from)
    NULLS NOT DISTINCT;

CREATE INDEX idx_milk_rates_type_effective ON milk_rates (milk_type, effective_from);
";

const MILK_TRANSACTIONS_SQL: &str = r"
CREATE TABLE milk_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    seller_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    buyer_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    date DATE NOT NULL,
    quantity DECIMAL(10, 2) NOT NULL DEFAULT 0,
    unit VARCHAR(10) NOT NULL DEFAULT 'L',
    status transaction_status NOT NULL DEFAULT 'delivered',
    delivery_session delivery_session NOT NULL DEFAULT 'morning',
    milk_type milk_type NOT NULL DEFAULT 'cow',
    remarks TEXT,
    price_per_unit DECIMAL(10, 2),
    total_amount DECIMAL(10, 2),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_milk_transactions_seller_buyer_date
    ON milk_transactions (seller_id, buyer_id, date);

CREATE INDEX idx_milk_transactions_buyer_status_date
    ON milk_transactions (buyer_id, status, date);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER users_set_updated_at
    BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER milk_rates_set_updated_at
    BEFORE UPDATE ON milk_rates
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER milk_transactions_set_updated_at
    BEFORE UPDATE ON milk_transactions
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS milk_transactions;
DROP TABLE IF EXISTS milk_rates;
DROP TABLE IF EXISTS users;
DROP FUNCTION IF EXISTS set_updated_at();
DROP TYPE IF EXISTS transaction_status;
DROP TYPE IF EXISTS milk_type;
DROP TYPE IF EXISTS delivery_session;
DROP TYPE IF EXISTS user_role;
";
