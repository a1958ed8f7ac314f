use super::{Migration, SimpleSqlMigration};

pub(super) fn migration() -> impl Migration {
    SimpleSqlMigration {
        serial_number: 0,
        sql: vec![
            r#"
            CREATE TABLE users (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
            r#"
            CREATE TABLE auth_tokens (
                id UUID PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users ON DELETE CASCADE,
                token_hash TEXT UNIQUE NOT NULL,
                can_read BOOLEAN NOT NULL,
                can_write BOOLEAN NOT NULL,
                created TIMESTAMP WITH TIME ZONE NOT NULL,
                expires TIMESTAMP WITH TIME ZONE,
                disabled TIMESTAMP WITH TIME ZONE
            )"#,
            r#"
            CREATE TABLE expenses (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users ON DELETE CASCADE,
                name TEXT NOT NULL,
                tag TEXT NOT NULL,
                amount NUMERIC(12,2) NOT NULL CHECK (amount > 0),
                expense_date DATE NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT now()
            )"#,
            r#"CREATE INDEX expense_user_date ON expenses (user_id, expense_date DESC, id DESC)"#,
            // The link to the last generated expense is a plain reference: deleting either side
            // never cascades, the expense deletion clears the link first.
            r#"
            CREATE TABLE monthly_expenses (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users ON DELETE CASCADE,
                name TEXT NOT NULL,
                tag TEXT NOT NULL,
                amount NUMERIC(12,2) NOT NULL CHECK (amount > 0),
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT now(),
                last_applied_at TIMESTAMP WITH TIME ZONE,
                last_applied_expense_id BIGINT REFERENCES expenses (id),
                CHECK ((last_applied_at IS NULL) = (last_applied_expense_id IS NULL))
            )"#,
            r#"CREATE INDEX monthly_expense_user ON monthly_expenses (user_id)"#,
            r#"CREATE INDEX monthly_expense_last_applied ON monthly_expenses (last_applied_expense_id)"#,
        ],
    }
}
