//! SQL schema for the Ventaro SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS profiles (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- always lowercase
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user',   -- 'admin' | 'user'
    created_at    TEXT NOT NULL,
    last_login_at TEXT
);

CREATE TABLE IF NOT EXISTS products (
    id              TEXT PRIMARY KEY,     -- internal product code
    name            TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    price           INTEGER NOT NULL,     -- minor units
    currency        TEXT NOT NULL DEFAULT 'usd',
    stripe_price_id TEXT,
    category        TEXT NOT NULL,
    is_active       INTEGER NOT NULL DEFAULT 1,
    download_file   TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

-- product_id is deliberately not a foreign key: Stripe may report products
-- this server has never heard of, and reconciliation rewrites it later.
CREATE TABLE IF NOT EXISTS purchases (
    id                TEXT PRIMARY KEY,
    user_id           TEXT REFERENCES profiles(id),
    customer_email    TEXT NOT NULL,
    product_id        TEXT NOT NULL,
    product_name      TEXT,
    stripe_session_id TEXT NOT NULL UNIQUE,
    amount            INTEGER NOT NULL,
    currency          TEXT NOT NULL,
    status            TEXT NOT NULL DEFAULT 'pending',
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS coaching_bookings (
    id             TEXT PRIMARY KEY,
    user_id        TEXT REFERENCES profiles(id),
    name           TEXT NOT NULL,
    email          TEXT NOT NULL,
    preferred_date TEXT NOT NULL,
    preferred_time TEXT NOT NULL,
    timezone       TEXT NOT NULL,
    message        TEXT,
    status         TEXT NOT NULL DEFAULT 'pending',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- Audit tables are strictly append-only.
-- No UPDATE or DELETE is ever issued against them.
CREATE TABLE IF NOT EXISTS email_logs (
    id         TEXT PRIMARY KEY,
    recipient  TEXT NOT NULL,
    subject    TEXT NOT NULL,
    kind       TEXT NOT NULL,
    status     TEXT NOT NULL,   -- 'sent' | 'failed' | 'skipped'
    error      TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS system_logs (
    id         TEXT PRIMARY KEY,
    level      TEXT NOT NULL,   -- 'info' | 'warn' | 'error'
    source     TEXT NOT NULL,
    message    TEXT NOT NULL,
    details    TEXT NOT NULL DEFAULT 'null',   -- JSON
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS purchases_user_idx    ON purchases(user_id);
CREATE INDEX IF NOT EXISTS purchases_email_idx   ON purchases(customer_email);
CREATE INDEX IF NOT EXISTS bookings_email_idx    ON coaching_bookings(email);
CREATE INDEX IF NOT EXISTS email_logs_created_idx  ON email_logs(created_at);
CREATE INDEX IF NOT EXISTS system_logs_created_idx ON system_logs(created_at);

PRAGMA user_version = 1;
";
