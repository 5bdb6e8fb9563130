//! Seed script for development: populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` (reads .env). The sample data yields a dashboard of
//! 100 users, 40 completed profiles (40%), 25 chatbot leads, 10 form
//! submissions and 5 pending workflow steps.

use growth_hub::models::user::UserRole;
use growth_hub::services::auth::hash_password;
use sqlx::PgPool;

const ADMIN_EMAIL: &str = "admin@growthhub.local";
const ADMIN_PASSWORD: &str = "Test123!";
const MARKETER_EMAIL: &str = "marketer@growthhub.local";
const MARKETER_PASSWORD: &str = "marketer123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let db_url = std::env::var("DATABASE_URL")?;
    let pool = growth_hub::db::create_pool(&db_url, 5).await?;

    growth_hub::db::run_migrations(&pool).await?;

    println!("=== Growth Hub Seed Script ===");

    seed_user(&pool, ADMIN_EMAIL, ADMIN_PASSWORD, "Platform Administrator", UserRole::Admin).await?;
    seed_user(&pool, MARKETER_EMAIL, MARKETER_PASSWORD, "Growth Marketer", UserRole::Marketer).await?;
    seed_profiles(&pool).await?;
    seed_leads_and_workflows(&pool).await?;

    println!("\n=== Seed complete! ===");
    println!("Admin login: {ADMIN_EMAIL} / {ADMIN_PASSWORD}");

    Ok(())
}

async fn seed_user(
    pool: &PgPool,
    email: &str,
    password: &str,
    display_name: &str,
    role: UserRole,
) -> anyhow::Result<()> {
    let hash = hash_password(password)?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await?;

    if exists {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE email = $2")
            .bind(&hash)
            .bind(email)
            .execute(pool)
            .await?;
        println!("[done] Updated password for {email}");
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO users (email, password_hash, display_name, role) VALUES ($1, $2, $3, $4)",
    )
    .bind(email)
    .bind(&hash)
    .bind(display_name)
    .bind(role)
    .execute(pool)
    .await?;

    println!("[done] Created {} user {email}", role.as_str());
    Ok(())
}

async fn seed_profiles(pool: &PgPool) -> anyhow::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        println!("[skip] {count} profiles already present");
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO profiles (email, full_name, profile_completed)
        SELECT
            'learner' || n || '@example.com',
            'Learner ' || n,
            n <= 40
        FROM generate_series(1, 100) AS n
        "#,
    )
    .execute(pool)
    .await?;

    println!("[done] Created 100 profiles (40 completed)");
    Ok(())
}

async fn seed_leads_and_workflows(pool: &PgPool) -> anyhow::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        println!("[skip] {count} leads already present");
        return Ok(());
    }

    for (source, n) in [("chatbot", 25), ("form", 10), ("referral", 4)] {
        sqlx::query(
            r#"
            INSERT INTO leads (name, email, source)
            SELECT 'Lead ' || n, $1 || n || '@example.com', $1
            FROM generate_series(1, $2) AS n
            "#,
        )
        .bind(source)
        .bind(n)
        .execute(pool)
        .await?;
        println!("[done] Created {n} {source} leads");
    }

    for (status, n) in [("pending", 5), ("completed", 12), ("failed", 2)] {
        sqlx::query(
            r#"
            INSERT INTO workflow_steps (lead_id, channel, status, scheduled_at)
            SELECT id, 'email', $1, NOW() + INTERVAL '1 day'
            FROM leads
            ORDER BY created_at, id
            LIMIT $2
            "#,
        )
        .bind(status)
        .bind(n as i64)
        .execute(pool)
        .await?;
        println!("[done] Created {n} {status} workflow steps");
    }

    Ok(())
}
