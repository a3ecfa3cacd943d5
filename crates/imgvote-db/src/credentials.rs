use sqlx::PgPool;

/// Stored password for an account ("student", "admin")
pub async fn get_password(pool: &PgPool, account: &str) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT password FROM credentials WHERE account = $1 LIMIT 1")
            .bind(account)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|r| r.0))
}

/// Create or replace an account's password
pub async fn set_password(pool: &PgPool, account: &str, password: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO credentials (account, password)
        VALUES ($1, $2)
        ON CONFLICT (account) DO UPDATE SET
            password = $2,
            updated_at = NOW()
        "#,
    )
    .bind(account)
    .bind(password)
    .execute(pool)
    .await?;
    Ok(())
}
