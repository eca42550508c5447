use clinic_booking_api::{
    config::AppConfig,
    db::create_pool,
    models::Role,
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin12345", Role::Admin).await?;
    ensure_user(&pool, "reception@example.com", "reception123", Role::Receptionist).await?;
    let doctor_user = ensure_user(&pool, "doctor@example.com", "doctor12345", Role::Doctor).await?;
    let patient_user = ensure_user(&pool, "patient@example.com", "patient12345", Role::Patient).await?;

    let clinic_id = ensure_clinic(&pool, "Downtown Family Clinic").await?;
    let doctor_id = ensure_doctor(&pool, doctor_user, clinic_id).await?;
    let patient_id = ensure_patient(&pool, patient_user, clinic_id).await?;

    println!(
        "Seed completed. Admin ID: {admin_id}, Clinic ID: {clinic_id}, Doctor ID: {doctor_id}, Patient ID: {patient_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_clinic(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let (clinic_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO clinics (id, name, address, phone)
        VALUES ($1, $2, '12 Harbour Road', '+1-555-0100')
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(clinic_id)
}

async fn ensure_doctor(pool: &sqlx::PgPool, user_id: Uuid, clinic_id: Uuid) -> anyhow::Result<Uuid> {
    let (doctor_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO doctors (id, user_id, clinic_id, full_name, specialization)
        VALUES ($1, $2, $3, 'Dr. Amina Okafor', 'General Practice')
        ON CONFLICT (user_id) DO UPDATE SET clinic_id = EXCLUDED.clinic_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(clinic_id)
    .fetch_one(pool)
    .await?;
    Ok(doctor_id)
}

async fn ensure_patient(pool: &sqlx::PgPool, user_id: Uuid, clinic_id: Uuid) -> anyhow::Result<Uuid> {
    let (patient_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO patients (id, user_id, clinic_id, full_name, date_of_birth, phone)
        VALUES ($1, $2, $3, 'Jordan Reyes', '1990-04-18', '+1-555-0142')
        ON CONFLICT (user_id) DO UPDATE SET clinic_id = EXCLUDED.clinic_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(clinic_id)
    .fetch_one(pool)
    .await?;
    Ok(patient_id)
}
