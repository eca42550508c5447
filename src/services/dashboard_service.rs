use chrono::{Datelike, Duration, Months, NaiveDate};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::dashboard::{
        AppointmentsData, DailyCount, DashboardQuery, DashboardStats, MonthlyRevenue,
        RecentAppointments, RevenueData, StatusCount,
    },
    entity::appointments::{Column as AptCol, Entity as Appointments},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_staff},
    models::AppointmentStatus,
    response::{ApiResponse, Meta},
    services::{appointment_service::appointment_from_entity, slots::local_midnight},
    state::AppState,
};

pub const ACTIVE_PATIENT_WINDOW_DAYS: i64 = 30;
pub const REVENUE_WINDOW_DAYS: i64 = 7;
pub const CHART_DAYS: i64 = 7;
pub const REVENUE_MONTHS: u32 = 6;
pub const RECENT_LIMIT: u64 = 5;

// `$n::uuid IS NULL OR ...` keeps the optional filters in one prepared statement.
const APPOINTMENT_FILTERS: &str =
    "($3::uuid IS NULL OR doctor_id = $3) AND ($4::uuid IS NULL OR clinic_id = $4)";
const INVOICE_FILTERS: &str = "($2::uuid IS NULL OR appointment_id IN \
     (SELECT appointment_id FROM appointments WHERE doctor_id = $2)) \
     AND ($3::uuid IS NULL OR clinic_id = $3)";

pub async fn stats(
    state: &AppState,
    user: &AuthUser,
    query: DashboardQuery,
    today: NaiveDate,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_staff(user)?;
    let tomorrow = today + Duration::days(1);

    let (todays_appointments,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM appointments \
         WHERE appointment_date >= $1 AND appointment_date < $2 AND {APPOINTMENT_FILTERS}"
    ))
    .bind(today)
    .bind(tomorrow)
    .bind(query.doctor_id)
    .bind(query.clinic_id)
    .fetch_one(&state.pool)
    .await?;

    let (active_patients,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(DISTINCT patient_id) FROM appointments \
         WHERE appointment_date >= $1 AND appointment_date <= $2 AND {APPOINTMENT_FILTERS}"
    ))
    .bind(window_start(today, ACTIVE_PATIENT_WINDOW_DAYS))
    .bind(today)
    .bind(query.doctor_id)
    .bind(query.clinic_id)
    .fetch_one(&state.pool)
    .await?;

    let (weekly_revenue,): (i64,) = sqlx::query_as(&format!(
        "SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM invoices \
         WHERE issued_at >= $1 AND {INVOICE_FILTERS}"
    ))
    .bind(local_midnight(window_start(today, REVENUE_WINDOW_DAYS)))
    .bind(query.doctor_id)
    .bind(query.clinic_id)
    .fetch_one(&state.pool)
    .await?;

    let (pending_invoices,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM invoices WHERE status = $1 AND {INVOICE_FILTERS}"
    ))
    .bind("Pending")
    .bind(query.doctor_id)
    .bind(query.clinic_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Dashboard stats",
        DashboardStats {
            todays_appointments,
            active_patients,
            weekly_revenue,
            pending_invoices,
        },
        Some(Meta::empty()),
    ))
}

pub async fn appointments_data(
    state: &AppState,
    user: &AuthUser,
    query: DashboardQuery,
    today: NaiveDate,
) -> AppResult<ApiResponse<AppointmentsData>> {
    ensure_staff(user)?;
    let start = window_start(today, CHART_DAYS);

    let daily_rows: Vec<(NaiveDate, i64)> = sqlx::query_as(&format!(
        "SELECT appointment_date, COUNT(*) FROM appointments \
         WHERE appointment_date >= $1 AND appointment_date <= $2 AND {APPOINTMENT_FILTERS} \
         GROUP BY appointment_date ORDER BY appointment_date"
    ))
    .bind(start)
    .bind(today)
    .bind(query.doctor_id)
    .bind(query.clinic_id)
    .fetch_all(&state.pool)
    .await?;

    let status_rows: Vec<(String, i64)> = sqlx::query_as(&format!(
        "SELECT status, COUNT(*) FROM appointments \
         WHERE appointment_date >= $1 AND appointment_date <= $2 AND {APPOINTMENT_FILTERS} \
         GROUP BY status"
    ))
    .bind(start)
    .bind(today)
    .bind(query.doctor_id)
    .bind(query.clinic_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Appointments data",
        AppointmentsData {
            daily: fill_daily(start, CHART_DAYS, &daily_rows),
            by_status: fill_status_counts(&status_rows),
        },
        Some(Meta::empty()),
    ))
}

pub async fn revenue_data(
    state: &AppState,
    user: &AuthUser,
    query: DashboardQuery,
    today: NaiveDate,
) -> AppResult<ApiResponse<RevenueData>> {
    ensure_staff(user)?;
    let months = month_starts(today, REVENUE_MONTHS);
    let Some(first) = months.first().copied() else {
        return Ok(ApiResponse::success(
            "Revenue data",
            RevenueData { months: Vec::new() },
            Some(Meta::empty()),
        ));
    };

    let rows: Vec<(NaiveDate, i64, i64)> = sqlx::query_as(&format!(
        "SELECT date_trunc('month', issued_at)::date AS month, \
                COALESCE(SUM(total_amount), 0)::BIGINT, \
                COALESCE(SUM(paid_amount), 0)::BIGINT \
         FROM invoices WHERE issued_at >= $1 AND {INVOICE_FILTERS} \
         GROUP BY 1 ORDER BY 1"
    ))
    .bind(local_midnight(first))
    .bind(query.doctor_id)
    .bind(query.clinic_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Revenue data",
        RevenueData {
            months: fill_monthly(&months, &rows),
        },
        Some(Meta::empty()),
    ))
}

pub async fn recent_appointments(
    state: &AppState,
    user: &AuthUser,
    query: DashboardQuery,
) -> AppResult<ApiResponse<RecentAppointments>> {
    ensure_staff(user)?;
    let mut condition = Condition::all();
    if let Some(doctor_id) = query.doctor_id {
        condition = condition.add(AptCol::DoctorId.eq(doctor_id));
    }
    if let Some(clinic_id) = query.clinic_id {
        condition = condition.add(AptCol::ClinicId.eq(clinic_id));
    }

    let items = Appointments::find()
        .filter(condition)
        .order_by_desc(AptCol::CreatedAt)
        .limit(RECENT_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(appointment_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Recent appointments",
        RecentAppointments { items },
        Some(Meta::empty()),
    ))
}

/// First day of a `days`-long window that ends with (and includes) `today`.
pub fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days - 1)
}

/// One entry per day from `start`, zero where the query returned no row.
pub fn fill_daily(start: NaiveDate, days: i64, rows: &[(NaiveDate, i64)]) -> Vec<DailyCount> {
    (0..days)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let count = rows
                .iter()
                .find(|(d, _)| *d == date)
                .map(|(_, c)| *c)
                .unwrap_or(0);
            DailyCount { date, count }
        })
        .collect()
}

/// Every status in lifecycle order; unknown statuses from the database are ignored.
pub fn fill_status_counts(rows: &[(String, i64)]) -> Vec<StatusCount> {
    AppointmentStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: rows
                .iter()
                .filter(|(s, _)| s == status.as_str())
                .map(|(_, c)| *c)
                .sum(),
        })
        .collect()
}

/// First day of each of the last `count` months, oldest first, ending with today's month.
pub fn month_starts(today: NaiveDate, count: u32) -> Vec<NaiveDate> {
    let Some(current) = today.with_day(1) else {
        return Vec::new();
    };
    (0..count)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .collect()
}

pub fn fill_monthly(months: &[NaiveDate], rows: &[(NaiveDate, i64, i64)]) -> Vec<MonthlyRevenue> {
    months
        .iter()
        .map(|month| {
            let (total, paid) = rows
                .iter()
                .find(|(m, _, _)| m == month)
                .map(|(_, total, paid)| (*total, *paid))
                .unwrap_or((0, 0));
            MonthlyRevenue {
                month: month.format("%Y-%m").to_string(),
                total,
                paid,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn revenue_and_chart_windows_cover_the_same_week() {
        let today = d(2026, 2, 12);
        assert_eq!(window_start(today, REVENUE_WINDOW_DAYS), d(2026, 2, 6));
        assert_eq!(
            window_start(today, REVENUE_WINDOW_DAYS),
            window_start(today, CHART_DAYS)
        );
        let chart = fill_daily(window_start(today, CHART_DAYS), CHART_DAYS, &[]);
        assert_eq!(chart.first().map(|c| c.date), Some(d(2026, 2, 6)));
        assert_eq!(chart.last().map(|c| c.date), Some(today));
    }

    #[test]
    fn daily_series_fills_gaps_with_zero() {
        let rows = vec![(d(2026, 2, 10), 3), (d(2026, 2, 12), 1)];
        let series = fill_daily(d(2026, 2, 9), 4, &rows);
        let counts: Vec<i64> = series.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![0, 3, 0, 1]);
        assert_eq!(series.last().map(|c| c.date), Some(d(2026, 2, 12)));
    }

    #[test]
    fn status_breakdown_lists_every_status() {
        let rows = vec![("cancelled".to_string(), 2), ("scheduled".to_string(), 5)];
        let counts = fill_status_counts(&rows);
        assert_eq!(counts.len(), 4);
        assert_eq!(
            counts[0],
            StatusCount {
                status: AppointmentStatus::Scheduled,
                count: 5
            }
        );
        assert_eq!(counts[1].count, 0);
        assert_eq!(counts[2].count, 2);
        assert_eq!(counts[3].status, AppointmentStatus::NoShow);
    }

    #[test]
    fn month_window_crosses_year_boundary() {
        let months = month_starts(d(2026, 2, 17), 6);
        assert_eq!(
            months,
            vec![
                d(2025, 9, 1),
                d(2025, 10, 1),
                d(2025, 11, 1),
                d(2025, 12, 1),
                d(2026, 1, 1),
                d(2026, 2, 1),
            ]
        );
    }

    #[test]
    fn monthly_revenue_keeps_empty_months() {
        let months = month_starts(d(2026, 3, 31), 3);
        let rows = vec![(d(2026, 2, 1), 5_000, 2_500)];
        let revenue = fill_monthly(&months, &rows);
        assert_eq!(
            revenue,
            vec![
                MonthlyRevenue { month: "2026-01".into(), total: 0, paid: 0 },
                MonthlyRevenue { month: "2026-02".into(), total: 5_000, paid: 2_500 },
                MonthlyRevenue { month: "2026-03".into(), total: 0, paid: 0 },
            ]
        );
    }
}
