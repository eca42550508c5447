use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// `(page, per_page, offset)`; a page whose offset overflows is a bad request.
    pub fn normalize(&self) -> AppResult<(i64, i64, i64)> {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| AppError::BadRequest("page is out of range".into()))?;
        Ok((page, per_page, offset))
    }
}

// The filter queries below repeat `page`/`per_page` instead of flattening
// `Pagination`: under `serde(flatten)` the urlencoded deserializer hands
// numbers over as strings and rejects them.

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DoctorQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub clinic_id: Option<Uuid>,
    pub specialization: Option<String>,
}

impl DoctorQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PatientQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub clinic_id: Option<Uuid>,
}

impl PatientQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InvoiceQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub patient_id: Option<Uuid>,
    pub sort_order: Option<SortOrder>,
}

impl InvoiceQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::Query, http::Uri};

    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize().unwrap(), (1, 20, 0));
        let p = Pagination {
            page: Some(3),
            per_page: Some(500),
        };
        assert_eq!(p.normalize().unwrap(), (3, 100, 200));
        let p = Pagination {
            page: Some(-4),
            per_page: Some(0),
        };
        assert_eq!(p.normalize().unwrap(), (1, 1, 0));
    }

    #[test]
    fn huge_page_is_rejected_instead_of_overflowing() {
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        assert!(matches!(p.normalize(), Err(AppError::BadRequest(_))));

        let last_safe = Pagination {
            page: Some(i64::MAX / 100),
            per_page: Some(100),
        };
        assert!(last_safe.normalize().is_ok());
    }

    #[test]
    fn query_strings_deserialize_numbers_and_ids() {
        let id = Uuid::new_v4();
        let uri: Uri = format!("/api/invoices?page=2&per_page=5&patient_id={id}&status=Paid&sort_order=asc")
            .parse()
            .unwrap();
        let Query(query) = Query::<InvoiceQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.pagination().normalize().unwrap(), (2, 5, 5));
        assert_eq!(query.patient_id, Some(id));
        assert_eq!(query.status.as_deref(), Some("Paid"));
        assert!(matches!(query.sort_order, Some(SortOrder::Asc)));
    }
}
