//! `/api/fasting` endpoints.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    auth::AuthService,
    dates::format_utc,
    request::ApiRequest,
    types::{FastRecord, FastType, FastingStatistics},
    Error,
};

pub const RECORDS_PATH: &str = "/api/fasting/records";
pub const STATISTICS_PATH: &str = "/api/fasting/statistics";

/// Remote fasting records and statistics. All calls require authorization.
#[derive(Clone)]
pub struct FastingApi {
    auth: AuthService,
}

impl FastingApi {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }

    /// Fetches every record of the current user.
    pub async fn records(&self) -> Result<Vec<FastRecord>, Error> {
        self.auth.call(&ApiRequest::get(RECORDS_PATH)).await
    }

    /// Fetches records between `start` and `end`.
    pub async fn records_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FastRecord>, Error> {
        let req = ApiRequest::get(RECORDS_PATH)
            .with_query("startDate", format_utc(&start))
            .with_query("endDate", format_utc(&end));
        self.auth.call(&req).await
    }

    pub async fn records_by_type(&self, fast_type: FastType) -> Result<Vec<FastRecord>, Error> {
        let req = ApiRequest::get(RECORDS_PATH).with_query("type", fast_type.display_name());
        self.auth.call(&req).await
    }

    pub async fn create(&self, record: &FastRecord) -> Result<FastRecord, Error> {
        let req = ApiRequest::post(RECORDS_PATH).with_json(record)?;
        self.auth.call(&req).await
    }

    pub async fn update(&self, record: &FastRecord) -> Result<FastRecord, Error> {
        let req = ApiRequest::put(format!("{}/{}", RECORDS_PATH, record.id)).with_json(record)?;
        self.auth.call(&req).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<String, Error> {
        self.auth
            .call_text(&ApiRequest::delete(format!("{}/{}", RECORDS_PATH, id)))
            .await
    }

    pub async fn statistics(&self) -> Result<FastingStatistics, Error> {
        self.auth.call(&ApiRequest::get(STATISTICS_PATH)).await
    }
}
