use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use super::remote::{RemoteError, RemoteStore};
use crate::model::attendance::AttendancePunch;
use crate::model::staff::StaffCredential;

const STAFF_TABLE: &str = "staff";
const ATTENDANCE_TABLE: &str = "attendance";

/// PostgREST-style client for the hosted table-store. Row filters go in the
/// query string; the conflict key is declared with `on_conflict` so the
/// upsert is idempotent on (employee_id, date).
pub struct RestRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestRemoteStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| RemoteError::Payload(format!("invalid api key header: {e}")))?;
        headers.insert("apikey", key);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| RemoteError::Payload(format!("invalid api key header: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, RemoteError> {
        let resp = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(filters)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    async fn lookup_staff(
        &self,
        employee_id: &str,
        pin: &str,
    ) -> Result<Option<StaffCredential>, RemoteError> {
        // ilike gives the case-insensitive id match; the pin stays exact.
        let rows: Vec<StaffCredential> = self
            .fetch_rows(
                STAFF_TABLE,
                &[
                    ("employee_id", format!("ilike.{employee_id}")),
                    ("pin", format!("eq.{pin}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_staff(&self) -> Result<Vec<StaffCredential>, RemoteError> {
        self.fetch_rows(STAFF_TABLE, &[]).await
    }

    async fn upsert_attendance(&self, record: &AttendancePunch) -> Result<(), RemoteError> {
        // The store's native upsert replaces supplied columns wholesale, so
        // the field-level merge happens here: read the day's row, fold the
        // incoming punch into it, then write the merged row back.
        let merged = match self.query_attendance(&record.employee_id, record.date).await? {
            Some(mut existing) => {
                existing.merge_from(record);
                existing
            }
            None => record.clone(),
        };

        debug!(
            employee_id = %merged.employee_id,
            date = %merged.date,
            "Upserting attendance row"
        );

        let resp = self
            .client
            .post(self.table_url(ATTENDANCE_TABLE))
            .query(&[("on_conflict", "employee_id,date")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&merged)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn query_attendance(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendancePunch>, RemoteError> {
        let rows: Vec<AttendancePunch> = self
            .fetch_rows(
                ATTENDANCE_TABLE,
                &[
                    ("employee_id", format!("ilike.{employee_id}")),
                    ("date", format!("eq.{date}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}
