//! Supabase REST client for auth and record operations.

use crate::error::{RemoteError, RemoteResult};
use crate::types::{AuthUser, LogRecord, RecordPayload, Session, TokenResponse};
use crate::{AuthApi, RecordsApi};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Table holding the user's journal entries.
const RECORDS_TABLE: &str = "logs";

/// Supabase client for the journal's auth and record endpoints.
#[derive(Clone)]
pub struct SupabaseClient {
    http_client: reqwest::Client,
    api_url: String,
    publishable_key: String,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    ///
    /// # Arguments
    /// * `api_url` - The Supabase project URL (e.g., `https://xyz.supabase.co`)
    /// * `publishable_key` - The Supabase publishable API key
    pub fn new(api_url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.into(),
            publishable_key: publishable_key.into(),
        }
    }

    /// Build the REST API URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    /// Build an auth endpoint URL.
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.api_url, path)
    }

    /// Convert a non-success response into a classified error.
    async fn error_from_response(response: reqwest::Response) -> RemoteError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        warn!(status = status, "Supabase request failed");
        RemoteError::Supabase { status, message }
    }
}

#[async_trait]
impl AuthApi for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> RemoteResult<()> {
        let url = self.auth_url("signup");
        debug!(url = %url, "Signing up");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> RemoteResult<Session> {
        let url = self.auth_url("token?grant_type=password");
        debug!(email = %email, "Attempting password sign-in");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.into_session())
    }

    async fn sign_out(&self, access_token: &str) -> RemoteResult<()> {
        let url = self.auth_url("logout");
        debug!("Signing out");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> RemoteResult<AuthUser> {
        let url = self.auth_url("user");
        debug!("Verifying session with server");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let user: AuthUser = response.json().await?;
        debug!(user_id = %user.id, "Session verified");
        Ok(user)
    }

    async fn refresh(&self, refresh_token: &str) -> RemoteResult<Session> {
        let url = self.auth_url("token?grant_type=refresh_token");
        debug!("Refreshing session");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.into_session())
    }
}

#[async_trait]
impl RecordsApi for SupabaseClient {
    async fn list_records(&self, access_token: &str, limit: usize) -> RemoteResult<Vec<LogRecord>> {
        let url = format!(
            "{}?select=*&order=created_at.desc&limit={}",
            self.rest_url(RECORDS_TABLE),
            limit
        );
        debug!(url = %url, "Fetching records");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let records: Vec<LogRecord> = response.json().await?;
        debug!(count = records.len(), "Fetched records");
        Ok(records)
    }

    async fn insert_record(
        &self,
        access_token: &str,
        payload: &RecordPayload,
    ) -> RemoteResult<LogRecord> {
        let url = self.rest_url(RECORDS_TABLE);
        debug!(kind = %payload.kind, "Inserting record");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        // PostgREST returns the representation as a one-element array.
        let mut rows: Vec<LogRecord> = response.json().await?;
        rows.pop().ok_or_else(|| RemoteError::Config(
            "insert returned no representation".to_string(),
        ))
    }

    async fn update_record(
        &self,
        access_token: &str,
        id: &str,
        payload: &RecordPayload,
    ) -> RemoteResult<LogRecord> {
        let url = format!("{}?id=eq.{}", self.rest_url(RECORDS_TABLE), id);
        debug!(id = %id, "Updating record");

        let response = self
            .http_client
            .patch(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let mut rows: Vec<LogRecord> = response.json().await?;
        rows.pop().ok_or_else(|| RemoteError::Supabase {
            status: 404,
            message: format!("no record with id {}", id),
        })
    }

    async fn delete_record(&self, access_token: &str, id: &str) -> RemoteResult<()> {
        let url = format!("{}?id=eq.{}", self.rest_url(RECORDS_TABLE), id);
        debug!(id = %id, "Deleting record");

        let response = self
            .http_client
            .delete(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }
}
