use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use syncreq_bridge::DispatchedCommand;
use syncreq_contract::{
    decode_command, encode_command, CreatedBy, DeferredJob, JobConstraints, JobExtras, JobId,
    LocalBehaviour, PersistedUpload, RequiredNetwork, RetryService, UploadId, UploadResult,
    UploadStatus, UploaderCommand,
};
use tracing::info;

const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

const UPLOAD_COLUMNS: &str = "upload_id, account_name, local_path, remote_path, mime_type, \
    file_size, status, local_behaviour, force_overwrite, create_remote_folder, created_by, \
    last_result, uploaded_at";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub sqlite_path: String,
}

#[derive(Debug, Clone)]
pub struct SyncreqStorage {
    pool: SqlitePool,
}

/// A worker command as it was accepted, kept for the worker to pick up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub message_id: String,
    pub kind: String,
    pub account_name: String,
    pub command: UploaderCommand,
    pub accepted_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct UploadRow {
    upload_id: i64,
    account_name: String,
    local_path: String,
    remote_path: String,
    mime_type: String,
    file_size: i64,
    status: String,
    local_behaviour: i64,
    force_overwrite: bool,
    create_remote_folder: bool,
    created_by: i64,
    last_result: Option<String>,
    uploaded_at: Option<String>,
}

#[derive(Debug, FromRow)]
struct OutboxRow {
    message_id: String,
    kind: String,
    account_name: String,
    payload: Vec<u8>,
    accepted_at: String,
}

#[derive(Debug, FromRow)]
struct ScheduledJobRow {
    job_id: i64,
    service: String,
    remote_path: String,
    account_name: String,
    required_network: String,
    persisted: bool,
}

impl SyncreqStorage {
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let uri = normalize_sqlite_uri(&config.sqlite_path);
        let options = SqliteConnectOptions::from_str(&uri)
            .with_context(|| format!("invalid sqlite URI: {}", uri))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("failed to connect sqlite pool")?;

        let storage = Self { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA_SQL.split(';') {
            let sql = statement.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("migration failed for statement: {sql}"))?;
        }
        info!("syncreq sqlite schema ready");
        Ok(())
    }

    /// Stores a new upload record. The `upload_id` of `upload` is ignored and
    /// a fresh one assigned.
    pub async fn insert_upload(&self, upload: &PersistedUpload) -> Result<PersistedUpload> {
        let file_size = i64::try_from(upload.file_size).context("file size out of range")?;
        let result = sqlx::query(
            "INSERT INTO uploads(account_name, local_path, remote_path, mime_type, file_size, status, local_behaviour, force_overwrite, create_remote_folder, created_by, last_result, uploaded_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&upload.account_name)
        .bind(&upload.local_path)
        .bind(&upload.remote_path)
        .bind(&upload.mime_type)
        .bind(file_size)
        .bind(upload.status.as_str())
        .bind(i64::from(u8::from(upload.local_behaviour)))
        .bind(upload.force_overwrite)
        .bind(upload.create_remote_folder)
        .bind(i64::from(upload.created_by.0))
        .bind(upload.last_result.map(UploadResult::as_str))
        .bind(upload.uploaded_at.map(|at| at.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("insert upload")?;

        let upload_id = result.last_insert_rowid();
        self.get_upload(upload_id)
            .await?
            .context("upload missing after insert")
    }

    pub async fn update_upload_result(
        &self,
        upload_id: UploadId,
        status: UploadStatus,
        last_result: Option<UploadResult>,
    ) -> Result<()> {
        let uploaded_at = (status == UploadStatus::Succeeded).then(|| Utc::now().to_rfc3339());
        sqlx::query(
            "UPDATE uploads SET status = ?, last_result = ?, uploaded_at = COALESCE(?, uploaded_at) WHERE upload_id = ?",
        )
        .bind(status.as_str())
        .bind(last_result.map(UploadResult::as_str))
        .bind(uploaded_at)
        .bind(upload_id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("update upload {upload_id}"))?;
        Ok(())
    }

    pub async fn get_upload(&self, upload_id: UploadId) -> Result<Option<PersistedUpload>> {
        let row = sqlx::query_as::<_, UploadRow>(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE upload_id = ?"
        ))
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("query upload {upload_id}"))?;

        row.map(PersistedUpload::try_from).transpose()
    }

    /// Uploads whose last attempt failed, oldest first.
    pub async fn failed_uploads(&self) -> Result<Vec<PersistedUpload>> {
        let rows = sqlx::query_as::<_, UploadRow>(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE status = ? ORDER BY upload_id ASC"
        ))
        .bind(UploadStatus::Failed.as_str())
        .fetch_all(&self.pool)
        .await
        .context("query failed uploads")?;

        rows.into_iter().map(PersistedUpload::try_from).collect()
    }

    pub async fn append_command(&self, dispatched: &DispatchedCommand) -> Result<()> {
        let message = dispatched
            .command
            .clone()
            .into_message()
            .context("refusing to store malformed command")?;
        let payload = encode_command(&dispatched.command).context("encode command")?;

        sqlx::query(
            "INSERT INTO command_outbox(message_id, kind, account_name, payload, accepted_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&dispatched.receipt.message_id)
        .bind(message.kind())
        .bind(&message.account().name)
        .bind(payload)
        .bind(dispatched.receipt.accepted_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("insert command {}", dispatched.receipt.message_id))?;
        Ok(())
    }

    pub async fn list_commands(&self, limit: i64) -> Result<Vec<OutboxEntry>> {
        let rows = sqlx::query_as::<_, OutboxRow>(
            "SELECT message_id, kind, account_name, payload, accepted_at FROM command_outbox ORDER BY accepted_at ASC, message_id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("query command outbox")?;

        rows.into_iter()
            .map(|row| {
                Ok(OutboxEntry {
                    command: decode_command(&row.payload)
                        .with_context(|| format!("decode command {}", row.message_id))?,
                    accepted_at: parse_timestamp(&row.accepted_at)?,
                    message_id: row.message_id,
                    kind: row.kind,
                    account_name: row.account_name,
                })
            })
            .collect()
    }

    /// Inserts `job`, replacing any pending job with the same id.
    pub async fn upsert_scheduled_job(&self, job: &DeferredJob) -> Result<()> {
        sqlx::query(
            "INSERT INTO scheduled_jobs(job_id, service, remote_path, account_name, required_network, persisted, scheduled_at) VALUES (?, ?, ?, ?, ?, ?, ?) ON CONFLICT(job_id) DO UPDATE SET service = excluded.service, remote_path = excluded.remote_path, account_name = excluded.account_name, required_network = excluded.required_network, persisted = excluded.persisted, scheduled_at = excluded.scheduled_at",
        )
        .bind(job.job_id)
        .bind(job.service.as_str())
        .bind(&job.extras.remote_path)
        .bind(&job.extras.account_name)
        .bind(network_as_str(job.constraints.required_network))
        .bind(job.constraints.persisted)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert scheduled job {}", job.job_id))?;
        Ok(())
    }

    pub async fn list_scheduled_jobs(&self) -> Result<Vec<DeferredJob>> {
        let rows = sqlx::query_as::<_, ScheduledJobRow>(
            "SELECT job_id, service, remote_path, account_name, required_network, persisted FROM scheduled_jobs ORDER BY job_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("query scheduled jobs")?;

        rows.into_iter().map(DeferredJob::try_from).collect()
    }

    pub async fn remove_scheduled_job(&self, job_id: JobId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM scheduled_jobs WHERE job_id = ?")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete scheduled job {job_id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

impl TryFrom<UploadRow> for PersistedUpload {
    type Error = anyhow::Error;

    fn try_from(row: UploadRow) -> Result<Self> {
        let behaviour = u8::try_from(row.local_behaviour)
            .ok()
            .and_then(|value| LocalBehaviour::try_from(value).ok())
            .ok_or_else(|| {
                anyhow!(
                    "upload {} has local behaviour {}",
                    row.upload_id,
                    row.local_behaviour
                )
            })?;

        Ok(Self {
            upload_id: row.upload_id,
            account_name: row.account_name,
            local_path: row.local_path,
            remote_path: row.remote_path,
            mime_type: row.mime_type,
            file_size: u64::try_from(row.file_size).context("negative file size")?,
            status: row.status.parse::<UploadStatus>()?,
            local_behaviour: behaviour,
            force_overwrite: row.force_overwrite,
            create_remote_folder: row.create_remote_folder,
            created_by: CreatedBy(
                i32::try_from(row.created_by).context("created_by out of range")?,
            ),
            last_result: row
                .last_result
                .as_deref()
                .map(str::parse::<UploadResult>)
                .transpose()?,
            uploaded_at: row.uploaded_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

impl TryFrom<ScheduledJobRow> for DeferredJob {
    type Error = anyhow::Error;

    fn try_from(row: ScheduledJobRow) -> Result<Self> {
        let service = RetryService::parse(&row.service)
            .ok_or_else(|| anyhow!("job {} targets unknown service {}", row.job_id, row.service))?;
        let required_network = match row.required_network.as_str() {
            "any" => RequiredNetwork::Any,
            "unmetered" => RequiredNetwork::Unmetered,
            other => return Err(anyhow!("job {} requires unknown network {other}", row.job_id)),
        };

        Ok(Self {
            job_id: JobId::try_from(row.job_id).context("job id out of range")?,
            service,
            constraints: JobConstraints {
                required_network,
                persisted: row.persisted,
            },
            extras: JobExtras {
                remote_path: row.remote_path,
                account_name: row.account_name,
            },
        })
    }
}

fn network_as_str(network: RequiredNetwork) -> &'static str {
    match network {
        RequiredNetwork::Any => "any",
        RequiredNetwork::Unmetered => "unmetered",
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp {raw}"))
}

fn normalize_sqlite_uri(raw: &str) -> String {
    if raw.starts_with("sqlite:") {
        raw.to_string()
    } else {
        format!("sqlite://{raw}")
    }
}
