mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use syncreq_contract::{CreatedBy, JobId, LocalBehaviour, UploadId, UploadResult};
use syncreq_storage::{StorageConfig, SyncreqStorage};
use syncreq_transfer::{
    AccountResolver, ChannelTransferWorker, InMemoryJobScheduler, RetryOutcome, TransferRequester,
};
use tracing::{info, warn};

use crate::config::RuntimeConfig;

#[derive(Debug, Parser)]
#[command(author, version, about = "Upload, retry and deferred transfer requests")]
struct Cli {
    #[arg(long, global = true, default_value = "config/syncreq.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload one new file.
    Upload {
        #[arg(long)]
        account: String,
        #[arg(long)]
        local_path: String,
        #[arg(long)]
        remote_path: String,
        #[arg(long, default_value = "application/octet-stream")]
        mime_type: String,
        /// 0 copy, 1 move, 2 forget, 3 remove
        #[arg(long, default_value_t = 0)]
        behaviour: u8,
        #[arg(long)]
        create_remote_folder: bool,
        #[arg(long, default_value_t = 0)]
        created_by: i32,
    },
    /// Retry one stored upload.
    Retry {
        #[arg(long)]
        upload_id: UploadId,
    },
    /// Retry every stored failed upload, optionally narrowed down.
    RetryFailed {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        result: Option<String>,
    },
    /// Retry now, or defer to an unmetered network when offline or idle.
    RetryOrSchedule {
        #[arg(long)]
        upload_id: UploadId,
        #[arg(long)]
        job_id: JobId,
    },
    ScheduleUpload {
        #[arg(long)]
        job_id: JobId,
        #[arg(long)]
        account: String,
        #[arg(long)]
        remote_path: String,
    },
    ScheduleDownload {
        #[arg(long)]
        job_id: JobId,
        #[arg(long)]
        remote_path: String,
        #[arg(long)]
        account: String,
    },
    /// List pending deferred jobs.
    Jobs,
    CancelJob {
        #[arg(long)]
        job_id: JobId,
    },
    /// List commands waiting for the worker.
    Outbox {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = RuntimeConfig::load(&cli.config)?;
    run(config, cli.command).await
}

async fn run(config: RuntimeConfig, command: Command) -> Result<()> {
    let storage = SyncreqStorage::connect(&StorageConfig {
        sqlite_path: config.storage.sqlite_path.clone(),
    })
    .await?;

    let failed_uploads = storage.failed_uploads().await?;
    let restored_jobs = storage.list_scheduled_jobs().await?;
    let platform = Arc::new(InMemoryJobScheduler::with_jobs(
        config.platform.api_level,
        restored_jobs.clone(),
    ));
    let accounts = Arc::new(config.account_directory());
    let (worker, mut receiver) = ChannelTransferWorker::new();
    let requester = TransferRequester::new(
        Arc::new(worker),
        platform.clone(),
        accounts.clone(),
        Arc::new(failed_uploads),
        Arc::new(config.device_conditions()),
    );

    match command {
        Command::Upload {
            account,
            local_path,
            remote_path,
            mime_type,
            behaviour,
            create_remote_folder,
            created_by,
        } => {
            let account = accounts
                .resolve(&account)
                .ok_or_else(|| anyhow!("account {account} is not configured"))?;
            let behaviour = LocalBehaviour::try_from(behaviour)?;
            let receipt = requester.upload_new_single(
                &account,
                &local_path,
                &remote_path,
                behaviour,
                &mime_type,
                create_remote_folder,
                CreatedBy(created_by),
            )?;
            println!("queued upload {}", receipt.message_id);
        }
        Command::Retry { upload_id } => {
            let upload = storage
                .get_upload(upload_id)
                .await?
                .with_context(|| format!("no stored upload {upload_id}"))?;
            let receipt = requester.retry(&upload)?;
            println!("queued retry {}", receipt.message_id);
        }
        Command::RetryFailed { account, result } => {
            let account = account
                .map(|name| {
                    accounts
                        .resolve(&name)
                        .ok_or_else(|| anyhow!("account {name} is not configured"))
                })
                .transpose()?;
            let result = result
                .as_deref()
                .map(str::parse::<UploadResult>)
                .transpose()?;
            let retried = requester.retry_failed(account.as_ref(), result)?;
            println!("queued {retried} retries");
        }
        Command::RetryOrSchedule { upload_id, job_id } => {
            let upload = storage
                .get_upload(upload_id)
                .await?
                .with_context(|| format!("no stored upload {upload_id}"))?;
            match requester.retry_or_schedule(job_id, &upload)? {
                RetryOutcome::Dispatched(receipt) => {
                    println!("queued retry {}", receipt.message_id)
                }
                RetryOutcome::Deferred { job_id } => println!("deferred as job {job_id}"),
            }
        }
        Command::ScheduleUpload {
            job_id,
            account,
            remote_path,
        } => report_scheduled(
            requester.schedule_upload(job_id, &account, &remote_path)?,
            job_id,
        ),
        Command::ScheduleDownload {
            job_id,
            remote_path,
            account,
        } => report_scheduled(
            requester.schedule_download(job_id, &remote_path, &account)?,
            job_id,
        ),
        Command::Jobs => {
            for job in platform.pending() {
                println!("{}", serde_json::to_string(&job)?);
            }
        }
        Command::CancelJob { job_id } => {
            platform.cancel(job_id)?;
            if !storage.remove_scheduled_job(job_id).await? {
                bail!("no pending job {job_id}");
            }
            println!("cancelled job {job_id}");
        }
        Command::Outbox { limit } => {
            for entry in storage.list_commands(limit).await? {
                println!(
                    "{} {} {} {}",
                    entry.accepted_at.to_rfc3339(),
                    entry.message_id,
                    entry.kind,
                    entry.account_name
                );
            }
        }
    }

    drop(requester);
    let mut stored = 0usize;
    while let Some(dispatched) = receiver.recv().await {
        storage.append_command(&dispatched).await?;
        stored += 1;
    }
    for job in platform
        .pending()
        .into_iter()
        .filter(|job| !restored_jobs.contains(job))
    {
        storage.upsert_scheduled_job(&job).await?;
    }
    if stored > 0 {
        info!(stored, "commands written to outbox");
    }
    Ok(())
}

fn report_scheduled(scheduled: bool, job_id: JobId) {
    if scheduled {
        println!("scheduled job {job_id}");
    } else {
        warn!(job_id, "platform does not support deferred jobs");
        println!("not scheduled");
    }
}
