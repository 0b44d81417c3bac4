use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::Visit;
use tokio::{
    sync::{mpsc, oneshot, Mutex, RwLock},
    task::JoinHandle,
};
use tracing::{debug, info};
use url::Url;

use crate::{
    config::ClientSettings, error::ClientError, photo::resolve_photo_url,
    transport::DoorbellClient, DoorbellApi,
};

/// Jobs waiting behind the one in flight before `submit` starts applying backpressure.
const QUEUE_DEPTH: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, ClientError>>;

enum Job {
    Ring(Reply<Visit>),
    Unlock(Reply<()>),
    History {
        limit: u32,
        offset: u32,
        reply: Reply<Vec<Visit>>,
    },
    Photo {
        url: Url,
        reply: Reply<Vec<u8>>,
    },
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::Ring(_) => "ring",
            Job::Unlock(_) => "unlock",
            Job::History { .. } => "history",
            Job::Photo { .. } => "photo",
        }
    }

    fn caller_gone(&self) -> bool {
        match self {
            Job::Ring(reply) => reply.is_closed(),
            Job::Unlock(reply) => reply.is_closed(),
            Job::History { reply, .. } => reply.is_closed(),
            Job::Photo { reply, .. } => reply.is_closed(),
        }
    }

    async fn run(self, client: &DoorbellClient) {
        // A send error only means the caller stopped waiting.
        match self {
            Job::Ring(reply) => {
                let _ = reply.send(client.ring_doorbell().await);
            }
            Job::Unlock(reply) => {
                let _ = reply.send(client.unlock_door().await);
            }
            Job::History {
                limit,
                offset,
                reply,
            } => {
                let _ = reply.send(client.visit_history(limit, offset).await);
            }
            Job::Photo { url, reply } => {
                let _ = reply.send(client.download_photo(url).await);
            }
        }
    }
}

struct ServiceInner {
    jobs: RwLock<Option<mpsc::Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    base_url: Url,
}

/// Doorbell operations executed one at a time, in submission order, on a dedicated task.
///
/// Handles are cheap to clone and share one worker. The worker stops after
/// [`DoorbellService::shutdown`] or once every handle is dropped; jobs already queued at
/// that point still run.
#[derive(Clone)]
pub struct DoorbellService {
    inner: Arc<ServiceInner>,
}

impl DoorbellService {
    /// Builds the HTTP client and starts the worker. Must be called inside a Tokio runtime.
    pub fn connect(settings: &ClientSettings) -> Result<Self, ClientError> {
        Ok(Self::spawn(DoorbellClient::new(settings)?))
    }

    pub fn spawn(client: DoorbellClient) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let base_url = client.base_url().clone();
        info!(base_url = %base_url, "starting doorbell worker");
        let worker = tokio::spawn(run_worker(client, rx));
        Self {
            inner: Arc::new(ServiceInner {
                jobs: RwLock::new(Some(tx)),
                worker: Mutex::new(Some(worker)),
                base_url,
            }),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub async fn is_shut_down(&self) -> bool {
        self.inner.jobs.read().await.is_none()
    }

    /// Stops accepting work, lets queued jobs finish, and waits for the worker to exit.
    /// Later calls return immediately.
    pub async fn shutdown(&self) {
        let sender = self.inner.jobs.write().await.take();
        drop(sender);
        let worker = self.inner.worker.lock().await.take();
        if let Some(worker) = worker {
            let _ = worker.await;
            info!("doorbell worker shut down");
        }
    }

    async fn submit<T>(&self, job: impl FnOnce(Reply<T>) -> Job) -> Result<T, ClientError> {
        let sender = self
            .inner
            .jobs
            .read()
            .await
            .clone()
            .ok_or(ClientError::Shutdown)?;
        let (reply, result) = oneshot::channel();
        sender
            .send(job(reply))
            .await
            .map_err(|_| ClientError::Shutdown)?;
        result.await.map_err(|_| ClientError::Shutdown)?
    }
}

async fn run_worker(client: DoorbellClient, mut jobs: mpsc::Receiver<Job>) {
    while let Some(job) = jobs.recv().await {
        if job.caller_gone() {
            debug!(job = job.name(), "skipping job abandoned before it started");
            continue;
        }
        debug!(job = job.name(), "running doorbell job");
        job.run(&client).await;
    }
    debug!("doorbell job queue closed");
}

#[async_trait]
impl DoorbellApi for DoorbellService {
    async fn ring_doorbell(&self) -> Result<Visit, ClientError> {
        self.submit(Job::Ring).await
    }

    async fn unlock_door(&self) -> Result<(), ClientError> {
        self.submit(Job::Unlock).await
    }

    async fn visit_history(&self, limit: u32, offset: u32) -> Result<Vec<Visit>, ClientError> {
        self.submit(|reply| Job::History {
            limit,
            offset,
            reply,
        })
        .await
    }

    async fn download_photo(&self, visit: &Visit) -> Result<Vec<u8>, ClientError> {
        if self.is_shut_down().await {
            return Err(ClientError::Shutdown);
        }
        let url = resolve_photo_url(self.base_url(), visit)
            .ok_or(ClientError::MissingPhoto(visit.id))?;
        self.submit(|reply| Job::Photo { url, reply }).await
    }
}
