//! gRPC front for a `Worker`: `NodeService/DoWork` and `NodeService/Status`.
//!
//! Invalid work is answered with `INVALID_ARGUMENT` so the caller can
//! tell it apart from a failing node.

use std::sync::Arc;

use relay_rpc::proto::{StatusReply, StatusRequest, WorkReply, WorkRequest};
use relay_rpc::NodeService;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::error::WorkerError;
use crate::Worker;

pub struct WorkerServer<W: ?Sized> {
    worker: Arc<W>,
}

impl<W: Worker + ?Sized> WorkerServer<W> {
    pub fn new(worker: Arc<W>) -> Self {
        Self { worker }
    }
}

#[tonic::async_trait]
impl<W: Worker + ?Sized> NodeService for WorkerServer<W> {
    async fn do_work(
        &self,
        request: Request<WorkRequest>,
    ) -> Result<Response<WorkReply>, Status> {
        let work = request.into_inner().work;
        match self.worker.do_work(&work).await {
            Ok(reply) => Ok(Response::new(WorkReply { reply })),
            Err(WorkerError::InvalidWork(message)) => {
                debug!(%work, %message, "rejected work");
                Err(Status::invalid_argument(message))
            }
            Err(e @ WorkerError::Stopped) => Err(Status::unavailable(e.to_string())),
            Err(e) => Err(Status::internal(e.to_string())),
        }
    }

    async fn status(
        &self,
        request: Request<StatusRequest>,
    ) -> Result<Response<StatusReply>, Status> {
        let requested_at_ms = request.into_inner().requested_at_ms;
        let data = serde_json::to_vec(&self.worker.status(requested_at_ms))
            .map_err(|e| Status::internal(format!("serialize status: {e}")))?;
        Ok(Response::new(StatusReply { data }))
    }
}
