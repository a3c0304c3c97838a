//! UsageService gRPC implementation.

use crate::error::CycleError;
use crate::grpc::proto::usage_service_server::UsageService;
use crate::grpc::proto::*;
use crate::models::{self, LineInfo};
use crate::services::{
    record_error, record_grpc_request, record_grpc_request_duration, CycleService,
};
use service_core::error::AppError;
use service_core::grpc::{GrpcResult, IntoStatus};
use std::sync::Arc;
use std::time::Instant;
use tonic::{Request, Response, Status};

/// UsageService implementation.
pub struct UsageServiceImpl {
    cycles: Arc<CycleService>,
}

impl UsageServiceImpl {
    /// Create a new UsageServiceImpl.
    pub fn new(cycles: Arc<CycleService>) -> Self {
        Self { cycles }
    }
}

fn report_to_proto(r: models::DailyUsageReport) -> DailyUsageReport {
    DailyUsageReport {
        date: r.date,
        daily_usage: r.amount,
    }
}

fn cycle_info_to_proto(c: models::CycleInfo) -> CycleInfo {
    CycleInfo {
        cycle_id: c.cycle_id.to_string(),
        start_date: c.start_date,
        end_date: c.end_date,
    }
}

/// Record request metrics for a failed call and convert the error.
fn fail(method: &str, start: Instant, err: CycleError) -> Status {
    let status_label = match &err {
        CycleError::Store(e) => {
            record_error(e.kind(), method);
            "error"
        }
        other => other.outcome(),
    };
    record_grpc_request(method, status_label);
    record_grpc_request_duration(method, start.elapsed().as_secs_f64());
    AppError::from(err).into_status()
}

fn succeed(method: &str, start: Instant) {
    record_grpc_request(method, "ok");
    record_grpc_request_duration(method, start.elapsed().as_secs_f64());
}

#[tonic::async_trait]
impl UsageService for UsageServiceImpl {
    #[tracing::instrument(skip(self, request), fields(method = "GetCurrentCycleReport"))]
    async fn get_current_cycle_report(
        &self,
        request: Request<GetCurrentCycleReportRequest>,
    ) -> GrpcResult<GetCurrentCycleReportResponse> {
        let start = Instant::now();
        let method = "GetCurrentCycleReport";

        let req = request.into_inner();
        let line = LineInfo::new(req.user_id, req.mdn);
        tracing::debug!(user_id = %line.user_id, mdn = %line.mdn, "Getting current cycle report");

        let reports = self
            .cycles
            .get_current_cycle_report(&line)
            .await
            .map_err(|e| fail(method, start, e))?;

        succeed(method, start);

        Ok(Response::new(GetCurrentCycleReportResponse {
            reports: reports.into_iter().map(report_to_proto).collect(),
        }))
    }

    #[tracing::instrument(skip(self, request), fields(method = "GetCycleHistory"))]
    async fn get_cycle_history(
        &self,
        request: Request<GetCycleHistoryRequest>,
    ) -> GrpcResult<GetCycleHistoryResponse> {
        let start = Instant::now();
        let method = "GetCycleHistory";

        let req = request.into_inner();
        let line = LineInfo::new(req.user_id, req.mdn);
        tracing::debug!(user_id = %line.user_id, mdn = %line.mdn, "Getting cycle history");

        let cycles = self
            .cycles
            .get_cycle_history(&line)
            .await
            .map_err(|e| fail(method, start, e))?;

        succeed(method, start);

        Ok(Response::new(GetCycleHistoryResponse {
            cycles: cycles.into_iter().map(cycle_info_to_proto).collect(),
        }))
    }
}
