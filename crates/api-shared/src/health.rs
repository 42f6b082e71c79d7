use crate::dto::HealthRes;

/// Health service shared by the chat and report-overview APIs.
///
/// Each service reports under its own name so a load balancer can tell them apart.
#[derive(Clone)]
pub struct HealthService {
    service: &'static str,
}

impl HealthService {
    /// Creates a health service reporting as `service`.
    pub fn new(service: &'static str) -> Self {
        Self { service }
    }

    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health(&self) -> HealthRes {
        HealthRes {
            ok: true,
            status: "ok".into(),
            message: format!("{} is alive", self.service),
        }
    }
}
