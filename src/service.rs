//! Plant identification: prompt, model round trip, extraction.

use crate::ai::VisionModel;
use crate::extract::parse_report;
use crate::models::PlantReport;
use crate::submission::ImageSubmission;
use crate::{prompts, Error, Result};
use std::time::Duration;
use tracing::{info, warn};

pub struct IdentificationService {
    model: Box<dyn VisionModel>,
    timeout: Duration,
}

impl IdentificationService {
    pub fn new(model: Box<dyn VisionModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Identify the plant in `image`.
    ///
    /// Only upstream failures (transport, provider errors, deadline) are
    /// returned as errors. An unparseable reply still yields a report.
    pub async fn identify(&self, image: &ImageSubmission) -> Result<PlantReport> {
        let reply = tokio::time::timeout(
            self.timeout,
            self.model.generate(prompts::PLANT_IDENTIFICATION, image),
        )
        .await
        .map_err(|_| {
            warn!("Model call exceeded {:?}", self.timeout);
            Error::Timeout(self.timeout)
        })??;

        match parse_report(&reply) {
            Some(report) => {
                info!(
                    "Identified '{}' (danger level: {}, confidence: {})",
                    report.plant_name, report.danger_level, report.confidence
                );
                Ok(report)
            }
            None => {
                warn!(
                    "No usable report in model reply ({} bytes), using fallback",
                    reply.len()
                );
                Ok(PlantReport::fallback(reply))
            }
        }
    }
}
