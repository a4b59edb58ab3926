use crate::ark::ArkClient;
use crate::asset::AssetClient;
use crate::lightning::LightningClient;
use crate::types::ServiceKind;
use crate::Error;
use std::time::Duration;
use tokio::time::timeout;

/// Total deadline for the parallel health fan-out.
const HEALTH_FANOUT_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub ark: bool,
    pub asset: bool,
    pub lightning: bool,
}

impl HealthReport {
    pub fn all_healthy(&self) -> bool {
        self.ark && self.asset && self.lightning
    }

    pub fn is_healthy(&self, service: ServiceKind) -> bool {
        match service {
            ServiceKind::Ark => self.ark,
            ServiceKind::Asset => self.asset,
            ServiceKind::Lightning => self.lightning,
        }
    }
}

/// Owns the three back-end clients for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ClientManager {
    ark: ArkClient,
    asset: AssetClient,
    lightning: LightningClient,
}

impl ClientManager {
    pub fn new(ark: ArkClient, asset: AssetClient, lightning: LightningClient) -> Self {
        Self {
            ark,
            asset,
            lightning,
        }
    }

    pub fn ark(&self) -> &ArkClient {
        &self.ark
    }

    pub fn asset(&self) -> &AssetClient {
        &self.asset
    }

    pub fn lightning(&self) -> &LightningClient {
        &self.lightning
    }

    /// Probe all three daemons in parallel.
    ///
    /// A probe that fails or exceeds the shared deadline reports its service
    /// as unhealthy; the fan-out itself never fails.
    pub async fn health_check_all(&self) -> HealthReport {
        let (ark, asset, lightning) = tokio::join!(
            timeout(HEALTH_FANOUT_DEADLINE, self.ark.health_check()),
            timeout(HEALTH_FANOUT_DEADLINE, self.asset.health_check()),
            timeout(HEALTH_FANOUT_DEADLINE, self.lightning.health_check()),
        );

        let report = HealthReport {
            ark: ark.unwrap_or(false),
            asset: asset.unwrap_or(false),
            lightning: lightning.unwrap_or(false),
        };

        if !report.all_healthy() {
            tracing::warn!(
                ark = report.ark,
                asset = report.asset,
                lightning = report.lightning,
                "Back-end health degraded"
            );
        }

        report
    }

    pub fn reconnect(&self, service: ServiceKind) -> Result<(), Error> {
        match service {
            ServiceKind::Ark => self.ark.reconnect(),
            ServiceKind::Asset => self.asset.reconnect(),
            ServiceKind::Lightning => self.lightning.reconnect(),
        }
    }
}
