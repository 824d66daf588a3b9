use serde::{Deserialize, Serialize};
use std::fmt;

/// Services allowed to emit performance samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Api,
    Web,
    Worker,
    Scheduler,
    Database,
    Cache,
}

impl Service {
    pub const ALL: [Service; 6] = [
        Service::Api,
        Service::Web,
        Service::Worker,
        Service::Scheduler,
        Service::Database,
        Service::Cache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Web => "web",
            Self::Worker => "worker",
            Self::Scheduler => "scheduler",
            Self::Database => "database",
            Self::Cache => "cache",
        }
    }

    /// Case-insensitive lookup. The caller keeps its own casing of `name`.
    pub fn lookup(name: &str) -> Option<Service> {
        Self::ALL
            .iter()
            .copied()
            .find(|service| service.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
