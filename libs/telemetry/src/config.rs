use std::env;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub json_logs: bool,
}

impl TelemetryConfig {
    pub fn from_env(default_service_name: &str, default_service_version: &str) -> Self {
        let service_name =
            env::var("SERVICE_NAME").unwrap_or_else(|_| default_service_name.to_string());
        let service_version = env::var("SERVICE_VERSION")
            .unwrap_or_else(|_| default_service_version.to_string());
        let environment = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "dev".into());
        let json_logs = env::var("LOG_FORMAT")
            .map(|v| json_logs_enabled(&v))
            .unwrap_or(true);

        Self {
            service_name,
            service_version,
            environment,
            json_logs,
        }
    }
}

fn json_logs_enabled(format: &str) -> bool {
    !matches!(format.to_lowercase().as_str(), "text" | "pretty" | "plain")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_formats_disable_json() {
        assert!(!json_logs_enabled("text"));
        assert!(!json_logs_enabled("Pretty"));
        assert!(!json_logs_enabled("PLAIN"));
        assert!(json_logs_enabled("json"));
        assert!(json_logs_enabled(""));
    }
}
