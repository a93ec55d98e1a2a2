use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Weights for the linear route-safety policy, loaded from YAML.
///
/// ```yaml
/// radius_meters: 50
/// base: 40
/// cctv_weight: 4
/// light_weight: 1
/// report_penalty: 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicyConfig {
    /// Infrastructure farther than this from every path point is ignored.
    pub radius_meters: f64,
    pub base: f64,
    pub cctv_weight: f64,
    pub light_weight: f64,
    #[serde(default)]
    pub report_penalty: f64,
}

impl Default for ScoringPolicyConfig {
    fn default() -> Self {
        Self {
            radius_meters: 50.0,
            base: 40.0,
            cctv_weight: 4.0,
            light_weight: 1.0,
            report_penalty: 5.0,
        }
    }
}

/// Load and validate a scoring policy from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_scoring_policy(path: &Path) -> Result<ScoringPolicyConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PolicyFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let policy: ScoringPolicyConfig = serde_yaml::from_str(&content)?;
    validate_policy(&policy)?;

    Ok(policy)
}

fn validate_policy(policy: &ScoringPolicyConfig) -> Result<(), ConfigError> {
    if !(policy.radius_meters.is_finite() && policy.radius_meters > 0.0) {
        return Err(ConfigError::Validation(format!(
            "radius_meters must be positive, got {}",
            policy.radius_meters
        )));
    }

    for (name, value) in [
        ("base", policy.base),
        ("cctv_weight", policy.cctv_weight),
        ("light_weight", policy.light_weight),
        ("report_penalty", policy.report_penalty),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ConfigError::Validation(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_policy(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write policy");
        file
    }

    #[test]
    fn loads_valid_policy_file() {
        let file = write_policy(
            "radius_meters: 30\nbase: 50\ncctv_weight: 3\nlight_weight: 0.5\nreport_penalty: 10\n",
        );
        let policy = load_scoring_policy(file.path()).expect("policy loads");
        assert!((policy.radius_meters - 30.0).abs() < f64::EPSILON);
        assert!((policy.light_weight - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn report_penalty_defaults_to_zero_when_omitted() {
        let file = write_policy("radius_meters: 30\nbase: 50\ncctv_weight: 3\nlight_weight: 1\n");
        let policy = load_scoring_policy(file.path()).expect("policy loads");
        assert!(policy.report_penalty.abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_zero_radius() {
        let mut policy = ScoringPolicyConfig::default();
        policy.radius_meters = 0.0;
        let err = validate_policy(&policy).unwrap_err();
        assert!(err.to_string().contains("radius_meters"));
    }

    #[test]
    fn rejects_negative_weight() {
        let mut policy = ScoringPolicyConfig::default();
        policy.cctv_weight = -1.0;
        let err = validate_policy(&policy).unwrap_err();
        assert!(err.to_string().contains("cctv_weight"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_scoring_policy(Path::new("/nonexistent/scoring.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::PolicyFileIo { .. }));
    }

    #[test]
    fn default_policy_is_valid() {
        assert!(validate_policy(&ScoringPolicyConfig::default()).is_ok());
    }
}
