use serde::{Deserialize, Serialize};

/// Category of a community danger report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Danger,
    Warning,
    Safe,
}

impl ReportType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Danger => "danger",
            ReportType::Warning => "warning",
            ReportType::Safe => "safe",
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "danger" => Ok(ReportType::Danger),
            "warning" => Ok(ReportType::Warning),
            "safe" => Ok(ReportType::Safe),
            other => Err(format!(
                "report type must be 'danger', 'warning', or 'safe', got '{other}'"
            )),
        }
    }
}

/// One of the three route alternatives offered for the same start/end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteVariant {
    Safety,
    Shortest,
    Balanced,
}

impl RouteVariant {
    /// Presentation order; `Safety` is always first and recommended.
    pub const ALL: [RouteVariant; 3] = [
        RouteVariant::Safety,
        RouteVariant::Shortest,
        RouteVariant::Balanced,
    ];
}

impl std::fmt::Display for RouteVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteVariant::Safety => write!(f, "safety"),
            RouteVariant::Shortest => write!(f, "shortest"),
            RouteVariant::Balanced => write!(f, "balanced"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_type_round_trips_through_str() {
        for t in [ReportType::Danger, ReportType::Warning, ReportType::Safe] {
            assert_eq!(t.as_str().parse::<ReportType>().unwrap(), t);
        }
    }

    #[test]
    fn report_type_rejects_unknown() {
        let err = "scary".parse::<ReportType>().unwrap_err();
        assert!(err.contains("scary"));
    }

    #[test]
    fn route_variant_order_starts_with_safety() {
        assert_eq!(RouteVariant::ALL[0], RouteVariant::Safety);
        assert_eq!(
            serde_json::to_string(&RouteVariant::Balanced).unwrap(),
            "\"balanced\""
        );
    }
}
