//! Configuration for stability models

/// Which stability rows the model uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StabilityFormulation {
    /// One row per compatible pair
    Single,
    /// One row per tie group, through "filled at rank r or better" indicators
    #[default]
    Merged,
}

impl std::fmt::Display for StabilityFormulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StabilityFormulation::Single => write!(f, "single"),
            StabilityFormulation::Merged => write!(f, "merged"),
        }
    }
}

impl std::str::FromStr for StabilityFormulation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "pair" => Ok(StabilityFormulation::Single),
            "merged" | "merge" | "group" => Ok(StabilityFormulation::Merged),
            _ => Err(format!(
                "Unknown stability formulation: '{}'. Valid options: single, merged",
                s
            )),
        }
    }
}

/// Configuration for [`StabilityModel`](super::StabilityModel)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelConfig {
    pub formulation: StabilityFormulation,
    /// A pair column counts as chosen when its value is at least `1 - epsilon`
    pub epsilon: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            formulation: StabilityFormulation::default(),
            epsilon: 1e-6,
        }
    }
}

impl ModelConfig {
    pub fn new(formulation: StabilityFormulation) -> Self {
        Self {
            formulation,
            ..Self::default()
        }
    }

    pub fn with_formulation(mut self, formulation: StabilityFormulation) -> Self {
        self.formulation = formulation;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formulation_round_trip() {
        for formulation in [StabilityFormulation::Single, StabilityFormulation::Merged] {
            assert_eq!(formulation.to_string().parse(), Ok(formulation));
        }
        assert!("double".parse::<StabilityFormulation>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.formulation, StabilityFormulation::Merged);
        assert_eq!(config.epsilon, 1e-6);
    }
}
