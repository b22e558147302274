//! Encoders to external solver formats

mod cnf;
mod mzn;
mod opb;

pub use cnf::{encode_sat, encode_wpmaxsat};
pub use mzn::encode_minizinc;
pub use opb::encode_pbo;

use crate::AgentId;
use crate::instance::{Instance, Side};
use crate::preferences::{Agent, PreferenceError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{side} agent {id} is listed as a partner but not defined")]
    MissingAgent { side: Side, id: AgentId },
    #[error(transparent)]
    Preference(#[from] PreferenceError),
}

/// Output format for [`encode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    /// DIMACS CNF, every agent matched
    Sat,
    /// Weighted partial MaxSAT, as many agents matched as possible
    WpMaxSat,
    /// Pseudo-Boolean optimisation, one stability row per pair
    Pbo,
    /// Pseudo-Boolean optimisation with rank indicators
    PboMerged,
    /// MiniZinc satisfaction model, every left agent matched
    MiniZinc,
    /// MiniZinc model maximising the matching size
    MiniZincOpt,
}

impl std::fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingFormat::Sat => write!(f, "sat"),
            EncodingFormat::WpMaxSat => write!(f, "wpmaxsat"),
            EncodingFormat::Pbo => write!(f, "pbo"),
            EncodingFormat::PboMerged => write!(f, "pbo-merged"),
            EncodingFormat::MiniZinc => write!(f, "minizinc"),
            EncodingFormat::MiniZincOpt => write!(f, "minizinc-opt"),
        }
    }
}

impl std::str::FromStr for EncodingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "sat" | "cnf" => Ok(EncodingFormat::Sat),
            "wpmaxsat" | "wcnf" | "maxsat" => Ok(EncodingFormat::WpMaxSat),
            "pbo" | "opb" => Ok(EncodingFormat::Pbo),
            "pbo-merged" | "opb-merged" => Ok(EncodingFormat::PboMerged),
            "minizinc" | "mzn" => Ok(EncodingFormat::MiniZinc),
            "minizinc-opt" | "mzn-opt" => Ok(EncodingFormat::MiniZincOpt),
            _ => Err(format!(
                "Unknown encoding: '{}'. Valid options: sat, wpmaxsat, pbo, pbo-merged, minizinc, minizinc-opt",
                s
            )),
        }
    }
}

/// Encode `instance` in the chosen format
pub fn encode(instance: &Instance, format: EncodingFormat) -> Result<String, EncodeError> {
    match format {
        EncodingFormat::Sat => encode_sat(instance),
        EncodingFormat::WpMaxSat => encode_wpmaxsat(instance),
        EncodingFormat::Pbo => encode_pbo(instance, false),
        EncodingFormat::PboMerged => encode_pbo(instance, true),
        EncodingFormat::MiniZinc => encode_minizinc(instance, false),
        EncodingFormat::MiniZincOpt => encode_minizinc(instance, true),
    }
}

/// Look up the right agent a left agent lists
fn listed_right(instance: &Instance, id: AgentId) -> Result<&Agent, EncodeError> {
    instance.agent_right(id).ok_or(EncodeError::MissingAgent {
        side: Side::Right,
        id,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two agents per side, both sides ranking 1 before 2
    pub(crate) fn crossed() -> Instance {
        Instance::from_preferences(
            vec![(1, vec![vec![1], vec![2]]), (2, vec![vec![2], vec![1]])],
            vec![(1, vec![vec![1], vec![2]]), (2, vec![vec![2], vec![1]])],
        )
        .unwrap()
    }

    #[test]
    fn test_format_names_round_trip() {
        for format in [
            EncodingFormat::Sat,
            EncodingFormat::WpMaxSat,
            EncodingFormat::Pbo,
            EncodingFormat::PboMerged,
            EncodingFormat::MiniZinc,
            EncodingFormat::MiniZincOpt,
        ] {
            assert_eq!(format.to_string().parse(), Ok(format));
        }
        assert_eq!("WCNF".parse(), Ok(EncodingFormat::WpMaxSat));
        assert!("lp".parse::<EncodingFormat>().is_err());
    }

    #[test]
    fn test_dispatch() {
        let instance = crossed();
        assert!(encode(&instance, EncodingFormat::Sat).unwrap().starts_with("p cnf "));
        assert!(encode(&instance, EncodingFormat::WpMaxSat).unwrap().starts_with("p wcnf "));
        assert!(encode(&instance, EncodingFormat::Pbo).unwrap().starts_with("* #variable= "));
        assert!(encode(&instance, EncodingFormat::MiniZinc).unwrap().contains("solve satisfy;"));
    }
}
