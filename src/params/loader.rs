//! Load batches of operation parameters from a scenarios CSV
//!
//! Expected columns: `principal,term_months,operation_kind,cost_factor_pct,
//! program_rate_pct,agent_factor_pct,client_class`. The last two may be blank;
//! a blank agent factor on an indirect row takes the layout default.

use super::input::{parse_money, parse_percentage, parse_term};
use super::{ClientClass, OperationKind, OperationParameters};
use crate::error::{ConfigError, SimulationError};
use csv::Reader;
use std::path::Path;

/// Raw CSV row; monetary and percentage cells are kept as typed by the user
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    principal: String,
    term_months: String,
    operation_kind: String,
    cost_factor_pct: String,
    program_rate_pct: String,
    #[serde(default)]
    agent_factor_pct: Option<String>,
    #[serde(default)]
    client_class: Option<String>,
}

impl CsvRow {
    fn to_params(self) -> Result<OperationParameters, SimulationError> {
        let operation_kind = OperationKind::parse(&self.operation_kind)?;

        // A blank agent factor on an indirect row takes the layout default
        let agent_factor_pct = match non_blank(self.agent_factor_pct) {
            Some(raw) => Some(parse_percentage("agent_factor_pct", &raw)?),
            None if operation_kind.uses_agent_factor() => Some(operation_kind.field_layout().agent_factor_default),
            None => None,
        };

        let client_class = match non_blank(self.client_class) {
            Some(raw) => ClientClass::parse(&raw)?,
            None => ClientClass::default(),
        };

        Ok(OperationParameters {
            principal: parse_money("principal", &self.principal)?,
            term_months: parse_term("term_months", &self.term_months)?,
            operation_kind,
            cost_factor_pct: parse_percentage("cost_factor_pct", &self.cost_factor_pct)?,
            program_rate_pct: parse_percentage("program_rate_pct", &self.program_rate_pct)?,
            agent_factor_pct,
            client_class,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Load all scenarios from a CSV file
pub fn load_scenarios<P: AsRef<Path>>(path: P) -> Result<Vec<OperationParameters>, ConfigError> {
    let reader = Reader::from_path(path)?;
    collect_rows(reader)
}

/// Load scenarios from any reader (e.g., string buffer, request body)
pub fn load_scenarios_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<OperationParameters>, ConfigError> {
    collect_rows(Reader::from_reader(reader))
}

fn collect_rows<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<OperationParameters>, ConfigError> {
    let mut scenarios = Vec::new();

    for (idx, result) in reader.deserialize().enumerate() {
        let row: CsvRow = result?;
        let params = row
            .to_params()
            .map_err(|source| ConfigError::InvalidRow { row: idx + 1, source })?;
        scenarios.push(params);
    }

    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DEFAULT_AGENT_FACTOR_PCT;

    const SCENARIOS: &str = "\
principal,term_months,operation_kind,cost_factor_pct,program_rate_pct,agent_factor_pct,client_class
\"R$ 10.000,00\",12,direct,7,5,,
25000.50,36,indireta,\"6,5\",1.5,3,individual
";

    #[test]
    fn test_load_scenarios_from_reader() {
        let scenarios = load_scenarios_from_reader(SCENARIOS.as_bytes()).unwrap();
        assert_eq!(scenarios.len(), 2);

        let first = &scenarios[0];
        assert_eq!(first.principal, 10000.0);
        assert_eq!(first.operation_kind, OperationKind::Direct);
        assert_eq!(first.agent_factor_pct, None);
        assert_eq!(first.client_class, ClientClass::Business);

        let second = &scenarios[1];
        assert_eq!(second.term_months, 36);
        assert_eq!(second.operation_kind, OperationKind::Indirect);
        assert_eq!(second.cost_factor_pct, 6.5);
        assert_eq!(second.agent_factor_pct, Some(3.0));
        assert_eq!(second.client_class, ClientClass::Individual);
    }

    #[test]
    fn test_blank_agent_factor_on_indirect_row_uses_default() {
        let data = "\
principal,term_months,operation_kind,cost_factor_pct,program_rate_pct,agent_factor_pct,client_class
\"25.000,00\",36,indireta,\"1,8\",\"4,5\",,pf
";
        let scenarios = load_scenarios_from_reader(data.as_bytes()).unwrap();
        assert_eq!(scenarios[0].agent_factor_pct, Some(DEFAULT_AGENT_FACTOR_PCT));
        assert!(scenarios[0].validate().is_ok());
    }

    #[test]
    fn test_bad_row_reports_position() {
        let data = "\
principal,term_months,operation_kind,cost_factor_pct,program_rate_pct,agent_factor_pct,client_class
1000,12,direct,7,5,,
1000,twelve,direct,7,5,,
";
        match load_scenarios_from_reader(data.as_bytes()) {
            Err(ConfigError::InvalidRow { row, source }) => {
                assert_eq!(row, 2);
                assert!(matches!(source, SimulationError::Validation { .. }));
            }
            other => panic!("expected invalid row, got {:?}", other.map(|v| v.len())),
        }
    }
}
