//! AWS Lambda handler for running single simulations
//!
//! Accepts the form inputs as typed by the user (strings or numbers) and
//! returns the full simulation result, or a structured error naming the
//! offending field.
//!
//! Supports both direct invocation and Lambda Function URLs. A Function URL
//! event carries the request as a JSON string in `body` and expects an HTTP
//! shaped response back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use procapcred_simulator::{
    benchmark::{resolve_benchmark_from, BcbSelicProvider, CachedRateProvider},
    params::input::{parse_money, parse_percentage, parse_term},
    AmortizationMethod, Assumptions, BenchmarkRate, ClientClass, OperationKind, OperationParameters,
    RateFetchError, SimulationConfig, SimulationError, SimulationResult, Simulator,
};

/// How long a fetched SELIC is reused across warm invocations
const RATE_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// A form value that may arrive as a JSON number or as typed text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Number(f64),
    Text(String),
}

impl FormValue {
    fn money(&self, field: &str) -> Result<f64, SimulationError> {
        match self {
            FormValue::Number(n) => Ok(*n),
            FormValue::Text(raw) => parse_money(field, raw),
        }
    }

    fn percentage(&self, field: &str) -> Result<f64, SimulationError> {
        match self {
            FormValue::Number(n) => Ok(*n),
            FormValue::Text(raw) => parse_percentage(field, raw),
        }
    }

    fn months(&self, field: &str) -> Result<u32, SimulationError> {
        match self {
            FormValue::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64 => Ok(*n as u32),
            FormValue::Number(n) => Err(SimulationError::validation(
                field,
                format!("'{}' is not a whole number of months", n),
            )),
            FormValue::Text(raw) => parse_term(field, raw),
        }
    }
}

/// Input for one simulation
#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    pub principal: FormValue,

    pub term_months: FormValue,

    /// "direct" (default) or "indirect"
    #[serde(default)]
    pub operation_kind: Option<String>,

    pub cost_factor_pct: FormValue,

    pub program_rate_pct: FormValue,

    /// Indirect only; the layout default applies when omitted
    #[serde(default)]
    pub agent_factor_pct: Option<FormValue>,

    /// "business" (default) or "individual"
    #[serde(default)]
    pub client_class: Option<String>,

    /// "sac" (default) or "price"
    #[serde(default)]
    pub amortization: Option<String>,

    /// Closed-form CET with charges added on top
    #[serde(default)]
    pub legacy_cost: bool,

    /// Skip the fetch and use this benchmark rate (percent)
    #[serde(default)]
    pub selic_pct: Option<FormValue>,
}

impl SimulationRequest {
    fn params(&self) -> Result<OperationParameters, SimulationError> {
        let operation_kind = match &self.operation_kind {
            Some(raw) => OperationKind::parse(raw)?,
            None => OperationKind::Direct,
        };

        let agent_factor_pct = if operation_kind.uses_agent_factor() {
            match &self.agent_factor_pct {
                Some(value) => Some(value.percentage("agent_factor_pct")?),
                None => Some(operation_kind.field_layout().agent_factor_default),
            }
        } else {
            None
        };

        Ok(OperationParameters {
            principal: self.principal.money("principal")?,
            term_months: self.term_months.months("term_months")?,
            operation_kind,
            cost_factor_pct: self.cost_factor_pct.percentage("cost_factor_pct")?,
            program_rate_pct: self.program_rate_pct.percentage("program_rate_pct")?,
            agent_factor_pct,
            client_class: match &self.client_class {
                Some(raw) => ClientClass::parse(raw)?,
                None => ClientClass::default(),
            },
        })
    }

    fn config(&self) -> Result<SimulationConfig, SimulationError> {
        let mut config = if self.legacy_cost {
            SimulationConfig::legacy()
        } else {
            SimulationConfig::default()
        };
        if let Some(raw) = &self.amortization {
            config.amortization = AmortizationMethod::parse(raw).ok_or_else(|| {
                SimulationError::validation("amortization", format!("unknown amortization method '{}'", raw))
            })?;
        }
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ErrorBody {
    fn bad_request(message: impl Into<String>) -> Self {
        ErrorBody {
            kind: "invalid_request",
            field: None,
            message: message.into(),
        }
    }
}

impl From<&SimulationError> for ErrorBody {
    fn from(err: &SimulationError) -> Self {
        let (kind, field) = match err {
            SimulationError::Validation { field, .. } => ("validation", Some(field.clone())),
            SimulationError::ArithmeticDomain { .. } => ("arithmetic_domain", None),
            SimulationError::UnsolvableIrr { .. } => ("unsolvable_irr", None),
            SimulationError::Cancelled => ("cancelled", None),
        };
        ErrorBody {
            kind,
            field,
            message: err.to_string(),
        }
    }
}

/// Output for one invocation
#[derive(Debug, Serialize)]
pub struct SimulationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SimulationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub execution_time_ms: u64,
}

impl SimulationResponse {
    fn status(&self) -> u16 {
        match &self.error {
            None => 200,
            Some(body) if matches!(body.kind, "invalid_request" | "validation" | "arithmetic_domain") => 400,
            Some(_) => 500,
        }
    }
}

/// State shared across warm invocations
struct HandlerState {
    assumptions: Assumptions,
    /// An HTTP client that failed to build resolves to the default rate
    provider: Result<CachedRateProvider<BcbSelicProvider>, RateFetchError>,
}

async fn simulate_request(state: &HandlerState, request: &SimulationRequest) -> Result<SimulationResult, SimulationError> {
    let params = request.params()?;
    let simulator = Simulator::new(state.assumptions.clone(), request.config()?);

    match &request.selic_pct {
        Some(value) => {
            let benchmark = BenchmarkRate::supplied(value.percentage("selic_pct")?);
            simulator.simulate(&params, benchmark)
        }
        None => {
            params.validate()?;
            let benchmark = resolve_benchmark_from(
                &state.provider,
                simulator.config().fetch_timeout,
                state.assumptions.default_benchmark_pct,
            )
            .await;
            simulator.simulate(&params, benchmark)
        }
    }
}

async fn respond(state: &HandlerState, payload: &Value) -> SimulationResponse {
    let start = Instant::now();

    let outcome = match serde_json::from_value::<SimulationRequest>(payload.clone()) {
        Ok(request) => simulate_request(state, &request).await.map_err(|err| {
            if err.is_input_error() {
                info!("rejected request: {}", err);
            } else {
                warn!("simulation failed: {}", err);
            }
            ErrorBody::from(&err)
        }),
        Err(err) => Err(ErrorBody::bad_request(format!("Invalid JSON: {}", err))),
    };

    let (result, error) = match outcome {
        Ok(result) => (Some(result), None),
        Err(body) => (None, Some(body)),
    };

    SimulationResponse {
        result,
        error,
        execution_time_ms: start.elapsed().as_millis() as u64,
    }
}

/// Extract the request from a Function URL event, or `None` for a direct invoke
fn url_request_body(event: &Value) -> Option<Result<Value, ErrorBody>> {
    let body = event.get("body")?;
    if event.get("isBase64Encoded").and_then(Value::as_bool).unwrap_or(false) {
        return Some(Err(ErrorBody::bad_request("base64-encoded bodies are not supported")));
    }
    Some(match body {
        Value::String(text) if text.trim().is_empty() => Ok(json!({})),
        Value::String(text) => {
            serde_json::from_str(text).map_err(|e| ErrorBody::bad_request(format!("Invalid JSON: {}", e)))
        }
        Value::Null => Ok(json!({})),
        other => Ok(other.clone()),
    })
}

fn http_method(event: &Value) -> Option<&str> {
    event.pointer("/requestContext/http/method").and_then(Value::as_str)
}

fn cors_headers() -> Value {
    json!({
        "Content-Type": "application/json",
        "Access-Control-Allow-Origin": "*",
        "Access-Control-Allow-Methods": "POST, OPTIONS",
        "Access-Control-Allow-Headers": "Content-Type",
    })
}

fn http_response(response: &SimulationResponse) -> Result<Value, Error> {
    Ok(json!({
        "statusCode": response.status(),
        "headers": cors_headers(),
        "body": serde_json::to_string(response)?,
    }))
}

/// Lambda handler function
async fn handler(state: Arc<HandlerState>, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, _context) = event.into_parts();

    if http_method(&payload) == Some("OPTIONS") {
        return Ok(json!({ "statusCode": 200, "headers": cors_headers(), "body": "" }));
    }

    match url_request_body(&payload) {
        Some(Ok(request)) => http_response(&respond(&state, &request).await),
        Some(Err(body)) => http_response(&SimulationResponse {
            result: None,
            error: Some(body),
            execution_time_ms: 0,
        }),
        None => Ok(serde_json::to_value(respond(&state, &payload).await)?),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let state = Arc::new(HandlerState {
        assumptions: Assumptions::canonical(),
        provider: BcbSelicProvider::new(SimulationConfig::default().fetch_timeout)
            .map(|provider| CachedRateProvider::new(provider, RATE_CACHE_TTL)),
    });

    run(service_fn(move |event: LambdaEvent<Value>| {
        let state = state.clone();
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> HandlerState {
        HandlerState {
            assumptions: Assumptions::canonical(),
            provider: BcbSelicProvider::with_url("http://127.0.0.1:9/unreachable", Duration::from_millis(50))
                .map(|provider| CachedRateProvider::new(provider, RATE_CACHE_TTL)),
        }
    }

    #[test]
    fn test_request_accepts_text_and_numbers() {
        let request: SimulationRequest = serde_json::from_value(json!({
            "principal": "R$ 10.000,00",
            "term_months": 12,
            "operation_kind": "indireta",
            "cost_factor_pct": "2,5",
            "program_rate_pct": 6.0,
            "client_class": "pf"
        }))
        .unwrap();
        let params = request.params().unwrap();

        assert_eq!(params.principal, 10000.0);
        assert_eq!(params.term_months, 12);
        assert_eq!(params.operation_kind, OperationKind::Indirect);
        assert_eq!(params.cost_factor_pct, 2.5);
        assert_eq!(params.agent_factor_pct, Some(3.0));
        assert_eq!(params.client_class, ClientClass::Individual);
    }

    #[test]
    fn test_direct_ignores_agent_factor() {
        let request: SimulationRequest = serde_json::from_value(json!({
            "principal": 5000,
            "term_months": "24",
            "cost_factor_pct": 1,
            "program_rate_pct": 4,
            "agent_factor_pct": 9
        }))
        .unwrap();
        let params = request.params().unwrap();
        assert_eq!(params.operation_kind, OperationKind::Direct);
        assert_eq!(params.agent_factor_pct, None);
    }

    #[test]
    fn test_fractional_term_rejected() {
        let value = FormValue::Number(12.5);
        assert!(matches!(
            value.months("term_months"),
            Err(SimulationError::Validation { field, .. }) if field == "term_months"
        ));
    }

    #[test]
    fn test_unknown_amortization_rejected() {
        let request: SimulationRequest = serde_json::from_value(json!({
            "principal": 5000, "term_months": 12, "cost_factor_pct": 1,
            "program_rate_pct": 4, "amortization": "german"
        }))
        .unwrap();
        assert!(request.config().is_err());
    }

    #[test]
    fn test_url_body_is_unwrapped() {
        let event = json!({
            "body": "{\"principal\": 1000}",
            "isBase64Encoded": false,
            "requestContext": { "http": { "method": "POST" } }
        });
        let body = url_request_body(&event).unwrap().unwrap();
        assert_eq!(body["principal"], 1000);
        assert_eq!(http_method(&event), Some("POST"));

        assert!(url_request_body(&json!({ "principal": 1000 })).is_none());
    }

    #[tokio::test]
    async fn test_respond_with_supplied_selic() {
        let response = respond(
            &state(),
            &json!({
                "principal": "10000", "term_months": 12, "cost_factor_pct": 2.5,
                "program_rate_pct": 6, "selic_pct": "10,5"
            }),
        )
        .await;

        assert_eq!(response.status(), 200);
        let result = response.result.unwrap();
        assert_eq!(result.benchmark.annual_pct, 10.5);
        assert_eq!(result.schedule.len(), 12);
    }

    #[tokio::test]
    async fn test_respond_reports_offending_field() {
        let response = respond(
            &state(),
            &json!({
                "principal": "0", "term_months": 12, "cost_factor_pct": 2.5, "program_rate_pct": 6
            }),
        )
        .await;

        assert_eq!(response.status(), 400);
        let error = response.error.unwrap();
        assert_eq!(error.kind, "validation");
        assert_eq!(error.field.as_deref(), Some("principal"));
    }

    #[tokio::test]
    async fn test_missing_client_uses_default_rate() {
        let state = HandlerState {
            assumptions: Assumptions::canonical(),
            provider: Err(RateFetchError::Empty),
        };
        let response = respond(
            &state,
            &json!({ "principal": 1000, "term_months": 12, "cost_factor_pct": 7, "program_rate_pct": 5 }),
        )
        .await;

        assert_eq!(response.status(), 200);
        let result = response.result.unwrap();
        assert!(result.benchmark.used_fallback());
        assert_eq!(result.benchmark.annual_pct, Assumptions::canonical().default_benchmark_pct);
    }

    #[tokio::test]
    async fn test_oversized_term_rejected() {
        let response = respond(
            &state(),
            &json!({
                "principal": 1000, "term_months": 2_147_483_648u64, "cost_factor_pct": 7,
                "program_rate_pct": 5, "selic_pct": 10
            }),
        )
        .await;

        assert_eq!(response.status(), 400);
        assert_eq!(response.error.unwrap().field.as_deref(), Some("term_months"));
    }

    #[tokio::test]
    async fn test_malformed_request_is_bad_request() {
        let response = respond(&state(), &json!({ "principal": "1000" })).await;
        assert_eq!(response.status(), 400);
        assert_eq!(response.error.unwrap().kind, "invalid_request");
    }
}
