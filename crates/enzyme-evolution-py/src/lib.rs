use enzyme_evolution_core::config::SimConfig;
use enzyme_evolution_core::genome::Genome;
use enzyme_evolution_core::Simulation;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Minimal PyO3 module exposing enzyme-evolution-core to Python.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pyfunction]
fn default_config_json() -> PyResult<String> {
    serde_json::to_string(&SimConfig::default())
        .map_err(|e| PyValueError::new_err(format!("failed to serialize default config: {e}")))
}

fn parse_config(config_json: &str) -> Result<SimConfig, String> {
    let config: SimConfig =
        serde_json::from_str(config_json).map_err(|e| format!("invalid config json: {e}"))?;
    config
        .validate()
        .map_err(|e| format!("invalid simulation configuration: {e}"))?;
    Ok(config)
}

fn run_summary(config_json: &str, until: f64, sample_every: f64) -> Result<String, String> {
    let config = parse_config(config_json)?;
    let mut sim = Simulation::new(config).map_err(|e| format!("failed to build simulation: {e}"))?;
    let summary = sim
        .run_experiment(until, sample_every)
        .map_err(|e| format!("invalid experiment parameters: {e}"))?;
    serde_json::to_string(&summary).map_err(|e| format!("failed to serialize summary: {e}"))
}

#[pyfunction]
fn validate_config_json(config_json: &str) -> PyResult<bool> {
    parse_config(config_json)
        .map(|_| true)
        .map_err(PyValueError::new_err)
}

/// Run a full experiment and return the summary as JSON.
#[pyfunction]
#[pyo3(signature = (config_json, until, sample_every=10.0))]
fn run_summary_json(config_json: &str, until: f64, sample_every: f64) -> PyResult<String> {
    run_summary(config_json, until, sample_every).map_err(PyValueError::new_err)
}

/// Decode a genome bit string into JSON with `header` and `enzymes`.
#[pyfunction]
fn decode_genome_json(genome: &str) -> PyResult<String> {
    let genome = Genome::parse(genome).map_err(|e| PyValueError::new_err(e.to_string()))?;
    serde_json::to_string(&genome.decode())
        .map_err(|e| PyValueError::new_err(format!("failed to serialize genome: {e}")))
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(default_config_json, m)?)?;
    m.add_function(wrap_pyfunction!(validate_config_json, m)?)?;
    m.add_function(wrap_pyfunction!(run_summary_json, m)?)?;
    m.add_function(wrap_pyfunction!(decode_genome_json, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_rejects_malformed_json() {
        let err = parse_config("{ not json").unwrap_err();
        assert!(err.starts_with("invalid config json"));
    }

    #[test]
    fn parse_config_rejects_invalid_values() {
        let err = parse_config(r#"{ "rows": 0 }"#).unwrap_err();
        assert!(err.starts_with("invalid simulation configuration"));
    }

    #[test]
    fn run_summary_reports_requested_end_time() {
        let config = r#"{ "rows": 6, "columns": 6, "seed_population": 4 }"#;
        let json = run_summary(config, 20.0, 5.0).expect("small run should succeed");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["end_time"], 20.0);
        assert_eq!(value["samples"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn run_summary_rejects_bad_sampling() {
        let err = run_summary("{}", 10.0, -1.0).unwrap_err();
        assert!(err.starts_with("invalid experiment parameters"));
    }
}
