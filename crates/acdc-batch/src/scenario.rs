use acdc_solver::AcDcOptions;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One named (AC case, DC case, options) triple executed as a unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ac_case_id: String,
    pub dc_case_id: String,
    pub options: AcDcOptions,
}

impl ScenarioDefinition {
    pub fn new(
        name: impl Into<String>,
        ac_case_id: impl Into<String>,
        dc_case_id: impl Into<String>,
        options: AcDcOptions,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            ac_case_id: ac_case_id.into(),
            dc_case_id: dc_case_id.into(),
            options,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered, validated list of scenarios for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSuite {
    scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioSuite {
    /// Validate and wrap a scenario list. Empty lists and repeated names are
    /// rejected before anything runs.
    pub fn new(scenarios: Vec<ScenarioDefinition>) -> Result<Self> {
        if scenarios.is_empty() {
            bail!("scenario suite contains no scenarios");
        }
        let mut seen = HashSet::new();
        for scenario in &scenarios {
            if scenario.name.trim().is_empty() {
                bail!("scenario names must not be empty");
            }
            if !seen.insert(scenario.name.as_str()) {
                bail!("duplicate scenario name '{}'", scenario.name);
            }
        }
        Ok(Self { scenarios })
    }

    /// The standard MatACDC regression cases, solver output silenced.
    pub fn builtin() -> Self {
        let quiet = AcDcOptions::quiet();
        let scenarios = vec![
            ScenarioDefinition::new(
                "test1_slack",
                "case5_stagg",
                "case5_stagg_MTDCslack",
                quiet.clone(),
            )
            .with_description("Voltage slack control"),
            ScenarioDefinition::new(
                "test2_droop",
                "case5_stagg",
                "case5_stagg_MTDCdroop",
                quiet.clone(),
            )
            .with_description("Voltage droop control"),
            ScenarioDefinition::new(
                "test3_inf",
                "case3_inf",
                "case5_stagg_MTDCdroop",
                quiet.clone(),
            )
            .with_description("Infinite grid"),
            ScenarioDefinition::new(
                "test4_multi",
                "case24_ieee_rts1996_3zones",
                "case24_ieee_rts1996_MTDC",
                quiet,
            )
            .with_description("Multiple AC and DC systems"),
        ];
        Self { scenarios }
    }

    /// Apply the output flag to every scenario.
    pub fn with_suppressed_output(mut self, suppress: bool) -> Self {
        for scenario in &mut self.scenarios {
            scenario.options.suppress_output = suppress;
        }
        self
    }

    pub fn scenarios(&self) -> &[ScenarioDefinition] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.iter().map(|s| s.name.as_str())
    }
}

/// On-disk suite layout. Option maps are partial: scenario options overlay
/// the suite `defaults`, which overlay the quiet harness defaults.
#[derive(Debug, Clone, Deserialize)]
struct SuiteFile {
    #[serde(default)]
    defaults: Map<String, Value>,
    #[serde(default)]
    scenarios: Vec<ScenarioSpec>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScenarioSpec {
    name: String,
    description: Option<String>,
    ac_case: String,
    dc_case: String,
    #[serde(default)]
    options: Map<String, Value>,
}

fn resolve_options(layers: &[&Map<String, Value>]) -> Result<AcDcOptions> {
    let mut merged = match serde_json::to_value(AcDcOptions::quiet())? {
        Value::Object(map) => map,
        _ => return Err(anyhow!("options did not serialize to an object")),
    };
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(Value::Object(merged)).context("resolving solver options")
}

fn parse_suite_file(data: &str, path: &Path) -> Result<SuiteFile> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(data).context("parsing scenario suite yaml")
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(data).context("parsing scenario suite json")
        }
        _ => serde_yaml::from_str(data)
            .or_else(|_| serde_json::from_str(data))
            .context("parsing scenario suite"),
    }
}

/// Load a suite from YAML or JSON.
pub fn load_suite(path: &Path) -> Result<ScenarioSuite> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading scenario suite '{}'", path.display()))?;
    let file = parse_suite_file(&data, path)?;
    let scenarios = file
        .scenarios
        .into_iter()
        .map(|spec| {
            let options = resolve_options(&[&file.defaults, &spec.options])
                .with_context(|| format!("scenario '{}'", spec.name))?;
            Ok(ScenarioDefinition {
                name: spec.name,
                description: spec.description,
                ac_case_id: spec.ac_case,
                dc_case_id: spec.dc_case,
                options,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    ScenarioSuite::new(scenarios)
        .with_context(|| format!("validating scenario suite '{}'", path.display()))
}
