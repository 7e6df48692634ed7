//! CLI subcommand handlers for promptsweep.
//!
//! Functions are kept here so main.rs stays focused on argument parsing and
//! routing. The handlers own the tokio runtime; the sweep itself runs
//! sequentially inside `block_on`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::config::loader::load_config;
use crate::corpus::load_prompts;
use crate::errors::SweepConfigError;
use crate::providers::factory;
use crate::runner::{run_sweep, ErrorPolicy, RunSpec};
use crate::sweep::{
    build_sweep, OptionSet, OptionValue, ParamSpec, SweepStrategy, SweptAxis,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Vary one parameter at a time against the base options.
    Independent,
    /// Run the full cross-product of all swept parameters.
    Cartesian,
}

impl From<StrategyArg> for SweepStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Independent => SweepStrategy::Independent,
            StrategyArg::Cartesian => SweepStrategy::Cartesian,
        }
    }
}

/// Arguments for `promptsweep run`.
///
/// Each sweepable parameter has the four-flag family `(value, min, max,
/// inc)`; giving both min and max switches that parameter into range mode.
/// Temperature always joins the sweep; top-k and top-p join only when one
/// of their flags is present.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Model to test (defaults to the configured model).
    #[arg(long)]
    pub model: Option<String>,

    /// Test group to run (all groups when absent).
    #[arg(long)]
    pub group: Option<String>,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: i64,

    /// Max tokens to generate.
    #[arg(long)]
    pub num_predict: Option<i64>,

    /// How swept parameters combine into option sets.
    #[arg(long, value_enum, default_value = "independent")]
    pub strategy: StrategyArg,

    /// Log failed inference calls and keep going instead of aborting.
    #[arg(long)]
    pub continue_on_error: bool,

    /// Prompt corpus root, one subdirectory per group (defaults to the
    /// configured directory).
    #[arg(long)]
    pub prompts_dir: Option<String>,

    /// Directory the timestamped results root is created under.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Backend base URL (overrides the config file).
    #[arg(long)]
    pub api_base: Option<String>,

    // Temperature
    /// Temperature.
    #[arg(long, default_value_t = 1.0)]
    pub temp: f64,

    /// Temperature min.
    #[arg(long)]
    pub temp_min: Option<f64>,

    /// Temperature max.
    #[arg(long)]
    pub temp_max: Option<f64>,

    /// How much the temperature increases between min and max.
    #[arg(long, default_value_t = 0.1)]
    pub temp_inc: f64,

    // Top_k
    /// Number of top scoring predictions to consider.
    #[arg(long)]
    pub top_k: Option<i64>,

    /// Minimum number of top K predictions to consider.
    #[arg(long)]
    pub top_k_min: Option<i64>,

    /// Maximum number of top K predictions to consider.
    #[arg(long)]
    pub top_k_max: Option<i64>,

    /// How much top K increases between min and max.
    #[arg(long, default_value_t = 1)]
    pub top_k_inc: i64,

    // Top_p
    /// Nucleus sampling cutoff.
    #[arg(long)]
    pub top_p: Option<f64>,

    /// Top P min.
    #[arg(long)]
    pub top_p_min: Option<f64>,

    /// Top P max.
    #[arg(long)]
    pub top_p_max: Option<f64>,

    /// How much top P increases between min and max.
    #[arg(long, default_value_t = 0.05)]
    pub top_p_inc: f64,
}

/// Build the parameter specs from the flag families. All sweep
/// configuration errors surface here, before any I/O.
pub(crate) fn build_param_specs(args: &RunArgs) -> Result<Vec<ParamSpec>, SweepConfigError> {
    let mut specs = vec![ParamSpec::float(
        "temperature",
        "temp",
        args.temp,
        args.temp_min,
        args.temp_max,
        args.temp_inc,
    )?];

    if args.top_k.is_some() || args.top_k_min.is_some() || args.top_k_max.is_some() {
        specs.push(ParamSpec::int(
            "top_k",
            "top_k",
            args.top_k.unwrap_or(1),
            args.top_k_min,
            args.top_k_max,
            args.top_k_inc,
        )?);
    }

    if args.top_p.is_some() || args.top_p_min.is_some() || args.top_p_max.is_some() {
        specs.push(ParamSpec::float(
            "top_p",
            "top_p",
            args.top_p.unwrap_or(1.0),
            args.top_p_min,
            args.top_p_max,
            args.top_p_inc,
        )?);
    }

    Ok(specs)
}

fn fmt_values(values: &[OptionValue]) -> String {
    let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

/// Run the sweep.
pub fn cmd_run(args: RunArgs) -> Result<()> {
    let config = load_config(None);

    // Validate the sweep configuration before touching the corpus or the
    // backend; a bad range must not leave a partial run behind.
    let specs = build_param_specs(&args)?;
    let strategy = SweepStrategy::from(args.strategy);

    let model = args
        .model
        .clone()
        .unwrap_or_else(|| config.backend.default_model.clone());
    let num_predict = args.num_predict.map_or(OptionValue::Null, OptionValue::Int);

    println!("Selected options:");
    println!("  Model: {model}");
    println!("  Random seed: {}", args.seed);
    println!("  Max tokens: {num_predict}");
    for spec in &specs {
        println!("  {} values: {}", spec.name, fmt_values(&spec.expand()));
    }

    let mut base = OptionSet::new();
    base.set("seed", OptionValue::Int(args.seed));
    base.set("num_predict", num_predict);

    let axes: Vec<SweptAxis> = specs.iter().map(SweptAxis::from_spec).collect();
    let points = build_sweep(&base, &axes, strategy);

    let prompts_dir = args
        .prompts_dir
        .clone()
        .unwrap_or_else(|| config.prompts_dir.clone());
    let groups = load_prompts(Path::new(&prompts_dir))?;

    let provider = factory::from_backend_config(&config.backend, args.api_base.as_deref());

    let run_spec = RunSpec {
        model,
        group_filter: args.group.clone(),
        error_policy: if args.continue_on_error {
            ErrorPolicy::Continue
        } else {
            ErrorPolicy::Abort
        },
        output_dir: args.output_dir.clone(),
    };

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let root = runtime.block_on(run_sweep(provider.as_ref(), &groups, &points, &run_spec))?;

    println!("Results written to {}", root.display());
    Ok(())
}

/// List the prompt groups found in the corpus.
pub fn cmd_groups(prompts_dir: Option<String>) -> Result<()> {
    let config = load_config(None);
    let dir = prompts_dir.unwrap_or_else(|| config.prompts_dir.clone());
    let groups = load_prompts(Path::new(&dir))?;

    if groups.is_empty() {
        println!("No prompt groups found in {dir}");
        return Ok(());
    }
    for group in &groups {
        println!(
            "{} ({} prompt{})",
            group.name,
            group.len(),
            if group.len() == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
