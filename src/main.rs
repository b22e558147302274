use clap::{Parser, Subcommand, ValueEnum};
use smti::encode::{EncodingFormat, encode};
use smti::instance::ScoreMatrix;
use smti::io::{TextStyle, format_instance, read_instance, read_score_matrix};
use smti::{
    AgentId, GeneratorConfig, Instance, Matching, ModelConfig, PreprocessMode,
    StabilityFormulation, StabilityModel, preprocess,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, warn};

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "smti")]
#[command(about = "smti - Maximum stable matchings with ties and incomplete lists")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// CLI preprocessing mode selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliPreprocessMode {
    /// Skip last-rank checks and must-allocate tracking
    Quick,
    /// Full reduction with must-allocate agents
    Complete,
}

impl From<CliPreprocessMode> for PreprocessMode {
    fn from(cli: CliPreprocessMode) -> Self {
        match cli {
            CliPreprocessMode::Quick => PreprocessMode::Quick,
            CliPreprocessMode::Complete => PreprocessMode::Complete,
        }
    }
}

/// CLI stability constraint selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormulation {
    /// One row per compatible pair
    Single,
    /// One row per tie group, with rank indicators
    Merged,
}

impl From<CliFormulation> for StabilityFormulation {
    fn from(cli: CliFormulation) -> Self {
        match cli {
            CliFormulation::Single => StabilityFormulation::Single,
            CliFormulation::Merged => StabilityFormulation::Merged,
        }
    }
}

/// CLI output style for instance dumps
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum CliStyle {
    /// `1: 2 [3 4]`
    #[default]
    Standard,
    /// `1 2 (3 4)`
    Plain,
}

impl From<CliStyle> for TextStyle {
    fn from(cli: CliStyle) -> Self {
        match cli {
            CliStyle::Standard => TextStyle::standard(),
            CliStyle::Plain => TextStyle::plain(),
        }
    }
}

/// CLI encoding selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliEncoding {
    /// DIMACS CNF
    Sat,
    /// Weighted partial MaxSAT
    Wpmaxsat,
    /// Pseudo-Boolean optimisation
    Pbo,
    /// Pseudo-Boolean optimisation with merged stability rows
    PboMerged,
    /// MiniZinc satisfaction model
    Minizinc,
    /// MiniZinc optimisation model
    MinizincOpt,
}

impl From<CliEncoding> for EncodingFormat {
    fn from(cli: CliEncoding) -> Self {
        match cli {
            CliEncoding::Sat => EncodingFormat::Sat,
            CliEncoding::Wpmaxsat => EncodingFormat::WpMaxSat,
            CliEncoding::Pbo => EncodingFormat::Pbo,
            CliEncoding::PboMerged => EncodingFormat::PboMerged,
            CliEncoding::Minizinc => EncodingFormat::MiniZinc,
            CliEncoding::MinizincOpt => EncodingFormat::MiniZincOpt,
        }
    }
}

/// Where an instance comes from
#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Instance file
    file: PathBuf,
    /// Read the file as a score matrix instead of an instance snapshot
    #[arg(long)]
    grp: bool,
    /// Drop score-matrix entries below this value
    #[arg(long, requires = "grp")]
    threshold: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random instance
    Generate {
        /// Number of agents per side
        #[arg(long, default_value = "10")]
        size: usize,
        /// Number of partners each left agent lists
        #[arg(long, default_value = "5")]
        pref_length: usize,
        /// Probability that a partner ties with the previous one
        #[arg(long, default_value = "0.5")]
        tie_density: f64,
        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
        /// Write the instance here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Remove pairs that no maximum stable matching can use
    Preprocess {
        #[command(flatten)]
        input: InputArgs,
        /// Reduction mode
        #[arg(long, value_enum, default_value = "complete")]
        mode: CliPreprocessMode,
        /// Output style of the reduced instance
        #[arg(long, value_enum, default_value = "standard")]
        style: CliStyle,
        /// Write the reduced instance here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Find maximum stable matchings with the integer-programming model
    Solve {
        #[command(flatten)]
        input: InputArgs,
        /// Preprocess before building the model
        #[arg(long, value_enum)]
        preprocess: Option<CliPreprocessMode>,
        /// Stability constraint formulation
        #[arg(long, value_enum, default_value = "merged")]
        formulation: CliFormulation,
        /// Number of dummy agents to add to each side
        #[arg(long, default_value = "0")]
        dummies: usize,
        /// Require a pair, as LEFT:RIGHT (repeatable)
        #[arg(long, value_parser = parse_pair)]
        force: Vec<(AgentId, AgentId)>,
        /// Forbid a pair, as LEFT:RIGHT (repeatable)
        #[arg(long, value_parser = parse_pair)]
        avoid: Vec<(AgentId, AgentId)>,
        /// Enumerate every stable matching instead of one maximum
        #[arg(long)]
        all: bool,
    },
    /// Write the instance in an external solver format
    Encode {
        #[command(flatten)]
        input: InputArgs,
        /// Target format
        #[arg(long, value_enum)]
        format: CliEncoding,
        /// Write the encoding here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn parse_pair(s: &str) -> Result<(AgentId, AgentId), String> {
    let Some((left, right)) = s.split_once(':') else {
        return Err(format!("Invalid pair '{}'. Expected LEFT:RIGHT", s));
    };
    let left = left
        .trim()
        .parse()
        .map_err(|_| format!("Invalid left agent id '{}'", left))?;
    let right = right
        .trim()
        .parse()
        .map_err(|_| format!("Invalid right agent id '{}'", right))?;
    Ok((left, right))
}

// --- Commands ---

fn load_instance(input: &InputArgs) -> Result<Instance, Box<dyn std::error::Error>> {
    let instance = if input.grp {
        let matrix: ScoreMatrix = read_score_matrix(&input.file)?;
        Instance::from_scores(&matrix, input.threshold)
    } else {
        read_instance(&input.file)?
    };
    info!(
        "Loaded {}: {} left, {} right, {} pairs",
        input.file.display(),
        instance.num_left(),
        instance.num_right(),
        instance.num_pairs()
    );
    Ok(instance)
}

fn write_output(output: Option<&Path>, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            fs::write(path, text)?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn run_generate(
    config: &GeneratorConfig,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.pref_length > config.size {
        return Err(format!(
            "preference length {} exceeds instance size {}",
            config.pref_length, config.size
        )
        .into());
    }
    if !(0.0..=1.0).contains(&config.tie_density) {
        return Err(format!("tie density {} is not in [0, 1]", config.tie_density).into());
    }
    let instance = Instance::random(config);
    write_output(output, &format_instance(&instance, &TextStyle::standard()))
}

fn run_preprocess(
    input: &InputArgs,
    mode: PreprocessMode,
    style: &TextStyle,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut instance = load_instance(input)?;
    let report = preprocess(&mut instance, mode);
    if output.is_some() {
        println!(
            "Removed {} pairs in {} passes ({} must-allocate left, {} must-allocate right)",
            report.removed(),
            report.passes,
            report.must_allocate_left.len(),
            report.must_allocate_right.len()
        );
    }
    write_output(output, &format_instance(&instance, style))
}

struct SolveOptions {
    preprocess: Option<PreprocessMode>,
    formulation: StabilityFormulation,
    dummies: usize,
    force: Vec<(AgentId, AgentId)>,
    avoid: Vec<(AgentId, AgentId)>,
    all: bool,
}

/// Pairs between real agents only
fn without_dummies(instance: &Instance, matching: &Matching) -> Matching {
    let dummies = instance.dummy_ids();
    matching
        .iter()
        .filter(|(l, r)| !dummies.contains(l) && !dummies.contains(r))
        .collect()
}

fn check_stable(instance: &Instance, matching: &Matching) {
    let blocking = instance.blocking_pairs(matching);
    if blocking.is_empty() {
        debug!("Matching of size {} has no blocking pair", matching.len());
    } else {
        warn!("Solver returned a matching with blocking pairs {:?}", blocking);
    }
}

fn run_solve(input: &InputArgs, options: SolveOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut instance = load_instance(input)?;
    if let Some(mode) = options.preprocess {
        let report = preprocess(&mut instance, mode);
        info!(
            "Preprocessing ({}) removed {} pairs in {} passes",
            mode,
            report.removed(),
            report.passes
        );
    }
    instance.add_dummy(options.dummies);

    let mut model = StabilityModel::new(&instance, ModelConfig::new(options.formulation));
    model.force(&options.force)?;
    model.avoid(&options.avoid)?;

    if options.all {
        let mut count = 0;
        for matching in model.stable_matchings() {
            let matching = matching?;
            check_stable(&instance, &matching);
            let matching = without_dummies(&instance, &matching);
            count += 1;
            println!("Matching {} (size {}): {}", count, matching.len(), matching);
        }
        println!("Found {} stable matchings", count);
    } else {
        let matching = model.solve()?;
        check_stable(&instance, &matching);
        let matching = without_dummies(&instance, &matching);
        if matching.is_empty() {
            println!("No stable matching satisfies the constraints");
        } else {
            println!("Maximum stable matching size: {}", matching.len());
            println!("{}", matching);
        }
    }

    let stats = model.statistics();
    info!(
        "{} columns, {} rows, {} solves in {:?}",
        stats.columns, stats.rows, stats.solves, stats.solve_time
    );
    Ok(())
}

fn run_encode(
    input: &InputArgs,
    format: EncodingFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let instance = load_instance(input)?;
    write_output(output, &encode(&instance, format)?)
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let result = match args.command {
        Commands::Generate {
            size,
            pref_length,
            tie_density,
            seed,
            output,
        } => {
            let mut config = GeneratorConfig::new(size, pref_length, tie_density);
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            run_generate(&config, output.as_deref())
        }
        Commands::Preprocess {
            input,
            mode,
            style,
            output,
        } => run_preprocess(&input, mode.into(), &style.into(), output.as_deref()),
        Commands::Solve {
            input,
            preprocess,
            formulation,
            dummies,
            force,
            avoid,
            all,
        } => run_solve(
            &input,
            SolveOptions {
                preprocess: preprocess.map(Into::into),
                formulation: formulation.into(),
                dummies,
                force,
                avoid,
                all,
            },
        ),
        Commands::Encode {
            input,
            format,
            output,
        } => run_encode(&input, format.into(), output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
