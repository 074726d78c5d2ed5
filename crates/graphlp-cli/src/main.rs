use clap::{Parser, Subcommand, ValueEnum};
use graphlp_lang::{CompiledProblem, Compiler, Program};
use graphlp_solver::{Solution, SolutionStatus, Solver, EPSILON};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "graphlp")]
#[command(about = "Solve two-variable linear programs with the graphical method", long_about = None)]
struct Cli {
    /// Log solver and compiler events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a .glp file and output the AST
    Parse {
        /// The file to parse
        file: PathBuf,
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// Check a .glp file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Solve a problem and output the optimal vertex
    Solve {
        /// The file containing the problem
        file: PathBuf,
        /// The problem to solve; may be omitted when the file holds only one
        problem: Option<String>,
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
        /// Tolerance for feasibility and point comparisons
        #[arg(short, long, default_value_t = EPSILON)]
        tolerance: f64,
        /// Show binding constraints, slacks and alternative optima
        #[arg(short, long)]
        analysis: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Parse { file, format } => {
            let program = parse_file(&file);
            match format {
                Format::Json => match serde_json::to_string_pretty(&program) {
                    Ok(json) => println!("{}", json),
                    Err(e) => fail("Error serializing AST", e),
                },
                Format::Pretty => println!("{:#?}", program),
            }
        }
        Commands::Check { file } => {
            let program = parse_file(&file);
            let compiler = load(&program);
            match compiler.compile_all() {
                Ok(problems) => {
                    println!("✓ {} is valid", file.display());
                    for p in &problems {
                        println!(
                            "  {}: {} {}, {} constraints",
                            p.name,
                            p.lp_problem.objective.direction,
                            p.lp_problem.variables.join("/"),
                            p.lp_problem.num_constraints()
                        );
                    }
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Solve {
            file,
            problem,
            format,
            tolerance,
            analysis,
        } => {
            let program = parse_file(&file);
            let compiler = load(&program);
            let name = match problem {
                Some(name) => name,
                None => compiler
                    .default_problem_name()
                    .unwrap_or_else(|e| fail("Compile error", e)),
            };
            let compiled = compiler
                .compile_problem(&name)
                .unwrap_or_else(|e| fail("Compile error", e));

            let solution = Solver::new()
                .with_tolerance(tolerance)
                .solve(&compiled.lp_problem)
                .unwrap_or_else(|e| fail("Solve error", e));

            match format {
                Format::Json => {
                    let output = serde_json::json!({
                        "problem": compiled.name,
                        "name": compiled.display_name,
                        "description": compiled.description,
                        "lp": compiled.lp_problem,
                        "solution": solution,
                    });
                    match serde_json::to_string_pretty(&output) {
                        Ok(json) => println!("{}", json),
                        Err(e) => fail("Error serializing solution", e),
                    }
                }
                Format::Pretty => match render_pretty(&compiled, &solution, analysis) {
                    Ok(text) => print!("{}", text),
                    Err(e) => fail("Error rendering solution", e),
                },
            }

            let code = exit_code(&solution);
            if code != 0 {
                std::process::exit(code);
            }
        }
    }
}

/// Process status for a finished solve: 1 when no feasible point exists.
fn exit_code(solution: &Solution) -> i32 {
    match solution.status {
        SolutionStatus::Optimal => 0,
        SolutionStatus::Infeasible => 1,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("graphlp_solver=debug,graphlp_lang=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, e);
    std::process::exit(1);
}

fn parse_file(file: &Path) -> Program {
    let source = std::fs::read_to_string(file).unwrap_or_else(|e| fail("Error reading file", e));
    graphlp_lang::Parser::parse(&source).unwrap_or_else(|e| fail("Parse error", e))
}

fn load(program: &Program) -> Compiler {
    let mut compiler = Compiler::new();
    if let Err(e) = compiler.load(program) {
        fail("Compile error", e);
    }
    compiler
}

fn render_pretty(compiled: &CompiledProblem, solution: &Solution, analysis: bool) -> Result<String, std::fmt::Error> {
    use std::fmt::Write;

    let lp = &compiled.lp_problem;
    let [x, y] = &lp.variables;
    let mut out = String::new();

    writeln!(out, "Problem: {}", compiled.display_name.as_deref().unwrap_or(&compiled.name))?;
    if let Some(desc) = &compiled.description {
        writeln!(out, "Description: {}", desc)?;
    }
    writeln!(out, "Objective: {}", lp.objective.describe(x, y))?;
    writeln!(out)?;

    writeln!(out, "Constraints:")?;
    for c in &lp.constraints {
        writeln!(out, "  {:12} {}", c.name, lp.describe_constraint(c))?;
    }
    writeln!(out)?;

    match solution.status {
        SolutionStatus::Optimal => {
            writeln!(out, "Feasible region vertices:")?;
            for v in &solution.vertices {
                writeln!(out, "  {:.2}", v)?;
            }
            writeln!(out)?;

            writeln!(out, "Status: OPTIMAL")?;
            if let Some(optimum) = &solution.optimum {
                writeln!(out, "  {} = {:.2}", x, optimum.point.x)?;
                writeln!(out, "  {} = {:.2}", y, optimum.point.y)?;
                writeln!(out, "Objective value: {:.2}", optimum.value)?;
            }

            if analysis {
                let report = &solution.analysis;
                writeln!(out)?;
                writeln!(out, "Analysis:")?;
                if !report.binding_constraints.is_empty() {
                    writeln!(out, "Binding constraints:")?;
                    for name in &report.binding_constraints {
                        writeln!(out, "  - {}", name)?;
                    }
                }
                writeln!(out, "Slacks:")?;
                for s in &report.slacks {
                    writeln!(
                        out,
                        "  {:12} lhs {:10.2}  slack {:10.2}{}",
                        s.constraint,
                        s.lhs,
                        s.slack,
                        if s.binding { "  (binding)" } else { "" }
                    )?;
                }
                if !report.alternative_optima.is_empty() {
                    writeln!(out, "Alternative optima:")?;
                    for p in &report.alternative_optima {
                        writeln!(out, "  {:.2}", p)?;
                    }
                }
            }
        }
        SolutionStatus::Infeasible => {
            writeln!(out, "Status: INFEASIBLE")?;
            writeln!(out, "No point satisfies all constraints.")?;
            for conflict in &solution.conflicts {
                writeln!(out, "  [{}] {}", conflict.constraints.join(", "), conflict.description)?;
            }
        }
    }

    Ok(out)
}
