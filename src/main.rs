mod debug_report;

use mission_forge::{Context, HostLimits, ModuleCatalog, ProfileRegistry, compile_verbose_with};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let ctx = match load_context(&config) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if config.list {
        debug_report::print_listing(&ctx, config.color);
        return;
    }

    let input = match config.input {
        Some(input) => input,
        None => match read_stdin_input() {
            Ok(input) => input,
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(2);
            }
        },
    };
    if input.trim().is_empty() {
        eprintln!("error: no input provided\n\n{}", help_text());
        std::process::exit(2);
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let res = compile_verbose_with(&input, &ctx, &mut rng);

    if config.json {
        match &res.result {
            Ok(mission) => match serde_json::to_string_pretty(mission) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    eprintln!("error: failed to serialize mission: {err}");
                    std::process::exit(1);
                }
            },
            Err(err) => eprintln!("{}", err.summary(5)),
        }
    } else {
        debug_report::print_run(&res, config.color);
    }

    if res.result.is_err() {
        std::process::exit(1);
    }
}

struct CliConfig {
    input: Option<String>,
    modules: Option<PathBuf>,
    profiles: Option<PathBuf>,
    limits: HostLimits,
    seed: Option<u64>,
    json: bool,
    list: bool,
    color: bool,
}

fn load_context(config: &CliConfig) -> Result<Context, mission_forge::LoadError> {
    let catalog = match &config.modules {
        Some(path) => ModuleCatalog::load(path)?,
        None => ModuleCatalog::new(),
    };
    let profiles = match &config.profiles {
        Some(dir) => ProfileRegistry::load_dir(dir)?,
        None => ProfileRegistry::new(),
    };
    Ok(Context::new(catalog, profiles).with_limits(config.limits))
}

fn parse_args() -> Result<CliConfig, String> {
    let mut config = CliConfig {
        input: None,
        modules: None,
        profiles: None,
        limits: HostLimits::default(),
        seed: None,
        json: false,
        list: false,
        color: io::stdout().is_terminal(),
    };
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("mission-forge {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => config.color = true,
            "--no-color" => config.color = false,
            "--json" => config.json = true,
            "--list" => config.list = true,
            "--no-multiple-bombs" => config.limits.multiple_bombs = false,
            "--no-factory" => config.limits.factory = false,
            "--ruleseed-modifier" => config.limits.rule_seed = true,
            "--modules" => config.modules = Some(PathBuf::from(expect_value(&mut args, "--modules")?)),
            "--profiles" => config.profiles = Some(PathBuf::from(expect_value(&mut args, "--profiles")?)),
            "--max-modules" => config.limits.max_modules = parse_number(&expect_value(&mut args, "--max-modules")?, "--max-modules")?,
            "--seed" => config.seed = Some(parse_number(&expect_value(&mut args, "--seed")?, "--seed")?),
            "--input" | "-i" => {
                let value = expect_value(&mut args, "--input")?;
                set_input(&mut config, value)?;
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    set_input(&mut config, rest)?;
                }
                break;
            }
            _ if arg.starts_with("--input=") => {
                let value = arg.trim_start_matches("--input=").to_string();
                set_input(&mut config, value)?;
            }
            _ if arg.starts_with("--seed=") => {
                config.seed = Some(parse_number(arg.trim_start_matches("--seed="), "--seed")?);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                set_input(&mut config, rest)?;
                break;
            }
        }
    }

    Ok(config)
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("error: {flag} expects a value"))
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T, String> {
    value.parse().map_err(|_| format!("error: invalid {flag} '{value}' (expected a non-negative integer)"))
}

fn set_input(config: &mut CliConfig, value: String) -> Result<(), String> {
    if config.input.is_some() {
        return Err("error: input provided multiple times".to_string());
    }
    config.input = Some(value);
    Ok(())
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "mission-forge {version}

Compile a dynamic mission description into a bomb configuration.

Usage:
  mission-forge [OPTIONS] [--] <mission...>
  mission-forge [OPTIONS] --input <text>
  mission-forge [OPTIONS] --list

Options:
  -i, --input <text>         Mission text. If omitted, reads remaining args
                             or stdin when no args are provided.
  --modules <file>           JSON module catalog ({{\"solvable\", \"needy\", \"disabled\"}}).
  --profiles <dir>           Directory of mod-selector profile *.json files.
  --max-modules <n>          Largest module count per bomb. Default: {max}
  --seed <n>                 Seed the random source for reproducible output.
  --no-multiple-bombs        Host lacks the multiple-bombs extension.
  --no-factory               Host lacks the factory extension.
  --ruleseed-modifier        Host has the rule-seed modifier installed.
  --json                     Print the compiled mission as JSON.
  --list                     List every pool keyword and module id.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Logging:
  RUST_LOG=mission_forge=debug shows scanner and parser traces.

Exit codes:
  0  Success.
  1  The mission has problems, or a snapshot failed to load.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        max = HostLimits::default().max_modules
    )
}
