use std::path::PathBuf;
use std::process::ExitCode;

use h_orbital::constants::{DEFAULT_COVERAGE, DEFAULT_POINTS, MIN_CLI_POINTS};
use h_orbital::pipeline::{default_output_name, evaluate_slice, spherical_harmonic_map};
use h_orbital::render::{
    render_mode_data, render_radial_distribution, save_png, FieldStyle,
};
use h_orbital::{
    auto_extent_a0, build_plane_grid, decide, enforce_scale, parse_quantum_numbers,
    radial_distribution, resolve_colormap, resolve_scale, OrbitalError, Overrides, Plane,
    RenderMode, ScaleEnforcement, ScaleRequest,
};

const USAGE: &str = "\
Usage: h-orbital n [l] [m] [options]

Plot analytic hydrogen orbital fields, radial profiles, and harmonics.
Missing l and m default to 0.

Options:
  --mode <mode>       density | real | imag | real_imag | radial_distribution |
                      spherical_harmonic (default: real)
  --plane <plane>     auto | x | y | z (default: auto)
  --value <a0>        constant coordinate of the slice plane (auto if omitted)
  --range <a0>        half-range of each visible axis (auto if omitted)
  --points <int>      samples per axis, at least 25 (default: 401)
  --cmap <name>       colormap, or the presets sample / sample_density
  --scale <scale>     auto | linear | log | symlog (default: linear)
  --colorbar          draw a colorbar (--no-colorbar to disable, the default)
  --line-mode         draw level contours instead of a filled map
  --output <path>     output PNG path (default: generated from parameters)
  -h, --help          show this message";

const RADIAL_CANVAS: (u32, u32) = (960, 640);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Orbital(#[from] OrbitalError),
}

#[derive(Debug, Clone, PartialEq)]
struct CliArgs {
    quantum_numbers: Vec<i64>,
    mode: RenderMode,
    plane: Option<Plane>,
    value: Option<f64>,
    range: Option<f64>,
    points: usize,
    cmap: Option<String>,
    scale: ScaleRequest,
    colorbar: bool,
    line_mode: bool,
    output: Option<PathBuf>,
    help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        CliArgs {
            quantum_numbers: Vec::new(),
            mode: RenderMode::Real,
            plane: None,
            value: None,
            range: None,
            points: DEFAULT_POINTS,
            cmap: None,
            scale: ScaleRequest::Linear,
            colorbar: false,
            line_mode: false,
            output: None,
            help: false,
        }
    }
}

impl CliArgs {
    fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            if arg == "-h" || arg == "--help" {
                parsed.help = true;
                continue;
            }
            let Some(flag) = arg.strip_prefix("--") else {
                let value = arg.parse::<i64>().map_err(|_| {
                    CliError::Usage(format!("invalid quantum number: {arg}"))
                })?;
                parsed.quantum_numbers.push(value);
                continue;
            };

            let (name, inline) = match flag.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (flag, None),
            };
            match name {
                "colorbar" => parsed.colorbar = true,
                "no-colorbar" => parsed.colorbar = false,
                "line-mode" => parsed.line_mode = true,
                _ => {
                    let value = match inline {
                        Some(value) => value,
                        None => args
                            .next()
                            .ok_or_else(|| CliError::Usage(format!("--{name} needs a value")))?,
                    };
                    parsed.apply(name, &value)?;
                }
            }
        }

        Ok(parsed)
    }

    fn apply(&mut self, name: &str, value: &str) -> Result<(), CliError> {
        match name {
            "mode" => self.mode = value.parse()?,
            "plane" => {
                self.plane = match value {
                    "auto" => None,
                    other => Some(other.parse()?),
                }
            }
            "value" => self.value = Some(parse_number(name, value)?),
            "range" => self.range = Some(parse_number(name, value)?),
            "points" => {
                self.points = value
                    .parse()
                    .map_err(|_| CliError::Usage(format!("--points expects an integer, got {value}")))?
            }
            "cmap" => self.cmap = Some(value.to_string()),
            "scale" => self.scale = value.parse()?,
            "output" => self.output = Some(PathBuf::from(value)),
            other => return Err(CliError::Usage(format!("unknown option --{other}"))),
        }
        Ok(())
    }
}

fn parse_number(name: &str, value: &str) -> Result<f64, CliError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CliError::Usage(format!("--{name} expects a number, got {value}")))
}

fn run(args: CliArgs) -> Result<PathBuf, CliError> {
    let qn = parse_quantum_numbers(&args.quantum_numbers)?;

    if args.points < MIN_CLI_POINTS {
        return Err(CliError::Usage(format!(
            "--points must be at least {MIN_CLI_POINTS} for stable contour plotting."
        )));
    }
    if matches!(args.range, Some(range) if range <= 0.0) {
        return Err(CliError::Usage("--range must be positive.".to_string()));
    }

    let mode = args.mode;
    let cmap = resolve_colormap(mode, args.cmap.as_deref());
    log::info!("Hydrogen orbital {} (n={}, l={}, m={}) mode={mode}", qn.label(), qn.n(), qn.l(), qn.m());

    match mode {
        RenderMode::RadialDistribution => {
            let extent = args
                .range
                .unwrap_or_else(|| auto_extent_a0(qn, mode, DEFAULT_COVERAGE));
            let (r_a0, prob) = radial_distribution(qn, extent, args.points)?;
            let image = render_radial_distribution(&r_a0, &prob, RADIAL_CANVAS.0, RADIAL_CANVAS.1)?;
            let output = args
                .output
                .unwrap_or_else(|| default_output_name(qn, mode, "r", 0.0).into());
            save_png(&image, &output)?;
            Ok(output)
        }
        RenderMode::SphericalHarmonic => {
            let scale = enforce_scale(mode, resolve_scale(mode, args.scale), ScaleEnforcement::Reject)?;
            let (_, data) = spherical_harmonic_map(qn, args.points)?;
            let style = FieldStyle {
                cmap: &cmap,
                scale,
                colorbar: args.colorbar,
                line_mode: args.line_mode,
            };
            let image = render_mode_data(&data, mode, style)?;
            let output = args
                .output
                .unwrap_or_else(|| default_output_name(qn, mode, "angles", 0.0).into());
            save_png(&image, &output)?;
            Ok(output)
        }
        _ => {
            let overrides = Overrides {
                plane: args.plane,
                value_a0: args.value,
                extent_a0: args.range,
                scale: args.scale,
            };
            let decision = decide(qn, mode, &overrides, ScaleEnforcement::Reject)?;
            log::info!(
                "slice {}={} a0, range {:.3} a0, scale {}",
                decision.plane,
                decision.value_a0,
                decision.extent_a0,
                decision.scale
            );

            let grid = build_plane_grid(
                decision.plane,
                decision.value_a0,
                decision.extent_a0,
                args.points,
            )?;
            let data = evaluate_slice(qn, mode, &grid)?;
            let style = FieldStyle {
                cmap: &cmap,
                scale: decision.scale,
                colorbar: args.colorbar,
                line_mode: args.line_mode,
            };
            let image = render_mode_data(&data, mode, style)?;
            let output = args.output.unwrap_or_else(|| {
                default_output_name(qn, mode, decision.plane.as_str(), decision.value_a0).into()
            });
            save_png(&image, &output)?;
            Ok(output)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help || args.quantum_numbers.is_empty() {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(output) => {
            println!("Saved plot to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
