use clap::{Parser, Subcommand};
use smart_photo::filter::{self, EditMode, FilterPatch, FilterState, Rotation};
use smart_photo::session::{Editor, View};
use smart_photo::upload::{self, UploadLimits};
use smart_photo::{config, output, server};
use std::path::{Path, PathBuf};

/// Adjustment flags shared by `edit` and `compose`.
#[derive(clap::Args, Clone, Default)]
struct AdjustArgs {
    /// Brightness percentage (0-200)
    #[arg(long)]
    brightness: Option<f32>,
    /// Contrast percentage (0-200)
    #[arg(long)]
    contrast: Option<f32>,
    /// Saturation percentage (0-200)
    #[arg(long)]
    saturation: Option<f32>,
    /// Blur radius in pixels (0-20)
    #[arg(long)]
    blur: Option<f32>,
    /// Clockwise rotation in degrees: 0, 90, 180 or 270
    #[arg(long, allow_negative_numbers = true)]
    rotate: Option<Rotation>,
    #[arg(long)]
    sepia: bool,
    #[arg(long)]
    grayscale: bool,
    #[arg(long)]
    invert: bool,

    /// Apply a named effect instead of adjustments (see `effects`)
    #[arg(long, conflicts_with_all = ["brightness", "contrast", "saturation", "blur", "rotate", "sepia", "grayscale", "invert"])]
    effect: Option<String>,
    /// Effect intensity percentage (0-100)
    #[arg(long, default_value_t = 100.0, requires = "effect")]
    intensity: f32,
}

impl AdjustArgs {
    fn patch(&self) -> FilterPatch {
        let mut patch = FilterPatch::new();
        patch.brightness = self.brightness;
        patch.contrast = self.contrast;
        patch.saturation = self.saturation;
        patch.blur = self.blur;
        patch.rotation = self.rotate;
        patch.sepia = self.sepia.then_some(true);
        patch.grayscale = self.grayscale.then_some(true);
        patch.invert = self.invert.then_some(true);
        patch
    }

    fn mode(&self) -> Result<EditMode, Box<dyn std::error::Error>> {
        match &self.effect {
            Some(name) => {
                let preset =
                    filter::find_preset(name).ok_or_else(|| format!("Unknown effect: {name}"))?;
                let mut mode = EditMode::Effect {
                    preset: Some(preset),
                    intensity: filter::INTENSITY_MAX,
                };
                mode.set_intensity(self.intensity);
                Ok(mode)
            }
            None => {
                let mut state = FilterState::default();
                state.merge(&self.patch());
                Ok(EditMode::Adjust(state))
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "smart-photo")]
#[command(about = "Photo editing engine with filter presets and a static asset server")]
#[command(long_about = "\
Photo editing engine with filter presets and a static asset server

Images are edited by composing declarative filter expressions, the same
grammar CSS uses for `filter`:

  brightness(120%) contrast(100%) saturate(100%) blur(0px) sepia(100%)

Adjustments (brightness, contrast, saturation, blur, rotation, toggles) and
named effects (Vintage, Noir, ...) are mutually exclusive. Effects blend
over the original image by their intensity.

Environment variables (PORT, HOST, ENABLE_EFFECTS, MAX_IMAGE_SIZE, ...)
override config.toml. Run 'smart-photo gen-config' to generate a documented
config.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file (optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve built assets with single-page fallback
    Serve {
        /// Asset directory (defaults to server.asset_root)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Load an image, apply adjustments or an effect, and save it
    Edit {
        input: PathBuf,
        #[command(flatten)]
        adjust: AdjustArgs,
        /// Output file; without it the result is downloaded as edited-image-<millis>.jpg
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the filter expression for the given adjustments or effect
    Compose {
        #[command(flatten)]
        adjust: AdjustArgs,
    },
    /// List the effect presets
    Effects {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { root } => {
            let config = config::load_config(cli.config.as_deref(), config::process_env)?;
            let root = root.unwrap_or_else(|| PathBuf::from(&config.server.asset_root));
            output::print_server_banner(config.server.port, &root);
            server::serve(config.bind_address(), root)?;
        }
        Command::Edit {
            input,
            adjust,
            output: destination,
        } => {
            let config = config::load_config(cli.config.as_deref(), config::process_env)?;
            run_edit(&config, &input, &adjust, destination.as_deref())?;
        }
        Command::Compose { adjust } => {
            println!("{}", filter::compose(&adjust.mode()?));
        }
        Command::Effects { json } => {
            if json {
                println!("{}", output::format_effects_json(filter::presets())?);
            } else {
                output::print_effects(filter::presets());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_edit(
    config: &config::AppConfig,
    input: &Path,
    adjust: &AdjustArgs,
    destination: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(input)?;
    let declared = input
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(upload::mime_from_extension);
    let upload = upload::validate_upload(bytes, declared, &UploadLimits::from(&config.image))?;

    let mut editor = Editor::from_config(config);
    editor.on_render(|event| println!("{}", output::format_render_event(event)));

    if adjust.effect.is_some() {
        editor.switch_view(View::Effects)?;
    }
    editor.load_image(upload)?;
    if let Some(surface) = editor.surface() {
        println!("{}", output::format_edit_header(input, surface.dimensions()));
    }

    match &adjust.effect {
        Some(name) => {
            editor.select_effect(name)?;
            editor.set_intensity(adjust.intensity)?;
        }
        None => {
            let patch = adjust.patch();
            if !patch.is_empty() {
                editor.update_filter(&patch)?;
            }
        }
    }

    match destination {
        Some(path) => {
            let snapshot = editor.save()?;
            std::fs::write(path, snapshot.bytes())?;
            println!("{}", output::format_edit_result("Saved", path, snapshot.bytes().len()));
        }
        None => {
            let download = editor.download()?;
            std::fs::write(&download.file_name, &download.bytes)?;
            println!(
                "{}",
                output::format_edit_result("Downloaded", Path::new(&download.file_name), download.bytes.len())
            );
            editor.cancel();
        }
    }
    Ok(())
}

/// `[HH:MM:SS LEVEL file line] message` on stderr; `RUST_LOG` sets the level.
fn init_logger() {
    use std::io::Write;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose_args(args: &[&str]) -> Result<AdjustArgs, clap::Error> {
        let argv = ["smart-photo", "compose"].into_iter().chain(args.iter().copied());
        match Cli::try_parse_from(argv)?.command {
            Command::Compose { adjust } => Ok(adjust),
            _ => unreachable!(),
        }
    }

    #[test]
    fn rotate_accepts_quarter_turns() {
        let adjust = compose_args(&["--rotate", "270"]).unwrap();
        assert_eq!(adjust.patch().rotation, Some(Rotation::ThreeQuarter));
        let adjust = compose_args(&["--rotate", "-90"]).unwrap();
        assert_eq!(adjust.rotate, Some(Rotation::ThreeQuarter));
    }

    #[test]
    fn rotate_rejects_partial_turns() {
        assert!(compose_args(&["--rotate", "45"]).is_err());
        assert!(compose_args(&["--rotate", "100"]).is_err());
    }

    #[test]
    fn effect_conflicts_with_adjustments() {
        assert!(compose_args(&["--effect", "Noir", "--brightness", "50"]).is_err());
        assert!(compose_args(&["--intensity", "50"]).is_err());
    }
}
