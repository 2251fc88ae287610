// ============================================================================
// PasteCrop CLI: crop an image, copy it, and manage the crop history
// ============================================================================
//
// Usage examples:
//   pastecrop crop shot.png --rect 10,20,300,200
//   pastecrop crop shot.png --rect 10,20,300,200 --display 800x600 --out crop.png
//   pastecrop crop --from-clipboard
//   pastecrop history list
//   pastecrop history export 1760000000000 last.png
//   pastecrop config set history.consistency '"KeepSession"'

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};

use pastecrop::app::App;
use pastecrop::logger;
use pastecrop::managers::history_store::HistoryStoreTrait;
use pastecrop::services::{crop_transform, data_url};
use pastecrop::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use pastecrop::types::crop::{CropRect, Dimensions};

/// Crop images and keep a short history of recent crops.
#[derive(Parser, Debug)]
#[command(name = "pastecrop", version, about)]
struct Cli {
    /// Settings file to use instead of the platform default.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crop an image, record it in history, and copy it to the clipboard.
    Crop {
        /// Image file to crop.
        #[arg(required_unless_present = "from_clipboard")]
        input: Option<PathBuf>,

        /// Read the source image from the clipboard instead of a file.
        #[arg(long, conflicts_with = "input")]
        from_clipboard: bool,

        /// Crop rectangle as x,y,width,height. Defaults to a centered crop.
        #[arg(long, value_parser = parse_rect)]
        rect: Option<CropRect>,

        /// Size the image was displayed at when the rectangle was drawn, as WxH.
        #[arg(long, value_parser = parse_dimensions, requires = "rect")]
        display: Option<Dimensions>,

        /// Also write the crop to this PNG file.
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Do not copy the crop to the clipboard.
        #[arg(long)]
        no_copy: bool,
    },
    /// Inspect or edit the crop history.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Inspect or edit settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List recorded crops, newest first.
    List {
        /// Print full records as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Remove one crop by id.
    Remove { id: i64 },
    /// Delete the whole history.
    Clear,
    /// Write a recorded crop to a file.
    Export { id: i64, file: PathBuf },
    /// Copy a recorded crop to the clipboard.
    Copy { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective settings.
    Show,
    /// Set a value by dotted key, e.g. `storage.quota_bytes 1048576`.
    Set { key: String, value: String },
    /// Restore defaults.
    Reset,
}

fn parse_rect(s: &str) -> Result<CropRect, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in rect '{}': {}", s, e))?;
    match parts.as_slice() {
        [x, y, w, h] => Ok(CropRect::new(*x, *y, *w, *h)),
        _ => Err(format!("expected x,y,width,height, got '{}'", s)),
    }
}

fn parse_dimensions(s: &str) -> Result<Dimensions, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width = w.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Dimensions::new(width, height))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings_engine = SettingsEngine::new(cli.config);
    let settings_error = settings_engine.load().err();
    logger::init(&settings_engine.get_settings().logging.level);
    if let Some(e) = settings_error {
        tracing::warn!(error = %e, "Failed to load settings, using defaults");
    }
    let mut app = App::with_settings(settings_engine)?;

    match cli.command {
        Command::Crop {
            input,
            from_clipboard,
            rect,
            display,
            out,
            no_copy,
        } => {
            let url = if from_clipboard {
                let pasted = read_clipboard()?;
                let source = crop_transform::load_image_from_data_url(&pasted)?;
                let rect = rect.unwrap_or_else(|| app.default_crop(&source));
                app.crop_and_record(&source, rect, display)?
            } else {
                let input = input.ok_or_else(|| anyhow!("no input image given"))?;
                app.crop_file(&input, rect, display)?
            };

            let mut delivered = false;
            if let Some(out) = &out {
                write_data_url(&url, out)?;
                println!("Saved crop to {}", out.display());
                delivered = true;
            }
            if !no_copy {
                match copy_to_clipboard(&url) {
                    Ok(()) => {
                        println!("Cropped image copied to clipboard");
                        delivered = true;
                    }
                    Err(e) => eprintln!("Could not copy to clipboard: {:#}", e),
                }
            }
            if !delivered {
                // Nothing else received the crop; print it so it is not lost.
                println!("{}", url);
            }
        }
        Command::History { action } => run_history(&mut app, action)?,
        Command::Config { action } => run_config(&mut app, action)?,
    }
    Ok(())
}

fn run_history(app: &mut App, action: HistoryAction) -> anyhow::Result<()> {
    match action {
        HistoryAction::List { json } => {
            let list = app.history.list();
            if json {
                println!("{}", serde_json::to_string_pretty(list)?);
            } else if list.is_empty() {
                println!("History is empty");
            } else {
                for record in list {
                    let mime = data_url::mime_of(&record.encoded_image)
                        .unwrap_or_else(|_| "unknown".to_string());
                    println!(
                        "{}  {}  {}  {} bytes",
                        record.id,
                        record.created_at.to_rfc3339(),
                        mime,
                        record.encoded_image.len()
                    );
                }
            }
        }
        HistoryAction::Remove { id } => {
            let before = app.history.list().len();
            let after = app.history.remove(id).len();
            if after < before {
                println!("Removed {}", id);
            } else {
                println!("No crop with id {}", id);
            }
        }
        HistoryAction::Clear => {
            app.history.clear();
            println!("History cleared");
        }
        HistoryAction::Export { id, file } => {
            let record = app
                .history
                .get(id)
                .ok_or_else(|| anyhow!("no crop with id {}", id))?;
            write_data_url(&record.encoded_image, &file)?;
            println!("Saved crop to {}", file.display());
        }
        HistoryAction::Copy { id } => {
            let record = app
                .history
                .get(id)
                .ok_or_else(|| anyhow!("no crop with id {}", id))?;
            copy_to_clipboard(&record.encoded_image)?;
            println!("Cropped image copied to clipboard");
        }
    }
    Ok(())
}

fn run_config(app: &mut App, action: ConfigAction) -> anyhow::Result<()> {
    let engine = &mut app.settings_engine;
    match action {
        ConfigAction::Show => {
            println!("# {}", engine.get_config_path().display());
            println!("{}", serde_json::to_string_pretty(engine.get_settings())?);
        }
        ConfigAction::Set { key, value } => {
            // Bare words are taken as strings so `logging.level debug` works.
            let parsed = serde_json::from_str(&value)
                .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
            engine.set_value(&key, parsed)?;
            println!("{} updated", key);
        }
        ConfigAction::Reset => {
            engine.reset()?;
            println!("Settings reset to defaults");
        }
    }
    Ok(())
}

fn write_data_url(url: &str, path: &Path) -> anyhow::Result<()> {
    let decoded = data_url::parse(url)?;
    std::fs::write(path, decoded.data).with_context(|| format!("writing {}", path.display()))
}

#[cfg(feature = "clipboard")]
fn copy_to_clipboard(url: &str) -> anyhow::Result<()> {
    pastecrop::services::clipboard::copy_data_url(url)?;
    Ok(())
}

#[cfg(not(feature = "clipboard"))]
fn copy_to_clipboard(_url: &str) -> anyhow::Result<()> {
    anyhow::bail!("built without clipboard support")
}

#[cfg(feature = "clipboard")]
fn read_clipboard() -> anyhow::Result<String> {
    Ok(pastecrop::services::clipboard::read_image()?)
}

#[cfg(not(feature = "clipboard"))]
fn read_clipboard() -> anyhow::Result<String> {
    anyhow::bail!("built without clipboard support")
}
