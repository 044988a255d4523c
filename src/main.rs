use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use iqtisad_canvas::assets::{LogoPreview, PREDEFINED_LOGOS};
use iqtisad_canvas::export::Exporter;
use iqtisad_canvas::rendering::html::{self, HtmlOptions};
use iqtisad_canvas::rendering::svg_scene;
use iqtisad_canvas::server::{GeminiGenerator, SuggestServer, GEMINI_BASE_URL};
use iqtisad_canvas::suggest::SuggestionClient;
use iqtisad_canvas::{fonts, render, CanvasConfig, DesignState, Layout, ThemeColor};

/// iqtisad: compose economic-news posters, export them as PNG and get
/// headline ideas
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the live preview (HTML) or the paint scene (SVG)
    Render {
        /// Design document (camelCase JSON); defaults apply when omitted
        #[clap(short, long)]
        state: Option<PathBuf>,
        #[clap(short, long, value_enum, default_value = "html")]
        format: Format,
        /// Output file; stdout when omitted
        #[clap(short, long)]
        out: Option<PathBuf>,
        /// Fetch the web font stylesheet and inline it into the document
        #[clap(long)]
        fonts: bool,
    },
    /// Rasterize the poster to `<prefix>-<millis>.png`
    Export {
        #[clap(short, long)]
        state: Option<PathBuf>,
        #[clap(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Ask the suggestion endpoint for headlines about a topic
    Suggest { topic: String },
    /// Run the headline suggestion endpoint
    Serve {
        #[clap(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
    /// List theme colors, layouts and predefined logos
    Palette,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Html,
    Svg,
}

fn load_state(path: Option<&PathBuf>) -> anyhow::Result<DesignState> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            Ok(DesignState::from_json(&text)?)
        }
        None => Ok(DesignState::default()),
    }
}

fn write_output(out: Option<&PathBuf>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(p) => std::fs::write(p, text).with_context(|| format!("writing {}", p.display())),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = CanvasConfig::from_env()?;

    match args.command {
        Command::Render { state, format, out, fonts: with_fonts } => {
            let tree = render(&load_state(state.as_ref())?);
            let text = match format {
                Format::Html => {
                    let bundle = if with_fonts {
                        fonts::load(&config.font_css_url, config.timeout()).await
                    } else {
                        fonts::FontBundle::default()
                    };
                    let opts = HtmlOptions {
                        css_policy: config.css_policy,
                        font_css: (!bundle.css.is_empty()).then_some(bundle.css.as_str()),
                        size: Some((config.viewport.width, config.viewport.height)),
                    };
                    html::to_document(&tree, &opts)
                }
                Format::Svg => svg_scene(&tree, config.viewport),
            };
            write_output(out.as_ref(), &text)?;
        }
        Command::Export { state, out_dir } => {
            let tree = render(&load_state(state.as_ref())?);
            let bundle = fonts::load(&config.font_css_url, config.timeout()).await;
            let exporter = Exporter::new(config, &bundle)?;
            match exporter.export_to_dir(&tree, &out_dir).await {
                Some(path) => println!("{}", path.display()),
                None => std::process::exit(1),
            }
        }
        Command::Suggest { topic } => {
            let client = SuggestionClient::from_config(&config)?;
            for headline in client.suggest(&topic).await {
                println!("{}", headline);
            }
        }
        Command::Serve { addr } => {
            let timeout = config.timeout();
            tokio::task::spawn_blocking(move || -> iqtisad_canvas::Result<()> {
                let generator = GeminiGenerator::new(GEMINI_BASE_URL, timeout)?;
                SuggestServer::bind(&addr, Arc::new(generator))?.run();
                Ok(())
            })
            .await??;
        }
        Command::Palette => {
            for color in ThemeColor::ALL {
                println!("{}  {}", color.hex(), color.name());
            }
            println!();
            for layout in Layout::ALL {
                println!("{:<8} {}", layout.as_str(), layout.label());
            }
            println!();
            for logo in PREDEFINED_LOGOS {
                let status = match logo.preview(&config.asset_root) {
                    LogoPreview::Image(path) => path.display().to_string(),
                    LogoPreview::Glyph(c) => format!("missing, shown as '{}'", c),
                };
                println!("{:<8} {} ({})", logo.id, logo.name, status);
            }
        }
    }
    Ok(())
}
