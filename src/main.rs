use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;

use mapview::{init_logging, ConfigLocation, MapSettingsController, Point, Project, ViewState};
use mapview_core::event_bus::{EventFilter, ProjectEventKind};

#[derive(Parser, Debug)]
#[command(name = "mapview")]
#[command(about = "Load a project and print the resulting map view state as JSON")]
#[command(version)]
struct Cli {
    /// Project file (.qgs) to load
    project: PathBuf,

    /// Config file (.toml or .json); defaults to the platform config dir
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output width in device-independent pixels
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Output height in device-independent pixels
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Output DPI
    #[arg(long)]
    dpi: Option<f64>,

    /// Device pixel ratio
    #[arg(long)]
    pixel_ratio: Option<f64>,

    /// Center the view on X,Y (destination CRS units)
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    center: Option<Point>,

    /// Bring the layer with this id into view
    #[arg(long)]
    layer: Option<String>,

    /// With --layer, only recenter instead of zooming to the layer
    #[arg(long, requires = "layer")]
    no_zoom: bool,

    /// Log JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", value))?;
    let coord = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{}': {}", s, e))
    };
    Ok(Point::new(coord(x)?, coord(y)?))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLocation::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let (Some(width), Some(height)) = (cli.width, cli.height) {
        config.view.output_width = width;
        config.view.output_height = height;
    }
    if let Some(dpi) = cli.dpi {
        config.view.output_dpi = dpi;
    }
    if let Some(ratio) = cli.pixel_ratio {
        config.view.device_pixel_ratio = ratio;
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    config.validate().context("Invalid settings")?;

    init_logging(&config.logging)?;
    tracing::info!("mapview {} (built {})", mapview::VERSION, mapview::BUILD_DATE);

    let project = Rc::new(Project::new());
    let controller = MapSettingsController::new();
    controller.set_project(Some(&project));
    config.view.apply(&controller);

    // Render every spatial layer of the project, like a layer tree would.
    {
        let controller = controller.clone();
        let weak_project = Rc::downgrade(&project);
        project.signals().subscribe(
            EventFilter::Kinds(vec![
                ProjectEventKind::LayersAdded,
                ProjectEventKind::LayersRemoved,
                ProjectEventKind::Cleared,
            ]),
            move |_| {
                if let Some(project) = weak_project.upgrade() {
                    controller.set_layers(project.map_layers());
                }
            },
        );
    }

    project
        .read(&cli.project)
        .with_context(|| format!("Failed to read project {}", cli.project.display()))?;

    if let Some(id) = &cli.layer {
        let layer = project
            .map_layer(id)
            .with_context(|| format!("No layer with id '{}'", id))?;
        controller
            .set_center_to_layer(&layer, !cli.no_zoom)
            .with_context(|| format!("Cannot bring layer '{}' into view", id))?;
    }
    if let Some(center) = cli.center {
        controller.set_center(center);
    }

    println!("{}", serde_json::to_string_pretty(&ViewState::capture(&controller))?);
    Ok(())
}
