mod session;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use duet_core::{DisplayType, DuetConfig, PlatformId, SceneId, SceneItemId, SourceId, VideoSetting};
use duet_scene::{CollectionBuilder, SceneGraph};

use session::Session;

#[derive(Parser)]
#[command(
    name = "duet",
    version,
    about = "Duet: render one scene collection to a horizontal and a vertical output",
    long_about = "Duet keeps a horizontal and a vertical rendering context in step.\nEvery scene item authored for the horizontal canvas gets a vertical twin,\nand streaming platforms pick which canvas they broadcast."
)]
struct Cli {
    /// Scene collection JSON file
    #[arg(long, short = 'c', global = true, default_value = "collection.json")]
    collection: PathBuf,

    /// Duet TOML config (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for dual output state files (overrides the config)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter scene collection
    Init {
        /// Overwrite an existing collection file
        #[arg(long)]
        force: bool,

        /// Also write the default config to this path
        #[arg(long)]
        write_config: Option<PathBuf>,
    },

    /// Show mode, node maps, settings and platform assignments
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Turn dual output on or off
    Toggle {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Make a scene active
    Switch {
        scene: String,
    },

    /// Remove a scene from the collection
    RemoveScene {
        scene: String,
    },

    /// Add a source to the active scene
    AddSource {
        source: String,
    },

    /// Remove a canonical item and its duplicates
    RemoveItem {
        id: String,
    },

    /// Choose which display a platform streams
    Assign {
        platform: String,
        display: DisplayType,
    },

    /// Turn selective recording on or off
    SelectiveRecording {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Write video settings, e.g. `set horizontal fpsNum=30000 fpsDen=1001`
    Set {
        display: DisplayType,

        #[arg(required = true)]
        settings: Vec<VideoSetting>,
    },

    /// Print the item id a display renders for a canonical item
    Resolve {
        display: DisplayType,
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

impl Switch {
    fn is_on(self) -> bool {
        matches!(self, Switch::On)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DuetConfig::load_from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => DuetConfig::default(),
    };

    // Logs go to stderr so stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init { force, write_config } = &cli.command {
        return cmd_init(&cli.collection, *force, write_config.as_deref(), &config);
    }

    let state_dir = cli
        .state_dir
        .clone()
        .unwrap_or_else(|| config.storage.state_dir.clone());
    let mut session = Session::open(&cli.collection, &config, &state_dir)?;
    let outcome = run(&mut session, cli.command);
    session.close()?;
    outcome
}

fn run(session: &mut Session, command: Commands) -> Result<()> {
    let coordinator = &mut session.coordinator;
    match command {
        Commands::Init { .. } => anyhow::bail!("init runs without an open collection"),
        Commands::Status { json } => cmd_status(coordinator, json),
        Commands::Toggle { state } => {
            coordinator
                .toggle(state.is_on())
                .with_context(|| format!("failed to turn dual output {}", if state.is_on() { "on" } else { "off" }))?;
            println!("dual output: {}", coordinator.phase());
            Ok(())
        }
        Commands::Switch { scene } => {
            coordinator.switch_scene(&SceneId::new(scene))?;
            print_active(coordinator);
            Ok(())
        }
        Commands::RemoveScene { scene } => {
            coordinator.remove_scene(&SceneId::new(scene))?;
            print_active(coordinator);
            Ok(())
        }
        Commands::AddSource { source } => {
            let id = coordinator.add_source(&SourceId::new(source))?;
            match coordinator.dual_output_node_pair(&id) {
                Some((horizontal, vertical)) => println!("{horizontal} {vertical}"),
                None => println!("{id}"),
            }
            Ok(())
        }
        Commands::RemoveItem { id } => {
            let entries = coordinator.remove_canonical_item(&SceneItemId::new(id))?;
            for (display, removed) in entries {
                println!("{display} {removed}");
            }
            Ok(())
        }
        Commands::Assign { platform, display } => {
            let platform = PlatformId::new(platform);
            coordinator.assign_platform(platform.clone(), display)?;
            println!("{platform} -> {}", coordinator.get_platform_display(&platform));
            Ok(())
        }
        Commands::SelectiveRecording { state } => {
            coordinator.set_selective_recording(state.is_on())?;
            println!("selective recording: {}", if state.is_on() { "on" } else { "off" });
            Ok(())
        }
        Commands::Set { display, settings } => {
            let committed = coordinator.set_video_settings(display, &settings)?;
            println!("{}", serde_json::to_string_pretty(&committed.formatted())?);
            Ok(())
        }
        Commands::Resolve { display, id } => {
            println!("{}", coordinator.resolve_display_node_id(display, &SceneItemId::new(id)));
            Ok(())
        }
    }
}

fn print_active(coordinator: &session::Coordinator) {
    match coordinator.graph().active_scene() {
        Some(scene) => println!("active scene: {scene} (dual output: {})", coordinator.phase()),
        None => println!("no active scene (dual output: {})", coordinator.phase()),
    }
}

fn cmd_init(path: &Path, force: bool, write_config: Option<&Path>, config: &DuetConfig) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("'{}' already exists (use --force to overwrite)", path.display());
    }
    let collection = CollectionBuilder::new("starter")
        .scene(
            "main",
            &[("camera", "webcam"), ("mic", "microphone"), ("overlay", "browser")],
        )
        .scene("brb", &[("card", "image")])
        .build();
    collection
        .save_to_file(path)
        .with_context(|| format!("failed to write collection: {}", path.display()))?;
    println!("Created {}", path.display());

    if let Some(config_path) = write_config {
        config
            .save_to_file(config_path)
            .with_context(|| format!("failed to write config: {}", config_path.display()))?;
        println!("Created {}", config_path.display());
    }
    Ok(())
}

fn cmd_status(coordinator: &session::Coordinator, json: bool) -> Result<()> {
    let state = coordinator.state();

    if json {
        let settings: serde_json::Map<String, serde_json::Value> = DisplayType::ALL
            .iter()
            .map(|d| -> Result<(String, serde_json::Value)> {
                Ok((d.to_string(), serde_json::to_value(coordinator.formatted_settings(*d))?))
            })
            .collect::<Result<_>>()?;
        let status = serde_json::json!({
            "enabled": coordinator.is_enabled(),
            "phase": coordinator.phase().to_string(),
            "active_scene": coordinator.graph().active_scene(),
            "active_displays": coordinator.active_displays(),
            "node_maps": state.node_maps,
            "settings": settings,
            "platforms": state.platform_assignments,
            "selective_recording": state.selective_recording,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Dual output:   {}", coordinator.phase());
    match coordinator.graph().active_scene() {
        Some(scene) => println!("Active scene:  {scene}"),
        None => println!("Active scene:  (none)"),
    }
    for display in DisplayType::ALL {
        let s = coordinator.formatted_settings(display);
        println!(
            "{:<14} base {} output {} @ {} fps",
            format!("{display}:"),
            s.base_res,
            s.output_res,
            s.fps_com
        );
    }
    if let Some(maps) = coordinator.node_maps() {
        for display in maps.displays() {
            let count = maps.map(display).map(|m| m.len()).unwrap_or(0);
            println!("Node map:      {display} ({count} items)");
        }
    }
    for (platform, display) in state.platform_assignments.iter() {
        println!("Platform:      {platform} -> {display}");
    }
    println!(
        "Selective recording: {}",
        if state.selective_recording { "on" } else { "off" }
    );
    Ok(())
}
