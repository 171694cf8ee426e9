use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use skyship_assets::MeshData;
use skyship_common::SceneConfig;
use skyship_input::Direction;
use skyship_render::{DebugTextRenderer, RenderView, Renderer};
use skyship_sim::{HostEvent, SceneController};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skyship-cli", about = "Headless tooling for the skyship demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML scene config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the effective config
    Info,
    /// Run the scene headless and print the final frame
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "10")]
        frames: u64,
        /// Directions held for the whole run, e.g. `forward,left`
        #[arg(long, value_delimiter = ',')]
        hold: Vec<String>,
        /// Load this model instead of using a placeholder ship
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Run without a ship, as if the model never loaded
        #[arg(long)]
        no_ship: bool,
        /// Particle RNG seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
        /// Number of particle positions to list
        #[arg(long, default_value = "3")]
        samples: usize,
    },
    /// Load a model and print its mesh statistics
    InspectModel {
        /// Path to a .gltf or .glb file
        path: PathBuf,
    },
    /// Print a config as YAML
    Config {
        /// Print the built-in defaults instead of the effective config
        #[arg(long)]
        default: bool,
    },
}

fn parse_directions(names: &[String]) -> anyhow::Result<Vec<Direction>> {
    names
        .iter()
        .map(|n| {
            let n = n.trim().to_ascii_lowercase();
            match Direction::from_name(&n) {
                Some(d) => Ok(d),
                None => bail!("unknown direction `{n}` (expected forward, backward, left, right)"),
            }
        })
        .collect()
}

/// Press the bound key for each direction, as the desktop app would.
fn hold_directions(controller: &mut SceneController, held: &[Direction]) {
    for &d in held {
        let key = controller.bindings().key(d);
        if !controller.handle(HostEvent::KeyDown(key)) {
            tracing::warn!("keyboard listener not attached; {} ignored", d.name());
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = SceneConfig::load_or_default(cli.config.as_deref())
        .context("failed to load scene config")?;

    match cli.command {
        Commands::Info => {
            println!("skyship-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", skyship_assets::crate_info());
            println!("render: {}", skyship_render::crate_info());
            println!("---");
            print!("{}", config.to_yaml()?);
        }
        Commands::Simulate {
            frames,
            hold,
            model,
            no_ship,
            seed,
            samples,
        } => {
            let held = parse_directions(&hold)?;

            let mut config = config;
            if seed.is_some() {
                config.particles.seed = seed;
            }
            let mut controller = SceneController::new(config);
            controller.attach();

            if !no_ship {
                let result = match model {
                    Some(path) => skyship_assets::load_mesh(path),
                    None => Ok(MeshData {
                        name: "placeholder".into(),
                        ..MeshData::default()
                    }),
                };
                controller.on_ship_loaded(result);
            }

            hold_directions(&mut controller, &held);

            let mut moved = 0;
            for _ in 0..frames {
                if controller.frame().ship_updated {
                    moved += 1;
                }
            }
            tracing::debug!("{moved} of {frames} frames moved the ship");

            let camera =
                RenderView::from_config(&controller.config().camera, controller.viewport());
            let renderer = DebugTextRenderer::with_particle_samples(samples);
            print!("{}", renderer.render(&controller.scene_view(), &camera));
        }
        Commands::InspectModel { path } => {
            let mesh = skyship_assets::load_mesh(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            println!("Model: {} ({})", mesh.name, path.display());
            println!(
                "Vertices: {}  Indices: {}  Triangles: {}",
                mesh.vertex_count(),
                mesh.index_count(),
                mesh.triangle_count()
            );
            if let Some((lo, hi)) = mesh.bounds() {
                println!(
                    "Bounds: ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                    lo[0], lo[1], lo[2], hi[0], hi[1], hi[2]
                );
            }
        }
        Commands::Config { default } => {
            let shown = if default {
                SceneConfig::default()
            } else {
                config
            };
            print!("{}", shown.to_yaml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_direction_list() {
        let names = vec!["forward".to_string(), " Left ".to_string()];
        assert_eq!(
            parse_directions(&names).unwrap(),
            vec![Direction::Forward, Direction::Left]
        );
    }

    #[test]
    fn rejects_unknown_direction() {
        let err = parse_directions(&["up".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown direction"));
    }

    #[test]
    fn held_directions_go_through_key_bindings() {
        let mut controller = SceneController::new(SceneConfig::default());
        controller.attach();
        controller.on_ship_loaded(Ok(MeshData::default()));
        hold_directions(&mut controller, &[Direction::Forward, Direction::Right]);

        controller.frame();
        let t = controller.ship().transform().unwrap();
        assert_eq!(t.position.z, 34.5);
        assert_eq!(t.position.x, 0.5);
        assert_eq!(t.tilt, 0.1);
    }

    #[test]
    fn held_directions_need_attached_listeners() {
        let mut controller = SceneController::new(SceneConfig::default());
        hold_directions(&mut controller, &[Direction::Left]);
        assert!(!controller.flags().left);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn simulate_flags_parse() {
        let cli = Cli::try_parse_from([
            "skyship-cli",
            "simulate",
            "--frames",
            "3",
            "--hold",
            "forward,right",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { frames, hold, .. } => {
                assert_eq!(frames, 3);
                assert_eq!(hold, vec!["forward", "right"]);
            }
            _ => panic!("expected simulate"),
        }
    }
}
