use anyhow::{Context, ensure};
use clap::{Parser, Subcommand};
use glam::{Mat4, UVec2, Vec3};
use skymirror_assets::SceneAssets;
use skymirror_common::DemoConfig;
use skymirror_render::{
    CommandRecorder, FrameDriver, MirrorPass, Plane, mirror_center_uv, reflection_matrix,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skymirror-cli", about = "Tools for the planar reflection demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file; built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Reflect a point across a mirror plane
    Reflect {
        /// Height of the mirror along its normal
        #[arg(long, default_value = "-6.0", allow_hyphen_values = true)]
        height: f32,
        /// Mirror normal before rotation, as x,y,z
        #[arg(long, value_delimiter = ',', default_value = "0,1,0", allow_hyphen_values = true)]
        normal: Vec<f32>,
        /// Rotation of the mirror about Y, in degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotate: f32,
        /// Point to reflect, as x,y,z
        #[arg(long, value_delimiter = ',', default_value = "45,0,3.4", allow_hyphen_values = true)]
        point: Vec<f32>,
    },
    /// Print the device command stream for a run of frames
    Trace {
        /// Number of frames to render
        #[arg(short, long, default_value = "1")]
        frames: u32,
        /// Seconds between frames
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// Framebuffer width
        #[arg(long, default_value = "800")]
        width: u32,
        /// Framebuffer height
        #[arg(long, default_value = "600")]
        height: u32,
    },
    /// Load every configured asset and summarize it
    CheckAssets,
    /// Print the effective config as YAML
    DumpConfig,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DemoConfig> {
    match path {
        Some(path) => {
            DemoConfig::load(path).with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(DemoConfig::default()),
    }
}

fn vec3_arg(name: &str, values: &[f32]) -> anyhow::Result<Vec3> {
    ensure!(
        values.len() == 3,
        "--{name} needs three comma-separated values, got {}",
        values.len()
    );
    Ok(Vec3::new(values[0], values[1], values[2]))
}

fn reflect_report(height: f32, normal: Vec3, rotate_degrees: f32, point: Vec3) -> String {
    let rotation = Mat4::from_rotation_y(rotate_degrees.to_radians());
    let model = rotation * Mat4::from_translation(normal.normalize_or_zero() * height);
    let plane = Plane::from_surface(model, normal);
    let reflection = reflection_matrix(&plane);
    let reflected = reflection.transform_point3(point);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "plane: n=({:.4}, {:.4}, {:.4}) d={:.4}",
        plane.normal.x, plane.normal.y, plane.normal.z, plane.d
    );
    for row in 0..4 {
        let r = reflection.row(row);
        let _ = writeln!(out, "  [{:8.4} {:8.4} {:8.4} {:8.4}]", r.x, r.y, r.z, r.w);
    }
    let _ = writeln!(
        out,
        "point:     ({:.4}, {:.4}, {:.4}) distance={:.4}",
        point.x,
        point.y,
        point.z,
        plane.signed_distance(point)
    );
    let _ = writeln!(
        out,
        "reflected: ({:.4}, {:.4}, {:.4}) distance={:.4}",
        reflected.x,
        reflected.y,
        reflected.z,
        plane.signed_distance(reflected)
    );
    let _ = writeln!(out, "determinant: {:.4}", reflection.determinant());
    out
}

fn trace_frames(config: &DemoConfig, frames: u32, dt: f32, size: UVec2) -> anyhow::Result<String> {
    let mut driver = FrameDriver::new(config, size);
    let context = driver.context();
    let mut device = CommandRecorder::new(context.screen_size(), context.reflection_size());

    let mut out = String::new();
    for frame in 0..frames {
        driver
            .frame(dt, &mut device)
            .with_context(|| format!("rendering frame {frame}"))?;
        let state = driver.state();
        let mirrored = MirrorPass::reflected_camera(driver.context());
        let _ = writeln!(
            out,
            "frame {frame} t={:.3} camera=({:.2}, {:.2}, {:.2}) mirrored=({:.2}, {:.2}, {:.2})",
            state.time,
            state.camera_position.x,
            state.camera_position.y,
            state.camera_position.z,
            mirrored.position.x,
            mirrored.position.y,
            mirrored.position.z
        );
        match mirror_center_uv(driver.context()) {
            Some(uv) => {
                let _ = writeln!(out, "  mirror center uv=({:.3}, {:.3})", uv.x, uv.y);
            }
            None => {
                let _ = writeln!(out, "  mirror center behind camera");
            }
        }
        out.push_str(&device.to_text());
        device.take_commands();
    }
    Ok(out)
}

fn asset_report(assets: &SceneAssets) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "object: {} vertices, {} triangles",
        assets.object.vertex_count(),
        assets.object.index_count() / 3
    );
    let _ = writeln!(
        out,
        "mirror: {} vertices, {} triangles",
        assets.mirror.vertex_count(),
        assets.mirror.index_count() / 3
    );
    let _ = writeln!(out, "cubemap: 6 faces at {}px", assets.cubemap.size);
    match &assets.distortion {
        Some(map) => {
            let _ = writeln!(out, "distortion: {}x{}", map.width, map.height);
        }
        None => {
            let _ = writeln!(out, "distortion: none");
        }
    }
    out
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("skymirror-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", skymirror_common::crate_info());
            println!("assets: {}", skymirror_assets::crate_info());
            println!("scene: {}", skymirror_scene::crate_info());
            println!("render: {}", skymirror_render::crate_info());
        }
        Commands::Reflect {
            height,
            normal,
            rotate,
            point,
        } => {
            let normal = vec3_arg("normal", &normal)?;
            ensure!(normal.length_squared() > 0.0, "--normal must not be zero");
            let point = vec3_arg("point", &point)?;
            print!("{}", reflect_report(height, normal, rotate, point));
        }
        Commands::Trace {
            frames,
            dt,
            width,
            height,
        } => {
            ensure!(width > 0 && height > 0, "framebuffer size must be non-zero");
            print!(
                "{}",
                trace_frames(&config, frames, dt, UVec2::new(width, height))?
            );
        }
        Commands::CheckAssets => {
            let assets = SceneAssets::load(&config).context("loading scene assets")?;
            print!("{}", asset_report(&assets));
        }
        Commands::DumpConfig => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_arg_requires_three_values() {
        assert_eq!(vec3_arg("p", &[1.0, 2.0, 3.0]).unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert!(vec3_arg("p", &[1.0, 2.0]).is_err());
    }

    #[test]
    fn reflect_report_mirrors_below_floor() {
        let report = reflect_report(-6.0, Vec3::Y, 0.0, Vec3::new(45.0, 0.0, 3.4));
        assert!(report.contains("reflected: (45.0000, -12.0000, 3.4000)"), "{report}");
        assert!(report.contains("determinant: -1.0000"), "{report}");
    }

    #[test]
    fn trace_lists_both_passes() {
        let text = trace_frames(&DemoConfig::default(), 2, 0.5, UVec2::new(800, 600)).unwrap();
        assert!(text.contains("frame 0 t=0.500"));
        assert!(text.contains("frame 1 t=1.000"));
        assert!(text.contains("mirror center uv=("));
        assert!(text.contains("bind  Reflection 160x120"));
        assert!(text.contains("draw  Object -> Reflection depth=on cull=Front"));
        assert!(text.contains("draw  Mirror -> Screen depth=on cull=Back"));
    }

    #[test]
    fn builtin_assets_report() {
        let assets = SceneAssets::builtin(&DemoConfig::default());
        let report = asset_report(&assets);
        assert!(report.contains("mirror: 4 vertices, 2 triangles"));
        assert!(report.contains("distortion: none"));
    }

    #[test]
    fn config_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.yaml");
        let mut config = DemoConfig::default();
        config.mirror.height = -3.0;
        std::fs::write(&path, config.to_yaml().unwrap()).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.mirror.height, -3.0);
    }
}
