//! Voxedit - headless editor shell
//!
//! Usage: cargo run --release -- [--config <PATH>]
//!
//! Reads one command per line from stdin:
//!   mode <build|erase|orbit|scale|load|view|undo>
//!   color <#rrggbb>
//!   click <ndc_x> <ndc_y>         primary action through the camera
//!   build <x> <y> <z> <nx> <ny> <nz>
//!   erase <x> <y> <z>
//!   scale <sx> <sy> <sz> [y]      trailing `y` replicates along y
//!   view                          toggle pixel-view
//!   undo
//!   export
//!   load <code>
//!   orbit <dx> <dy> | pan <dx> <dy> | zoom <delta>
//!   resize <width> <height>       viewport size for `click`
//!   status
//!   quit

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use voxedit::core::{
    camera::Camera,
    camera_controller::OrbitController,
    logging,
    EditorConfig,
    Vec3,
};
use voxedit::editor::{EditMode, Outcome, Session};
use voxedit::render::InstanceRenderer;
use voxedit::voxel::edit::BatchProgress;
use voxedit::voxel::{pick, Color};

/// One parsed shell line
#[derive(Debug, PartialEq)]
enum Command {
    Mode(EditMode),
    Color(Color),
    Click(f32, f32),
    Build(Vec3, Vec3),
    Erase(Vec3),
    Scale([String; 3], bool),
    View,
    Undo,
    Export,
    Load(String),
    Orbit(f32, f32),
    Pan(f32, f32),
    Zoom(f32),
    Resize(f32, f32),
    Status,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or("empty command")?;
        let args: Vec<&str> = parts.collect();

        let floats = |n: usize| -> Result<Vec<f32>, String> {
            if args.len() != n {
                return Err(format!("{} expects {} numbers", name, n));
            }
            args.iter()
                .map(|a| a.parse::<f32>().map_err(|_| format!("not a number: {}", a)))
                .collect()
        };

        let command = match name {
            "mode" => Command::Mode(args.first().ok_or("mode expects a name")?.parse()?),
            "color" => Command::Color(args.first().ok_or("color expects #rrggbb")?.parse()?),
            "click" => {
                let v = floats(2)?;
                Command::Click(v[0], v[1])
            }
            "build" => {
                let v = floats(6)?;
                Command::Build(Vec3::new(v[0], v[1], v[2]), Vec3::new(v[3], v[4], v[5]))
            }
            "erase" => {
                let v = floats(3)?;
                Command::Erase(Vec3::new(v[0], v[1], v[2]))
            }
            "scale" => {
                if !(3..=4).contains(&args.len()) {
                    return Err("scale expects <sx> <sy> <sz> [y]".into());
                }
                let replicate_y = args.get(3).is_some_and(|flag| flag.eq_ignore_ascii_case("y"));
                Command::Scale([args[0].into(), args[1].into(), args[2].into()], replicate_y)
            }
            "view" => Command::View,
            "undo" => Command::Undo,
            "export" => Command::Export,
            // Save codes contain no whitespace, but tolerate pasted spaces
            "load" => Command::Load(args.concat()),
            "orbit" => {
                let v = floats(2)?;
                Command::Orbit(v[0], v[1])
            }
            "pan" => {
                let v = floats(2)?;
                Command::Pan(v[0], v[1])
            }
            "zoom" => Command::Zoom(floats(1)?[0]),
            "resize" => {
                let v = floats(2)?;
                if !(v[0] > 0.0 && v[1] > 0.0) {
                    return Err("resize expects a positive width and height".into());
                }
                Command::Resize(v[0], v[1])
            }
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command: {}", other)),
        };
        Ok(command)
    }
}

struct Shell {
    session: Session<InstanceRenderer>,
    camera: Camera,
    orbit: OrbitController,
}

impl Shell {
    /// Run one command; returns false to exit
    fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Mode(mode) => self.session.set_mode(mode),
            Command::Color(color) => self.session.set_color(color),
            Command::Click(x, y) => {
                let ray = self.camera.screen_ray(x, y);
                let hit = pick(self.session.store(), &ray);
                if let Some(hit) = &hit {
                    log::debug!("hit {} at {} (normal {})", hit.position, ray.at(hit.distance), hit.normal);
                }
                report(self.session.primary_action(hit));
            }
            Command::Build(position, normal) => report(self.session.build(position, normal)),
            Command::Erase(position) => report(self.session.erase(position)),
            Command::Scale([x, y, z], replicate_y) => {
                match self.session.scale_from_input(&x, &y, &z, replicate_y) {
                    Ok(outcome) => report(outcome),
                    Err(e) => println!("error: {}", e),
                }
            }
            Command::View => {
                let on = self.session.toggle_pixel_view();
                println!("pixel-view {}", if on { "on" } else { "off" });
            }
            Command::Undo => report(self.session.undo()),
            Command::Export => println!("{}", self.session.export()),
            Command::Load(code) => match self.session.begin_load(&code) {
                Ok(outcome) => report(outcome),
                Err(e) => println!("error: {}", e),
            },
            Command::Orbit(dx, dy) => {
                self.orbit.orbit(dx, dy);
                self.orbit.apply(&mut self.camera);
            }
            Command::Pan(dx, dy) => {
                self.orbit.pan(&self.camera, dx, dy);
                self.orbit.apply(&mut self.camera);
            }
            Command::Zoom(delta) => {
                self.orbit.zoom(delta);
                self.orbit.apply(&mut self.camera);
            }
            Command::Resize(width, height) => self.camera.set_aspect(width, height),
            Command::Status => self.status(),
            Command::Quit => return false,
        }

        let renderer = self.session.renderer_mut();
        if renderer.take_dirty() {
            log::debug!("instance buffer: {} bytes, {} live", renderer.as_bytes().len(), renderer.live_count());
        }
        true
    }

    fn status(&self) {
        let session = &self.session;
        println!(
            "mode {} | color {} | {} voxels | history {}/{}{} | pixel-view {}",
            session.mode(),
            session.color(),
            session.store().len(),
            session.history().index().map_or(0, |i| i + 1),
            session.history().len(),
            if session.history().can_undo() { "" } else { " (oldest)" },
            if session.is_pixel_view() { "on" } else { "off" },
        );
        println!(
            "camera yaw {:.2} pitch {:.2} distance {:.1} aspect {:.2}",
            self.orbit.yaw(),
            self.orbit.pitch(),
            self.orbit.distance,
            self.camera.aspect,
        );
        if let Some((remaining, total)) = session.load_progress() {
            println!("loading: {}/{} placed", total - remaining, total);
        }
        if let Some(bounds) = session.store().bounds() {
            println!("bounds {} .. {} (center {}, size {})", bounds.min, bounds.max, bounds.center(), bounds.size());
        }
    }
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Applied => println!("ok"),
        Outcome::Skipped(reason) => println!("skipped: {:?}", reason),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let config = match parse_path_arg(&args, "--config") {
        Some(path) => match EditorConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EditorConfig::default(),
    };

    let interval = Duration::from_millis(config.load_interval_ms.max(1));
    let session = match Session::new(config, InstanceRenderer::new()) {
        Ok(session) => session,
        Err(e) => {
            log::error!("failed to start session: {}", e);
            std::process::exit(1);
        }
    };

    let orbit = OrbitController::default();
    let mut camera = Camera::default();
    orbit.apply(&mut camera);
    let mut shell = Shell { session, camera, orbit };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match Command::parse(&line) {
                        Ok(command) => {
                            if !shell.execute(command) {
                                break;
                            }
                        }
                        Err(e) => println!("error: {}", e),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("stdin: {}", e);
                    break;
                }
            },
            _ = ticker.tick(), if shell.session.is_building() => {
                if shell.session.tick() == Some(BatchProgress::Done) {
                    println!("load complete: {} voxels", shell.session.store().len());
                }
            }
        }
    }

    // A started load always runs to completion
    if shell.session.is_building() {
        shell.session.finish_load();
    }
    log::info!("session ended with {} voxels", shell.session.store().len());
}

fn parse_path_arg(args: &[String], flag: &str) -> Option<PathBuf> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}
