//! Command-line flags. Unknown flags are ignored; bad values fall back to
//! defaults with a warning.

use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    pub width: u32,
    pub height: u32,
    /// RON gallery manifest; the built-in gallery when absent.
    pub gallery: Option<PathBuf>,
    /// Overrides the manifest's asset directory.
    pub assets: Option<PathBuf>,
    /// Load the model headless and exit.
    pub check_assets: bool,
}

impl AppConfig {
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let (width, height) = parse_size_args(&args);
        Self {
            backends: parse_backend_arg(&args),
            show_fps: parse_show_fps_arg(&args),
            width,
            height,
            gallery: parse_path_arg(&args, "--gallery="),
            assets: parse_path_arg(&args, "--assets="),
            check_assets: args.iter().any(|a| a == "--check-assets"),
        }
    }
}

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all();
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{other}', falling back to auto.");
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_show_fps_arg(args: &[String]) -> bool {
    // --show-fps[=on|off], off by default
    for arg in args {
        if arg == "--show-fps" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--show-fps=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_size_args(args: &[String]) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            match v
                .split_once(['x', 'X'])
                .map(|(sw, sh)| (sw.parse::<u32>(), sh.parse::<u32>()))
            {
                Some((Ok(pw), Ok(ph))) => {
                    w = Some(pw);
                    h = Some(ph);
                }
                _ => log::warn!("Ignoring malformed --size={v}"),
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        }
    }

    (w.unwrap_or(1280).max(1), h.unwrap_or(720).max(1))
}

/// Last occurrence wins.
fn parse_path_arg(args: &[String], prefix: &str) -> Option<PathBuf> {
    args.iter()
        .rev()
        .find_map(|a| a.strip_prefix(prefix))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
