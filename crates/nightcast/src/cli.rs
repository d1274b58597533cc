use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "nightcast", about = "Stream games from a GameStream host", version)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "nightcast.toml")]
    pub config: String,

    /// Host address (overrides config)
    #[arg(short, long, global = true)]
    pub address: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the apps the host can launch
    List,
    /// Launch an app and stream it until interrupted
    Stream(StreamArgs),
    /// Quit the app running on the host
    Quit,
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct StreamArgs {
    /// Name of the app to stream
    #[arg(long)]
    pub app: Option<String>,

    /// Horizontal resolution
    #[arg(long)]
    pub width: Option<u32>,

    /// Vertical resolution
    #[arg(long)]
    pub height: Option<u32>,

    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Video bitrate in kbps
    #[arg(long)]
    pub bitrate: Option<u32>,

    /// Request a mode the host does not advertise
    #[arg(long)]
    pub unsupported: bool,

    /// Don't let the host optimize game settings
    #[arg(long)]
    pub nosops: bool,

    /// Also play audio on the host
    #[arg(long)]
    pub localaudio: bool,

    /// Audio output device
    #[arg(long)]
    pub audio: Option<String>,

    /// Start the video surface fullscreen
    #[arg(long)]
    pub fullscreen: bool,

    /// Stream to a host outside the local network
    #[arg(long)]
    pub remote: bool,

    /// Enable engine logging; repeat for more detail
    #[arg(long, action = ArgAction::Count)]
    pub debug: u8,

    /// Output platform: fake, null or auto
    #[arg(long)]
    pub platform: Option<String>,

    /// Input device to forward; repeat for each device
    #[arg(long = "input", value_name = "DEVICE")]
    pub input: Vec<String>,
}
