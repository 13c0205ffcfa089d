//! `studyboard` command-line entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use kurbo::Size;
use std::path::PathBuf;
use std::process::ExitCode;
use studyboard_app::commands::{self, PreferenceUpdate};
use studyboard_app::CliResult;
use studyboard_core::LayoutMode;

#[derive(Parser, Debug)]
#[command(name = "studyboard", version, about = "StudyBoard canvas tools")]
struct Cli {
    /// Directory for preference files (defaults to the user config dir).
    #[arg(long, env = "STUDYBOARD_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a scene file and summarize its contents.
    Inspect { scene: PathBuf },
    /// Turn a diagram description into a scene.
    ImportDiagram {
        diagram: PathBuf,
        /// Add the diagram on top of this scene.
        #[arg(long)]
        into: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Replay a pointer script against a scene.
    Replay {
        scene: PathBuf,
        script: PathBuf,
        /// Write here instead of overwriting the scene.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = commands::DEFAULT_VIEWPORT.width)]
        width: f64,
        #[arg(long, default_value_t = commands::DEFAULT_VIEWPORT.height)]
        height: f64,
    },
    Prefs(PrefsCommand),
}

#[derive(Args, Debug)]
struct PrefsCommand {
    #[command(subcommand)]
    command: PrefsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PrefsSubcommand {
    Show,
    Set(PrefsSetArgs),
}

#[derive(Args, Debug)]
struct PrefsSetArgs {
    #[arg(long, value_enum)]
    layout_mode: Option<LayoutModeArg>,
    #[arg(long)]
    sidebar_width: Option<f64>,
    #[arg(long)]
    show_grid_lines: Option<bool>,
    #[arg(long)]
    snap_to_grid: Option<bool>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LayoutModeArg {
    Topbar,
    SidebarLeft,
    SidebarRight,
    Minimal,
}

impl From<LayoutModeArg> for LayoutMode {
    fn from(arg: LayoutModeArg) -> Self {
        match arg {
            LayoutModeArg::Topbar => LayoutMode::Topbar,
            LayoutModeArg::SidebarLeft => LayoutMode::SidebarLeft,
            LayoutModeArg::SidebarRight => LayoutMode::SidebarRight,
            LayoutModeArg::Minimal => LayoutMode::Minimal,
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Inspect { scene } => {
            println!("{}", commands::inspect(&scene)?);
        }
        Command::ImportDiagram { diagram, into, out } => {
            let added = commands::import_diagram_file(&diagram, into.as_deref(), &out)?;
            println!("wrote {added} shapes to {}", out.display());
        }
        Command::Replay {
            scene,
            script,
            out,
            width,
            height,
        } => {
            let report = commands::replay(&scene, &script, out.as_deref(), Size::new(width, height))?;
            println!("{report}");
        }
        Command::Prefs(prefs) => {
            let store = commands::preference_store(cli.data_dir.as_deref())?;
            let preferences = match prefs.command {
                PrefsSubcommand::Show => commands::show_preferences(store),
                PrefsSubcommand::Set(args) => commands::set_preferences(
                    store,
                    PreferenceUpdate {
                        layout_mode: args.layout_mode.map(LayoutMode::from),
                        sidebar_width: args.sidebar_width,
                        show_grid_lines: args.show_grid_lines,
                        snap_to_grid: args.snap_to_grid,
                    },
                )?,
            };
            match serde_json::to_string_pretty(&preferences) {
                Ok(json) => println!("{json}"),
                Err(e) => log::error!("Could not format preferences: {e}"),
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("{cli:?}");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
