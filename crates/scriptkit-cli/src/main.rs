mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    bookmark::BookmarkSubcommand, config::ConfigSubcommand, settings::SettingsSubcommand,
    templates::TemplatesSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "scriptkit",
    about = "Scaffold and lint Tampermonkey userscripts",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .scriptkit/ or .git/)
    #[arg(long, global = true, env = "SCRIPTKIT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .scriptkit/config.yaml in the project root
    Init {
        /// Default @author for generated scripts
        #[arg(long)]
        author: Option<String>,

        /// Default @namespace for generated scripts
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Generate a userscript from a template
    Generate {
        /// Script name, used for the file name and @name
        name: String,

        /// Match pattern, e.g. https://github.com/*
        url_pattern: String,

        /// Template kind: basic, advanced or spa (default from config)
        kind: Option<String>,

        /// Read templates from this directory instead of the built-in set
        #[arg(long)]
        templates_dir: Option<PathBuf>,

        /// Directory to write the script into (default from config)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Overwrite an existing script without asking
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Lint a userscript for metadata, grant, performance, security and style issues
    Validate {
        /// Path to the .user.js file
        file: PathBuf,
    },

    /// Print a userscript's metadata block
    Inspect {
        /// Path to the .user.js file
        file: PathBuf,
    },

    /// List or export the built-in templates
    Templates {
        #[command(subcommand)]
        subcommand: TemplatesSubcommand,
    },

    /// Manage YouTube timestamp bookmarks in a local store
    Bookmark {
        /// Storage file (default: .scriptkit/storage.json under the root)
        #[arg(long, global = true)]
        store: Option<PathBuf>,

        #[command(subcommand)]
        subcommand: BookmarkSubcommand,
    },

    /// Show, override or reset the advanced template's settings in a local store
    Settings {
        /// Storage file (default: .scriptkit/storage.json under the root)
        #[arg(long, global = true)]
        store: Option<PathBuf>,

        #[command(subcommand)]
        subcommand: SettingsSubcommand,
    },

    /// Show or validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    // Usage errors exit 1; --help and --version still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    tracing::debug!(root = %root.display(), "resolved project root");

    let result = match cli.command {
        Commands::Init { author, namespace } => {
            cmd::init::run(&root, author.as_deref(), namespace.as_deref(), cli.json)
        }
        Commands::Generate {
            name,
            url_pattern,
            kind,
            templates_dir,
            output_dir,
            force,
        } => cmd::generate::run(
            &root,
            cmd::generate::GenerateArgs {
                name,
                url_pattern,
                kind,
                templates_dir,
                output_dir,
                force,
            },
            cli.json,
        ),
        Commands::Validate { file } => cmd::validate::run(&root, &file, cli.json),
        Commands::Inspect { file } => cmd::inspect::run(&file, cli.json),
        Commands::Templates { subcommand } => cmd::templates::run(subcommand, cli.json),
        Commands::Bookmark { store, subcommand } => {
            cmd::bookmark::run(&root, store.as_deref(), subcommand, cli.json)
        }
        Commands::Settings { store, subcommand } => {
            cmd::settings::run(&root, store.as_deref(), subcommand, cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
