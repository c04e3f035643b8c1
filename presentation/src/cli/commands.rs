//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use math_comic_domain::{AgeGroup, ComicStyle, DetailLevel, ExportFormat, OptionsInput};
use std::path::PathBuf;

/// Output format for a generated comic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Formatted panels with dialogue and image locations
    #[default]
    Full,
    /// The comic document as JSON
    Json,
}

/// CLI arguments for math-comic
#[derive(Parser, Debug)]
#[command(name = "math-comic")]
#[command(author, version, about = "Turn a math topic into a multi-panel educational comic")]
#[command(long_about = r#"
math-comic turns a math topic into a multi-panel educational comic.

A topic goes through these stages:
1. Concept check: the topic must be recognizably mathematical
2. Options: age group, panel count and style are normalized
3. Story: a language model writes the panel script
4. Drawing: every panel image is generated concurrently
5. Saving: the comic is stored and can be listed, shown or exported

Configuration files are loaded from (in priority order):
1. MATH_COMIC_* environment variables (e.g. MATH_COMIC_RETRY__MAX_ATTEMPTS=5)
2. --config <path>          Explicit config file
3. ./math-comic.toml        Project-level config
4. ~/.config/math-comic/config.toml   Global config

Example:
  math-comic generate "分数的认识" --age child --panels 4
  math-comic generate "Pythagorean theorem" --age teen --style manga -o json
  math-comic export 5f0c... --format bundle --out comic.tar.gz
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a comic for a math topic
    Generate(GenerateArgs),

    /// List stored comics, newest first
    List,

    /// Show a stored comic
    Show {
        /// Comic id
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "full")]
        output: OutputFormat,
    },

    /// Delete a stored comic and its unshared images
    Delete {
        /// Comic id
        id: String,
    },

    /// Export a stored comic
    Export {
        /// Comic id
        id: String,

        /// json, markdown (md) or bundle (tar.gz)
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// Destination file (default: <id>.<extension>; "-" for stdout)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Show statistics over all stored comics
    Stats,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// The math topic, e.g. "三角形的面积" or "fractions"
    pub topic: String,

    /// Target audience: child, teen or adult
    #[arg(long, value_name = "AGE")]
    pub age: Option<AgeGroup>,

    /// Number of panels
    #[arg(long, value_name = "N")]
    pub panels: Option<u8>,

    /// Art style: cartoon, watercolor, manga, realistic or storybook
    #[arg(long, value_name = "STYLE")]
    pub style: Option<ComicStyle>,

    /// Language tag for dialogue and narration (e.g. zh-CN, en)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Vocabulary and narration density: simple, standard or detailed
    #[arg(long, value_name = "LEVEL")]
    pub detail: Option<DetailLevel>,

    /// Omit narration captions
    #[arg(long)]
    pub no_narration: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "full")]
    pub output: OutputFormat,
}

impl GenerateArgs {
    /// Options the caller set explicitly; `None` when nothing was given
    pub fn options_input(&self) -> Option<OptionsInput> {
        let input = OptionsInput {
            age_group: self.age,
            panel_count: self.panels,
            style: self.style,
            language: self.language.clone(),
            include_narration: self.no_narration.then_some(false),
            detail_level: self.detail,
        };
        (input != OptionsInput::default()).then_some(input)
    }
}
