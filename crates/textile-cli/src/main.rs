use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use textile_config::Config;
use textile_engine::OutputKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Html,
    Text,
}

impl From<Output> for OutputKind {
    fn from(output: Output) -> Self {
        match output {
            Output::Html => OutputKind::Html,
            Output::Text => OutputKind::Text,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "textile")]
#[command(version, about = "Convert Textile markup to HTML or plain text", long_about = None)]
#[command(after_help = "EXAMPLES:
    textile notes.textile              Render a file to HTML on stdout
    echo 'h1. Hi' | textile            Render stdin
    textile --restricted comment.txt   Render untrusted input")]
struct Cli {
    /// Input file; reads stdin when omitted or `-`
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    output: Option<Output>,

    /// Escape raw HTML and only allow safe link schemes
    #[arg(long)]
    restricted: bool,

    /// Only paragraphs and blockquotes
    #[arg(long)]
    lite: bool,

    /// Leave image markup as text
    #[arg(long)]
    no_images: bool,

    /// Keep blank lines exactly as written
    #[arg(long)]
    strict: bool,

    /// rel attribute for every generated link, e.g. nofollow
    #[arg(long, value_name = "REL")]
    rel: Option<String>,

    /// Prefix for relative link and image URLs
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Config file to use instead of ~/.config/textile/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Only escape bare ampersands
    #[arg(long)]
    encode_only: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Command-line flags win over the config file.
    fn apply_to(&self, config: &mut Config) {
        if let Some(output) = self.output {
            config.output = output.into();
        }
        config.restricted |= self.restricted;
        config.lite |= self.lite;
        config.no_images |= self.no_images;
        config.strict_whitespace |= self.strict;
        if let Some(rel) = &self.rel {
            config.link_rel = Some(rel.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    log::debug!("Config path: {}", config_path.display());
    let mut config = Config::load_from_path(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?
        .unwrap_or_default();
    cli.apply_to(&mut config);

    let input = read_input(cli.input.as_ref())?;

    let textile = config
        .build_textile()
        .context("setting up the converter")?;
    let options = config
        .to_render_options()
        .with_encode_only(cli.encode_only);
    let rendered = textile.render(&input, &options);

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}").context("writing output")?;
    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("reading stdin")?;
            Ok(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_override_the_config_file() {
        let cli = Cli::parse_from([
            "textile",
            "--output",
            "text",
            "--restricted",
            "--rel",
            "nofollow",
            "notes.textile",
        ]);
        let mut config = Config {
            lite: true,
            link_rel: Some("external".to_string()),
            ..Config::default()
        };

        cli.apply_to(&mut config);

        assert_eq!(config.output, OutputKind::Text);
        assert!(config.restricted);
        assert!(config.lite);
        assert_eq!(config.link_rel.as_deref(), Some("nofollow"));
        assert_eq!(cli.input, Some(PathBuf::from("notes.textile")));
    }

    #[test]
    fn no_flags_leave_the_config_alone() {
        let cli = Cli::parse_from(["textile"]);
        let mut config = Config {
            base_url: Some("https://example.com/".to_string()),
            ..Config::default()
        };
        let before = config.clone();

        cli.apply_to(&mut config);

        assert_eq!(config, before);
        assert_eq!(cli.input, None);
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
