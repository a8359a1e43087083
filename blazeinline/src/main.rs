use blazeinline_lib::{ApplyOrder, InlineError, InlineOptions, Inliner, MediaPolicy, RuleSource};
use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

const BLAZEINLINE_INTRO: &str = r#"
        ____  __                ____      ___
       / __ )/ /___ _____  ___ /  _/___  / (_)___  ___
      / __  / / __ `/_  / / _ \/ // __ \/ / / __ \/ _ \
     / /_/ / / /_/ / / /_/  __// // / / / / / / / /  __/
    /_____/_/\__,_/ /___/\___/___/_/ /_/_/_/_/ /_/\___/

    BlazeInline - move <style> rules into style attributes
"#;

#[derive(Clone, Copy, ValueEnum)]
enum MediaArg {
    Truncate,
    Skip,
    Flatten,
}

impl From<MediaArg> for MediaPolicy {
    fn from(media: MediaArg) -> Self {
        match media {
            MediaArg::Truncate => MediaPolicy::Truncate,
            MediaArg::Skip => MediaPolicy::Skip,
            MediaArg::Flatten => MediaPolicy::Flatten,
        }
    }
}

#[derive(Parser)]
#[command(name = "BlazeInline")]
#[command(about = "Inline <style> rules into HTML style attributes")]
struct Args {
    /// Input HTML file.
    input: PathBuf,

    /// Output file. Defaults to stdout.
    output: Option<PathBuf>,

    /// Never fail: fall back to stripping styles, then to the input as-is.
    #[arg(long)]
    safe: bool,

    /// Remove elements matching TAG but keep their content. Repeatable.
    #[arg(long = "unwrap", value_name = "TAG")]
    unwrap: Vec<String>,

    #[arg(long, value_enum, default_value = "skip")]
    media: MediaArg,

    /// Extract rules with lightningcss instead of the built-in scanner.
    #[arg(long)]
    lightningcss: bool,

    /// Apply the most specific rules last.
    #[arg(long)]
    cascade: bool,

    #[arg(long)]
    keep_style_tags: bool,

    /// Reject input html5ever reports parse errors for.
    #[arg(long)]
    strict_html: bool,

    #[arg(long, value_name = "N")]
    max_input_bytes: Option<usize>,

    #[arg(long, value_name = "N")]
    max_stylesheet_bytes: Option<usize>,
}

impl Args {
    fn options(&self) -> InlineOptions {
        InlineOptions {
            media: self.media.into(),
            rule_source: if self.lightningcss {
                RuleSource::Lightning
            } else {
                RuleSource::Scanner
            },
            apply_order: if self.cascade {
                ApplyOrder::LeastSpecificFirst
            } else {
                ApplyOrder::MostSpecificFirst
            },
            remove_style_tags: !self.keep_style_tags,
            strict_html: self.strict_html,
            max_input_bytes: self.max_input_bytes,
            max_stylesheet_bytes: self.max_stylesheet_bytes,
        }
    }
}

fn run(args: &Args, html: &str) -> Result<String, InlineError> {
    let inliner = Inliner::new(args.options());
    let mut html = if args.safe {
        inliner.inline_safe(html)
    } else {
        inliner.inline(html)?
    };
    for tag in &args.unwrap {
        html = match inliner.remove_tags_keep_content(&html, tag) {
            Ok(unwrapped) => unwrapped,
            Err(e) if args.safe => {
                log::warn!("could not unwrap `{tag}`: {e}");
                html
            }
            Err(e) => return Err(e),
        };
    }
    Ok(html)
}

fn main() {
    env_logger::init();

    // parse the args given in terminal
    let args = Args::parse();

    if args.output.is_some() {
        eprintln!("{}", BLAZEINLINE_INTRO);
    }

    let html = match fs::read_to_string(&args.input) {
        Ok(html) => html,
        Err(e) => {
            eprintln!("Error reading HTML file: {}", e);
            std::process::exit(1);
        }
    };

    let inlined = match run(&args, &html) {
        Ok(inlined) => inlined,
        Err(e) => {
            eprintln!("Error inlining styles: {}", e);
            std::process::exit(1);
        }
    };

    let written = match &args.output {
        Some(path) => fs::write(path, &inlined),
        None => io::stdout().write_all(inlined.as_bytes()),
    };
    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        std::process::exit(1);
    }
}
