use anyhow::Result;
use clap::Parser;
use link_icon_gen::{
    color::Rgb,
    icon_gen::{self, Config, GeneratedIcon, MissingCapability},
};
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

#[derive(Debug, Parser)]
#[clap(
    name = "link-icon-gen",
    about = "Generate placeholder chain-link icons for a browser extension"
)]
struct Args {
    /// Output directory.
    #[clap(short, long, value_name = "DIR", default_value = "icons")]
    output: PathBuf,

    /// Comma-separated icon sizes in pixels. Pass an empty string to generate nothing.
    #[clap(
        short,
        long,
        value_name = "SIZES",
        default_value = "16,32,48,128",
        value_parser = parse_sizes
    )]
    sizes: SizeList,

    /// First gradient color (CSS color format)
    #[clap(long, value_name = "COLOR", default_value = "#667eea")]
    color_a: Rgb,

    /// Second gradient color (CSS color format)
    #[clap(long, value_name = "COLOR", default_value = "#764ba2")]
    color_b: Rgb,

    /// Smallest icon size that gets the chain-link glyph
    #[clap(long, value_name = "PX", default_value_t = icon_gen::GLYPH_MIN_SIZE)]
    glyph_min_size: u32,

    /// Also write an icons.json manifest fragment next to the icons
    #[clap(long)]
    manifest: bool,
}

#[derive(Debug, Clone)]
struct SizeList(Vec<u32>);

fn parse_sizes(value: &str) -> Result<SizeList, String> {
    let sizes = value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<u32>() {
            Ok(0) => Err("icon sizes must be positive".to_string()),
            Ok(size) => Ok(size),
            Err(_) => Err(format!("'{part}' is not a valid icon size")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SizeList(sizes))
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            sizes: args.sizes.0,
            color_a: args.color_a,
            color_b: args.color_b,
            output: args.output,
            glyph_min_size: args.glyph_min_size,
            manifest: args.manifest,
        }
    }
}

fn main() -> ExitCode {
    let config = Config::from(Args::parse());
    let result = icon_gen::generate_icons(&config);
    ExitCode::from(exit_status(&result, &config.output))
}

/// Report a failed run on stderr and pick the process exit status.
fn exit_status(result: &Result<Vec<GeneratedIcon>>, output: &Path) -> u8 {
    let Err(err) = result else {
        return 0;
    };

    match err.downcast_ref::<MissingCapability>() {
        Some(missing) => eprintln!("{}", missing_capability_message(missing, output)),
        None => eprintln!("Error: {err:?}"),
    }
    1
}

fn missing_capability_message(err: &MissingCapability, output: &Path) -> String {
    format!(
        "PNG rendering support not available ({}). Please rebuild with the image crate's \"png\" feature enabled.\n\
         Or manually create icon PNG files in the {}/ directory",
        err.reason,
        output.display()
    )
}
