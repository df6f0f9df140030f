use std::process::ExitCode;

use cubiclight::{CubiclightBuilder, CubiclightConfig, CubiclightError};

use clap::{ArgGroup, Parser};

/// Adjust display backlight brightness on a perceptually even notch scale.
#[derive(Parser, Debug)]
#[command(name = "cubiclight", version, about, long_about = None)]
#[command(group(
            ArgGroup::new("action")
                .args(["inc", "dec", "set", "set_raw", "scale"]),
        ))]
struct Args {
    /// Step one notch brighter
    #[arg(short = 'i')]
    inc: bool,

    /// Step one notch darker (stops at notch 1 unless -z is given)
    #[arg(short = 'd')]
    dec: bool,

    /// Jump to the given notch
    #[arg(short = 's', value_name = "NOTCH", allow_negative_numbers = true)]
    set: Option<i32>,

    /// Set the raw hardware level directly, bypassing the notch scale
    #[arg(short = 'e', value_name = "LEVEL", allow_negative_numbers = true)]
    set_raw: Option<i32>,

    /// Print the raw level for every notch on one line
    #[arg(short = 'q')]
    scale: bool,

    /// Number of notches between dark and full brightness
    #[arg(short = 'n', value_name = "COUNT")]
    notches: Option<u32>,

    /// Device index (accepted for compatibility; the first backlight-capable
    /// output is always used)
    #[arg(short = 'o', value_name = "INDEX")]
    output: Option<usize>,

    /// Allow -d to step down to the device minimum, usually a dark panel
    #[arg(short = 'z')]
    to_zero: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("cubiclight: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), CubiclightError> {
    let mut config = CubiclightConfig::new()?;
    if let Some(notches) = args.notches {
        config.notches = notches;
    }
    if let Some(output) = args.output {
        config.device_index = output;
    }
    if args.to_zero {
        config.to_zero = true;
    }

    let light = CubiclightBuilder::new().with_config(config).build()?;

    if args.inc {
        light.increment()
    } else if args.dec {
        light.decrement()
    } else if let Some(notch) = args.set {
        light.set_notch(notch)
    } else if let Some(raw) = args.set_raw {
        light.set_raw(raw)
    } else if args.scale {
        let levels: Vec<String> = light.scale_levels().iter().map(i32::to_string).collect();
        println!("{}", levels.join(" "));
        Ok(())
    } else {
        println!("{}", light.status());
        Ok(())
    }
}
