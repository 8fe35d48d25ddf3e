use afterglow::{AppConfig, Effect};
use clap::Parser;

/// Interactive post-processing playground.
#[derive(Parser)]
#[command(name = "afterglow", version, about)]
struct Args {
    /// Window width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Window height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Effect to start with (see --list-effects).
    #[arg(long)]
    effect: Option<Effect>,

    /// Print every effect slug and exit.
    #[arg(long)]
    list_effects: bool,

    /// Disable vsync.
    #[arg(long)]
    no_vsync: bool,
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    if args.list_effects {
        for effect in Effect::ALL {
            println!("{:20} {}", effect.info().slug, effect.name());
        }
        return;
    }

    let mut config = AppConfig::new()
        .title("Afterglow")
        .size(args.width, args.height)
        .vsync(!args.no_vsync);
    if let Some(effect) = args.effect {
        config = config.effect(effect);
    }

    afterglow::run(config);
}
