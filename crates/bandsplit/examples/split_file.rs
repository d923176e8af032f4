use bandsplit::{BackgroundPolicy, SplitConfig, Splitter};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <image> <units> [color]", args[0]);
        std::process::exit(2);
    }

    let mut cfg = SplitConfig::with_units(args[2].parse()?);
    if let Some(token) = args.get(3) {
        cfg.background = token.parse::<BackgroundPolicy>()?;
    }

    let splitter = Splitter::with_config(cfg)?;
    let plan = splitter.plan_file(Path::new(&args[1]))?;
    println!(
        "{} cut(s) along the {} axis, unit size {}",
        plan.spans.len(),
        plan.orientation,
        plan.unit_size
    );

    let report = splitter.split_file(Path::new(&args[1]))?;
    for slice in &report.slices {
        println!(
            "{:>3}  [{:>6}, {:>6})  {}",
            slice.index,
            slice.span.start,
            slice.span.end,
            slice.path.display()
        );
    }
    Ok(())
}
