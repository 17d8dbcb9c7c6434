use std::path::Path;

use calframe_core::filing::destination_root;
use calframe_core::frame::{FilterTag, MasterFrame};
use calframe_core::pipeline::{PipelineConfig, RunSummary};
use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    warning: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            warning: Style::new().yellow().bold(),
            path: Style::new().underlined(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(title.chars().count())));
    println!();
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();
    print_title(&s, "calframe Pipeline");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Source"),
        s.path.apply_to(config.source.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Destination"),
        s.path
            .apply_to(destination_root(&config.source, &config.destination).display())
    );
    println!();

    println!("  {}", s.header.apply_to("Masters"));
    for (label, folder) in [
        ("Darks", &config.darks),
        ("Biases", &config.biases),
        ("Flats", &config.flats),
    ] {
        println!(
            "    {:<12}{}",
            s.label.apply_to(label),
            s.path.apply_to(folder.display())
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Selection"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Type"),
        s.value.apply_to(&config.image_type)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Flag"),
        s.value.apply_to(&config.flag)
    );
    println!();

    println!("  {}", s.header.apply_to("Policies"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Existing"),
        s.method.apply_to(config.overwrite)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("On error"),
        s.method.apply_to(config.on_error)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Execution"),
        s.method.apply_to(config.execution)
    );
    if config.delete_source {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Sources"),
            s.warning.apply_to("deleted after filing")
        );
    }
    println!();
}

pub fn print_run_summary(summary: &RunSummary) {
    let s = Styles::new();
    print_title(&s, "Run Summary");

    let counts = [
        ("Processed", summary.processed),
        ("Skipped", summary.skipped),
        ("Not processed", summary.not_processed),
    ];
    for (label, count) in counts {
        println!(
            "  {:<16}{}",
            s.label.apply_to(label),
            s.value.apply_to(count)
        );
    }
    if !summary.failed.is_empty() {
        println!(
            "  {:<16}{}",
            s.label.apply_to("Failed"),
            s.warning.apply_to(summary.failed.len())
        );
        for failure in &summary.failed {
            println!(
                "    {}  {}",
                s.path.apply_to(failure.path.display()),
                s.warning.apply_to(&failure.reason)
            );
        }
    }
    println!();

    println!("  {}", s.header.apply_to("Masters"));
    println!(
        "    {:<12}{} frame(s)",
        s.label.apply_to("Dark"),
        s.value.apply_to(summary.dark_count)
    );
    println!(
        "    {:<12}{} frame(s)",
        s.label.apply_to("Bias"),
        s.value.apply_to(summary.bias_count)
    );
    for (filter, count) in &summary.flat_counts {
        println!(
            "    {:<12}{} frame(s)",
            s.label.apply_to(format!("Flat {filter}")),
            s.value.apply_to(count)
        );
    }

    if !summary.destinations.is_empty() {
        println!();
        println!("  {}", s.header.apply_to("Ready for stacking"));
        for dir in &summary.destinations {
            println!("    {}", s.path.apply_to(dir.display()));
        }
    }
    println!();
}

pub fn print_master_summary(
    folder: &Path,
    filter: Option<&FilterTag>,
    master: &MasterFrame,
    output: &Path,
) {
    let s = Styles::new();
    print_title(&s, "Master Frame");

    let (height, width) = master.dim();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Folder"),
        s.path.apply_to(folder.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Filter"),
        s.method
            .apply_to(filter.map_or_else(|| "any".to_string(), FilterTag::to_string))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(master.sample_count)
    );
    println!(
        "  {:<14}{}x{}",
        s.label.apply_to("Dimensions"),
        s.value.apply_to(width),
        s.value.apply_to(height)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.display())
    );
    println!();
}
