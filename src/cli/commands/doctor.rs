//! Doctor command implementation
//!
//! Reports which external tools are available on `PATH`.

use crate::cli::context::DemoContext;
use crate::cli::output::{Output, Table};

/// Run the doctor command
pub fn run_doctor(ctx: &DemoContext) -> anyhow::Result<()> {
    Output::header("External tools");
    println!();

    let mut table = Table::new(vec!["Tool", "Status", "Path"]);
    let mut missing = Vec::new();
    for (name, bin) in ctx.options.tools.all() {
        match which::which(bin) {
            Ok(path) => {
                let path = path.display().to_string();
                table.add_row(vec![name, "found", path.as_str()]);
            }
            Err(_) => {
                table.add_row(vec![name, "missing", bin]);
                missing.push(name);
            }
        }
    }
    table.print();

    println!();
    Output::kv("host", &ctx.options.host.to_string());
    Output::kv("workdir", &ctx.options.workdir.display().to_string());

    println!();
    if missing.is_empty() {
        Output::success("All tools found");
    } else {
        Output::warning(&format!("Missing: {}", missing.join(", ")));
        if missing.contains(&"nvidia-smi") {
            Output::info("Without nvidia-smi demos run on the CPU");
        }
    }

    Ok(())
}
