use std::{
    io::Read,
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use mapreduce_planner::{
    decompose, display_jobs_graphviz, resolve, resolve_forwarded, FileFormat, FormatRegistry,
    JobPlan, MrConfig, PlanDescription, ShuffleMetadata, SplitAssigner, TaskRole,
};
use object_store::local::LocalFileSystem;

#[derive(Parser)]
#[command(name = "mr-explain")]
#[command(about = "Shows how a compiled plan is decomposed into MapReduce jobs", long_about = None)]
struct Args {
    /// JSON plan description, `-` reads it from stdin
    plan: PathBuf,
    /// Print a Graphviz digraph of the jobs instead of text
    #[arg(long, default_value_t = false)]
    graphviz: bool,
    /// Also print the shuffle metadata every task side resolves
    #[arg(long, default_value_t = false)]
    metadata: bool,
    /// Assign the splits of the declared file inputs from the local file system
    #[arg(long, default_value_t = false)]
    splits: bool,
}

fn read_plan(path: &Path) -> Result<String> {
    let mut json = String::new();
    if path.as_os_str() == "-" {
        std::io::stdin().read_to_string(&mut json)?;
    } else {
        json = std::fs::read_to_string(path)
            .with_context(|| format!("could not read plan from {}", path.display()))?;
    }
    Ok(json)
}

fn print_metadata(label: &str, metadata: Option<ShuffleMetadata>) {
    let Some(metadata) = metadata else {
        println!("  {label}: none");
        return;
    };
    for tag in 0..metadata.tag_count() {
        println!(
            "  {label}[{tag}]: types={:?} keys={:?}",
            metadata.types(tag),
            metadata.key_indexes(tag)
        );
    }
}

fn print_job(job: &JobPlan, metadata: bool) -> Result<()> {
    let kind = if job.is_multi_input() { " (multi-input)" } else { "" };
    println!("{}{kind}", job.name_with_inputs());
    if !job.logical_inputs().is_empty() {
        println!("  scans inputs {:?}", job.logical_inputs());
    }
    print!("{}", job.plan);
    if metadata {
        print_metadata("producer", resolve(&job.plan, TaskRole::Producer)?);
        print_metadata("consumer", resolve(&job.plan, TaskRole::Consumer)?);
        print_metadata("forwarded", resolve_forwarded(&job.plan, job.output_tag())?);
    }
    println!();
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let description = PlanDescription::from_json(&read_plan(&args.plan)?)?;
    let ctx = description.static_context()?;
    let jobs = decompose(description.plan_tree()?)?;
    info!("Plan decomposed into {} jobs", jobs.len());

    if args.graphviz {
        print!("{}", display_jobs_graphviz(&jobs)?);
    } else {
        for job in &jobs {
            print_job(job, args.metadata)?;
        }
    }

    if args.splits {
        let cfg = MrConfig::from_env()?;
        let local = Arc::new(LocalFileSystem::new());
        let formats = FormatRegistry::new().with_format(FileFormat::new(local));
        let assigner = SplitAssigner::new(Arc::new(formats), cfg.split_size);
        for record in assigner.assign(&ctx.inputs).await? {
            println!(
                "input {} ({}): {}",
                record.input_index, record.format_id, record.split
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{e:#}");
        process::exit(1);
    }
    Ok(())
}
