use crate::config::ScaffoldConfig;
use crate::descriptor::load_descriptor_set;
use crate::logging::{init_logging, LogConfig};
use crate::pipeline::proto::{plugin_mode, run_proto, ProtoJob};
use crate::pipeline::sql::{default_out_dir, run_dao, DaoJob};
use crate::pipeline::{BatchReport, Identifiers};
use crate::replacer::Replacer;
use crate::schema::{source_from_dsn, SchemaOptions, TagNaming};
use crate::writer::{OutputWriter, OverwritePolicy, RunLock, WriteOutcome};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Command-line interface for the scaffolder
///
/// Generates routing tables, handler and service stubs, error codes and DAO
/// code into an existing project without overwriting anything already there.
#[derive(Parser)]
#[command(name = "scaffolder")]
#[command(about = "Rust service scaffolding from proto descriptors and table schemas", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./scaffold.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the batch report as JSON on stdout
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate route tables, logic stubs, router glue and error codes from a descriptor set
    Proto {
        /// FileDescriptorSet written by `protoc --include_imports --descriptor_set_out`
        #[arg(short, long)]
        descriptor_set: PathBuf,

        /// Proto files to generate (repeatable); default is every file of the set
        #[arg(short, long)]
        file: Vec<String>,

        /// handler, service, or empty for route tables only
        #[arg(long, default_value = "")]
        plugin: String,

        /// Crate the generated code imports proto messages from
        #[arg(long, default_value = "")]
        module_name: String,

        /// Server the generated router registers with
        #[arg(long, default_value = "")]
        server_name: String,

        /// Directory of handler/service logic
        #[arg(long)]
        logic_out: Option<PathBuf>,

        /// Directory of router glue
        #[arg(long)]
        router_out: Option<PathBuf>,

        /// Directory of error codes
        #[arg(long)]
        ecode_out: Option<PathBuf>,

        /// Project root every output directory is relative to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Overwrite existing files instead of writing `.gen<timestamp>` siblings
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Generate model, DAO and DAO test code for database tables
    Dao {
        /// Schema source: `ddl:<file>`, `file://<file>` or a `.sql` path
        #[arg(long)]
        db_dsn: String,

        /// Table names, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        db_table: Vec<String>,

        /// Crate name of the target project
        #[arg(long)]
        module_name: String,

        /// Embed id/created_at/updated_at/deleted_at through a shared audit base
        #[arg(long, default_value_t = false)]
        embed: bool,

        /// Naming of serialized field names
        #[arg(long, value_enum, default_value_t = TagNaming::Camel)]
        json_name_type: TagNaming,

        /// Prefix stripped from table names (`t_order` becomes `order`)
        #[arg(long)]
        table_prefix: Option<String>,

        /// Output root (default: dao_<timestamp>)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also generate the connection pool initializer
        #[arg(long, default_value_t = false)]
        include_init_db: bool,

        /// Template set to render (default from configuration)
        #[arg(long)]
        template_set: Option<String>,

        /// Overwrite existing files instead of writing `.gen<timestamp>` siblings
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

/// Parse the command line and run it
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env());
    run(cli)
}

/// Run an already parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ScaffoldConfig::load(cli.config.as_deref())?;
    let replacer = Replacer::new(config.markers.clone());
    let writer = OutputWriter::new();

    let report = match cli.command {
        Commands::Proto {
            descriptor_set,
            file,
            plugin,
            module_name,
            server_name,
            logic_out,
            router_out,
            ecode_out,
            out,
            force,
        } => {
            let batch = load_descriptor_set(&descriptor_set, &file).with_context(|| {
                format!("Failed to load descriptor set {}", descriptor_set.display())
            })?;
            let policy = OverwritePolicy::from_force(force);
            let job = ProtoJob::new(
                plugin_mode(&plugin)?,
                Identifiers::new(module_name, server_name),
                &config.layout,
                logic_out,
                router_out,
                ecode_out,
            )
            .with_policy(policy)
            .rooted(&out);
            job.validate()?;

            let _lock = RunLock::acquire(&out)?;
            let mut run = run_proto(&batch, &job, &replacer, &writer)?;
            for table in &run.route_tables {
                let outcome = writer.write(&out.join(&table.name), table.content.as_bytes(), policy)?;
                run.report.outcomes.push(outcome);
            }
            run.report
        }
        Commands::Dao {
            db_dsn,
            db_table,
            module_name,
            embed,
            json_name_type,
            table_prefix,
            out,
            include_init_db,
            template_set,
            force,
        } => {
            let source = source_from_dsn(&db_dsn)?;
            let registry = config.template_registry()?;
            let set = registry.resolve(template_set.as_deref())?;
            let template_root = set.root()?;

            let job = DaoJob {
                module_name,
                tables: db_table
                    .iter()
                    .flat_map(|t| DaoJob::split_tables(t))
                    .collect(),
                options: SchemaOptions {
                    naming: json_name_type,
                    embed_audit: embed,
                    table_prefix: table_prefix.or_else(|| config.table_prefix.clone()),
                },
                include_init_db,
                out: out.unwrap_or_else(|| default_out_dir(&writer)),
                policy: OverwritePolicy::from_force(force),
            };

            job.validate()?;
            let _lock = RunLock::acquire(&job.out)?;
            run_dao(
                source.as_ref(),
                &job,
                template_root,
                &config.layout,
                &replacer,
                &writer,
            )?
        }
    };

    print_report(&report, cli.json)?;
    if !report.is_clean() {
        bail!(
            "{} of {} items failed",
            report.failures.len(),
            report.failures.len() + report.succeeded.len()
        );
    }
    Ok(())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn print_report(report: &BatchReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for outcome in &report.outcomes {
        match outcome {
            WriteOutcome::Created { path } => println!("✅ Generated: {}", display(path)),
            WriteOutcome::Overwritten { path } => println!("♻️  Overwritten: {}", display(path)),
            WriteOutcome::Diverted { original, written } => println!(
                "⚠️  {} exists, generated {}",
                display(original),
                display(written)
            ),
        }
    }
    for failure in &report.failures {
        eprintln!("❌ {}: {}", failure.item, failure.message);
    }
    Ok(())
}
