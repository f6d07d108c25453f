use super::{BatchReport, Identifiers};
use crate::config::Layout;
use crate::descriptor::{decode_request, walk_file, BatchEntry, DescriptorBatch};
use crate::emitter::{emit_routes, file_stem, route_table_path, EmitMode, FragmentKind};
use crate::error::{Result, ScaffoldError};
use crate::replacer::{Replacer, RuleScope};
use crate::writer::{OutputWriter, OverwritePolicy, RunLock, WriteOutcome};
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::CodeGeneratorResponse;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Usage printed by `protoc-gen-scaffold -h`
pub const PLUGIN_USAGE: &str = r#"
# generate *_router.pb.rs route tables only
protoc --proto_path=. --scaffold_out=. --scaffold_opt=paths=source_relative *.proto

# generate *_router.pb.rs, handler logic (*.rs), *_router.rs and *_http.rs files
protoc --proto_path=. --scaffold_out=. --scaffold_opt=paths=source_relative \
  --scaffold_opt=plugin=handler --scaffold_opt=moduleName=your_api_crate \
  --scaffold_opt=serverName=your_server *.proto

# generate *_router.pb.rs, service logic (*.rs), *_router.rs and *_rpc.rs files
protoc --proto_path=. --scaffold_out=. --scaffold_opt=paths=source_relative \
  --scaffold_opt=plugin=service --scaffold_opt=moduleName=your_api_crate \
  --scaffold_opt=serverName=your_server *.proto

Options:
  plugin      handler, service, or empty for route tables only
  moduleName  crate the generated code imports proto messages from
  serverName  server the generated router registers with
  logicOut    directory of handler/service logic (default src/handler or src/service)
  routerOut   directory of router glue (default src/routers)
  ecodeOut    directory of error codes (default src/ecode)

Existing files are never overwritten: a second run writes <file>.gen<YYYYMMDDThhmmss>
next to the original.
"#;

/// Map a plugin selector to an emit mode
///
/// Spaces are ignored; an empty selector only produces route tables.
pub fn plugin_mode(plugin: &str) -> Result<EmitMode> {
    match plugin.replace(' ', "").as_str() {
        "" => Ok(EmitMode::RoutesOnly),
        "handler" => Ok(EmitMode::Handler),
        "service" => Ok(EmitMode::Service),
        _ => Err(ScaffoldError::UnknownPlugin(plugin.to_string())),
    }
}

/// Options passed through `--scaffold_opt`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginParams {
    pub plugin: String,
    pub module_name: String,
    pub server_name: String,
    pub logic_out: Option<PathBuf>,
    pub router_out: Option<PathBuf>,
    pub ecode_out: Option<PathBuf>,
}

impl PluginParams {
    /// Parse the comma-separated `key=value` parameter string
    ///
    /// Keys meant for protoc itself (`paths=source_relative`) are ignored.
    pub fn parse(parameter: &str) -> Self {
        let mut params = PluginParams::default();
        for pair in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = value.trim().to_string();
            match key.trim() {
                "plugin" => params.plugin = value,
                "moduleName" => params.module_name = value,
                "serverName" => params.server_name = value,
                "logicOut" => params.logic_out = Some(PathBuf::from(value)),
                "routerOut" => params.router_out = Some(PathBuf::from(value)),
                "ecodeOut" => params.ecode_out = Some(PathBuf::from(value)),
                other => debug!(option = other, "ignoring plugin option"),
            }
        }
        params
    }
}

/// Everything one proto generation run needs
#[derive(Debug, Clone)]
pub struct ProtoJob {
    pub mode: EmitMode,
    pub identifiers: Identifiers,
    pub logic_out: PathBuf,
    pub router_out: PathBuf,
    pub ecode_out: PathBuf,
    pub policy: OverwritePolicy,
}

impl ProtoJob {
    /// Resolve output directories: explicit values win over the layout
    pub fn new(
        mode: EmitMode,
        identifiers: Identifiers,
        layout: &Layout,
        logic_out: Option<PathBuf>,
        router_out: Option<PathBuf>,
        ecode_out: Option<PathBuf>,
    ) -> Self {
        let default_logic = match mode {
            EmitMode::Service => layout.service.clone(),
            _ => layout.handler.clone(),
        };
        ProtoJob {
            mode,
            identifiers,
            logic_out: logic_out.unwrap_or(default_logic),
            router_out: router_out.unwrap_or_else(|| layout.routers.clone()),
            ecode_out: ecode_out.unwrap_or_else(|| layout.ecode.clone()),
            policy: OverwritePolicy::Preserve,
        }
    }

    pub fn from_params(params: &PluginParams, layout: &Layout) -> Result<Self> {
        Ok(Self::new(
            plugin_mode(&params.plugin)?,
            Identifiers::new(&params.module_name, &params.server_name),
            layout,
            params.logic_out.clone(),
            params.router_out.clone(),
            params.ecode_out.clone(),
        ))
    }

    pub fn with_policy(mut self, policy: OverwritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Logic-bearing fragment and error-code suffix of the mode
    fn logic(&self) -> Option<(FragmentKind, &'static str, &'static str)> {
        match self.mode {
            EmitMode::RoutesOnly => None,
            EmitMode::Handler => Some((FragmentKind::Handler, "_http", "handler code")),
            EmitMode::Service => Some((FragmentKind::Service, "_rpc", "service code")),
        }
    }

    /// Check the identifiers the mode needs; called before anything touches disk
    pub fn validate(&self) -> Result<()> {
        if let Some((_, _, what)) = self.logic() {
            self.identifiers.require(what, true)?;
        }
        Ok(())
    }

    /// Resolve the output directories against `root`
    pub fn rooted(mut self, root: &Path) -> Self {
        self.logic_out = root.join(&self.logic_out);
        self.router_out = root.join(&self.router_out);
        self.ecode_out = root.join(&self.ecode_out);
        self
    }
}

/// A route table produced for one proto file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTableFile {
    /// Path relative to the plugin output root
    pub name: String,
    pub content: String,
}

/// Result of a proto generation run
#[derive(Debug, Default)]
pub struct ProtoRun {
    pub report: BatchReport,
    pub route_tables: Vec<RouteTableFile>,
}

/// Generate every file of `batch`
///
/// Identifiers are checked before the first write. A file whose descriptor
/// is malformed, or whose output cannot be written, is reported and skipped.
pub fn run_proto(
    batch: &DescriptorBatch,
    job: &ProtoJob,
    replacer: &Replacer,
    writer: &OutputWriter,
) -> Result<ProtoRun> {
    job.validate()?;

    let mut run = ProtoRun::default();
    for entry in batch.entries() {
        match generate_file(entry, job, replacer, writer) {
            Ok((table, outcomes)) => {
                run.route_tables.extend(table);
                run.report.record_success(&entry.name, outcomes);
            }
            Err(e) if e.is_item_local() => run.report.record_failure(&entry.name, &e),
            Err(e) => return Err(e),
        }
    }
    info!(
        files = batch.len(),
        succeeded = run.report.succeeded.len(),
        failed = run.report.failures.len(),
        diverted = run.report.diverted(),
        "proto generation finished"
    );
    Ok(run)
}

fn generate_file(
    entry: &BatchEntry,
    job: &ProtoJob,
    replacer: &Replacer,
    writer: &OutputWriter,
) -> Result<(Option<RouteTableFile>, Vec<WriteOutcome>)> {
    let descriptor = entry.descriptor()?;
    let routes = walk_file(descriptor)?;
    let mut fragments = emit_routes(&entry.name, &routes, job.mode)?;
    if fragments.is_empty() {
        debug!(file = %entry.name, "no services, nothing to generate");
        return Ok((None, Vec::new()));
    }

    let rules = job.identifiers.rules(RuleScope::CONTENT);
    let table = match fragments.take(FragmentKind::RouteTable) {
        Some(text) => {
            let name = route_table_path(&entry.name);
            Some(RouteTableFile {
                content: replacer.render_text(&text, &rules, Path::new(&name))?,
                name,
            })
        }
        None => None,
    };

    let Some((logic_kind, ecode_suffix, _)) = job.logic() else {
        return Ok((table, Vec::new()));
    };
    let stem = file_stem(&entry.name);
    let targets = [
        (logic_kind, job.logic_out.join(format!("{stem}.rs"))),
        (FragmentKind::Router, job.router_out.join(format!("{stem}_router.rs"))),
        (
            FragmentKind::ErrorCode,
            job.ecode_out.join(format!("{stem}{ecode_suffix}.rs")),
        ),
    ];

    // render everything before writing anything so a bad file leaves no partial output
    let mut rendered = Vec::with_capacity(targets.len());
    for (kind, dest) in targets {
        if let Some(text) = fragments.take(kind) {
            let content = replacer.render_text(&text, &rules, &dest)?;
            rendered.push((dest, content));
        }
    }
    let mut outcomes = Vec::with_capacity(rendered.len());
    for (dest, content) in rendered {
        outcomes.push(writer.write(&dest, content.as_bytes(), job.policy)?);
    }
    Ok((table, outcomes))
}

/// Serve one protoc plugin invocation
///
/// Logic, router and error-code files are written under `root`; route
/// tables go back to protoc in the response. Run-level failures become a
/// response error, per-file failures are only logged so protoc still writes
/// the route tables of the files that worked.
pub fn serve_plugin(
    request: &[u8],
    layout: &Layout,
    replacer: &Replacer,
    writer: &OutputWriter,
    root: &Path,
) -> CodeGeneratorResponse {
    let result = decode_request(request).and_then(|request| {
        let params = PluginParams::parse(request.parameter.as_deref().unwrap_or_default());
        let job = ProtoJob::from_params(&params, layout)?.rooted(root);
        job.validate()?;
        let _lock = match job.mode {
            EmitMode::RoutesOnly => None,
            _ => Some(RunLock::acquire(root)?),
        };
        run_proto(&DescriptorBatch::from_request(&request), &job, replacer, writer)
    });
    match result {
        Ok(run) => plugin_response(&run),
        Err(e) => {
            error!(error = %e, "plugin run failed");
            error_response(&e)
        }
    }
}

/// Plugin response carrying the route tables
pub fn plugin_response(run: &ProtoRun) -> CodeGeneratorResponse {
    CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        file: run
            .route_tables
            .iter()
            .map(|t| File {
                name: Some(t.name.clone()),
                content: Some(t.content.clone()),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

/// Plugin response reporting a run-level failure to protoc
pub fn error_response(error: &ScaffoldError) -> CodeGeneratorResponse {
    CodeGeneratorResponse {
        error: Some(format!("protoc-gen-scaffold: {error}")),
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    }
}
