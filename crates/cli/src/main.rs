//! shapewire CLI
//!
//! Command-line interface for inspecting service models and running the
//! generic marshallers and unmarshallers against them.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use shapewire_codec::json::{JsonRequestMarshaller, JsonUnmarshaller};
use shapewire_codec::xml::{unmarshall_xml, XmlRequestMarshaller};
use shapewire_codec::Request;
use shapewire_common::{Protocol, ServiceMetadata, ServiceModel, StructureShape};
use shapewire_parser::load_service_model;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "shapewire")]
#[command(version, about = "Marshal and unmarshal cloud service payloads from Smithy models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ModelArgs {
    /// Path to the Smithy JSON AST model
    #[arg(short, long)]
    model: PathBuf,

    /// YAML file overriding protocol metadata of the model
    #[arg(long)]
    metadata: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the operations and shapes of a service model
    #[command(after_help = "EXAMPLES:\n  \
        # Summarize a model\n  \
        shapewire inspect --model models/route53.json\n\n  \
        # Show the field descriptors of one shape\n  \
        shapewire inspect --model models/route53.json --shape TrafficPolicy")]
    Inspect {
        #[command(flatten)]
        model: ModelArgs,

        /// Only show this structure or enum shape
        #[arg(short, long)]
        shape: Option<String>,
    },

    /// Marshal a JSON input document into a wire request
    #[command(after_help = "EXAMPLES:\n  \
        shapewire marshal \\\n    \
        --model models/datapipeline.json \\\n    \
        --metadata models/datapipeline.metadata.yaml \\\n    \
        --operation QueryObjects \\\n    \
        --input query.json")]
    Marshal {
        #[command(flatten)]
        model: ModelArgs,

        /// Operation name (e.g., "QueryObjects")
        #[arg(short, long)]
        operation: String,

        /// JSON document with the operation's input fields
        #[arg(short, long)]
        input: PathBuf,

        /// Wire protocol (defaults to the model's protocol)
        #[arg(short, long)]
        protocol: Option<WireFormat>,
    },

    /// Decode a response body into a model instance
    #[command(after_help = "EXAMPLES:\n  \
        shapewire unmarshal \\\n    \
        --model models/route53.json \\\n    \
        --shape GetTrafficPolicyResponse \\\n    \
        --response response.xml")]
    Unmarshal {
        #[command(flatten)]
        model: ModelArgs,

        /// Structure shape of the response
        #[arg(short, long)]
        shape: String,

        /// File containing the response body
        #[arg(short, long)]
        response: PathBuf,

        /// Body format (defaults to the model's protocol)
        #[arg(short, long)]
        format: Option<WireFormat>,
    },

    /// Resolve a token against an enum shape
    Enum {
        #[command(flatten)]
        model: ModelArgs,

        /// Enum shape name (e.g., "CACertificateStatus")
        #[arg(short, long)]
        shape: String,

        /// Wire token to resolve
        #[arg(long)]
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WireFormat {
    /// awsJson bodies
    Json,
    /// restXml bodies
    Xml,
}

impl WireFormat {
    fn for_protocol(protocol: Protocol) -> Self {
        if protocol.is_json() {
            WireFormat::Json
        } else {
            WireFormat::Xml
        }
    }
}

impl std::fmt::Display for WireFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireFormat::Json => write!(f, "JSON"),
            WireFormat::Xml => write!(f, "XML"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Inspect { model, shape } => {
            inspect_command(&model, shape.as_deref(), cli.verbose)?;
        },
        Commands::Marshal {
            model,
            operation,
            input,
            protocol,
        } => {
            marshal_command(&model, &operation, &input, protocol)?;
        },
        Commands::Unmarshal {
            model,
            shape,
            response,
            format,
        } => {
            unmarshal_command(&model, &shape, &response, format)?;
        },
        Commands::Enum {
            model,
            shape,
            value,
        } => {
            enum_command(&model, &shape, &value)?;
        },
    }

    Ok(())
}

/// Log to stderr so command output stays clean; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn load_model(args: &ModelArgs) -> Result<ServiceModel> {
    let mut service = load_service_model(&args.model)
        .with_context(|| format!("Failed to load service model {}", args.model.display()))?;

    if let Some(path) = &args.metadata {
        let metadata = ServiceMetadata::load(path).context("Failed to load service metadata")?;
        service.apply_metadata(&metadata);
        debug!(path = %path.display(), "applied service metadata");
    }

    Ok(service)
}

fn inspect_command(args: &ModelArgs, shape: Option<&str>, verbose: bool) -> Result<()> {
    println!("{} Loading model: {}", "→".cyan(), args.model.display());
    let service = load_model(args)?;

    if let Some(name) = shape {
        if let Some(structure) = service.structure(name) {
            print_structure(structure);
        } else if let Some(enum_shape) = service.enum_shape(name) {
            println!("\n{} {}", "Enum".bold(), enum_shape.name.yellow());
            for value in &enum_shape.values {
                println!("  • {}", value);
            }
        } else {
            anyhow::bail!("Shape not found in model: {}", name);
        }
        return Ok(());
    }

    println!("\n{}", "Service:".bold());
    println!("  Name: {}", service.service_name.yellow());
    println!("  Target prefix: {}", service.target_prefix);
    println!("  Protocol: {}", service.protocol.to_string().yellow());
    if service.protocol.is_json() {
        println!("  JSON version: {}", service.json_version());
    }
    if let Some(version) = &service.api_version {
        println!("  API version: {}", version);
    }
    if let Some(namespace) = &service.xml_namespace {
        println!("  XML namespace: {}", namespace);
    }
    println!("  Structures: {}", service.structures.len());
    println!("  Enums: {}", service.enums.len());

    println!("\n{}", "Operations:".bold());
    for op in service.operations.values() {
        let http = op
            .http
            .as_ref()
            .map(|h| format!(" [{} {}]", h.method, h.uri))
            .unwrap_or_default();
        println!(
            "  • {} ({} → {}){}",
            op.name.cyan(),
            op.input.as_deref().unwrap_or("-"),
            op.output.as_deref().unwrap_or("-"),
            http
        );
    }

    if verbose {
        for structure in service.structures.values() {
            print_structure(structure);
        }
    }

    Ok(())
}

fn print_structure(shape: &StructureShape) {
    println!("\n{} {}", "Structure".bold(), shape.name.yellow());
    for field in &shape.fields {
        let mut notes = Vec::new();
        if field.required {
            notes.push("required".to_string());
        }
        if field.json_name != field.name {
            notes.push(format!("json: {}", field.json_name));
        }
        if field.xml_name != field.name {
            notes.push(format!("xml: {}", field.xml_name));
        }
        if field.xml.attribute {
            notes.push("attribute".to_string());
        }
        if field.xml.flattened {
            notes.push("flattened".to_string());
        }
        if field.http_label {
            notes.push("label".to_string());
        }
        if let Some(param) = &field.http_query {
            notes.push(format!("query: {}", param));
        }
        if let Some(header) = &field.http_header {
            notes.push(format!("header: {}", header));
        }

        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        println!("  • {}: {}{}", field.name.cyan(), field.field_type, notes);
    }

    let nested = nested_structures(shape);
    if !nested.is_empty() {
        println!("  Nested: {}", nested.join(", "));
    }
}

/// Structure shapes referenced by `shape`'s fields, directly or through collections
fn nested_structures(shape: &StructureShape) -> Vec<&str> {
    let names: BTreeSet<&str> = shape
        .fields
        .iter()
        .filter_map(|f| f.field_type.structure_name())
        .collect();
    names.into_iter().collect()
}

fn marshal_command(
    args: &ModelArgs,
    operation: &str,
    input_path: &Path,
    protocol: Option<WireFormat>,
) -> Result<()> {
    let service = load_model(args)?;
    let op = service
        .operation(operation)
        .with_context(|| format!("Operation not found in model: {}", operation))?;
    let input_shape = op
        .input
        .as_deref()
        .with_context(|| format!("Operation {} takes no input", operation))?;

    let document = fs::read(input_path)
        .with_context(|| format!("Failed to read input document {}", input_path.display()))?;
    let input = JsonUnmarshaller::new(&service)
        .unmarshall(input_shape, &document)
        .context("Failed to decode input document")?;

    let format = protocol.unwrap_or_else(|| WireFormat::for_protocol(service.protocol));
    let request = match format {
        WireFormat::Json => JsonRequestMarshaller::new(&service).marshall(operation, Some(&input)),
        WireFormat::Xml => XmlRequestMarshaller::new(&service).marshall(operation, Some(&input)),
    }
    .with_context(|| format!("Failed to marshal {} request", format))?;

    print!("{}", render_request(&request));
    Ok(())
}

/// HTTP/1.1-style rendering of a request
fn render_request(request: &Request) -> String {
    let mut out = format!("{} {}\n", request.http_method, request.resource_path);
    for (name, value) in &request.headers {
        out.push_str(&format!("{}: {}\n", name, value));
    }
    if !request.content.is_empty() {
        out.push('\n');
        out.push_str(&request.content_str());
        out.push('\n');
    }
    out
}

fn unmarshal_command(
    args: &ModelArgs,
    shape: &str,
    response_path: &Path,
    format: Option<WireFormat>,
) -> Result<()> {
    let service = load_model(args)?;
    let body = fs::read(response_path)
        .with_context(|| format!("Failed to read response {}", response_path.display()))?;

    let format = format.unwrap_or_else(|| WireFormat::for_protocol(service.protocol));
    let model = match format {
        WireFormat::Json => JsonUnmarshaller::new(&service).unmarshall(shape, &body),
        WireFormat::Xml => unmarshall_xml(&service, shape, &body),
    }
    .with_context(|| format!("Failed to unmarshal {} response", format))?;

    println!("{} {}", model.shape().yellow(), model);
    Ok(())
}

fn enum_command(args: &ModelArgs, shape: &str, value: &str) -> Result<()> {
    let service = load_model(args)?;
    let enum_shape = service
        .enum_shape(shape)
        .with_context(|| format!("Enum shape not found in model: {}", shape))?;

    let token = enum_shape.from_value(Some(value))?;
    println!("{} {}.{}", "✓".green(), enum_shape.name, token.yellow());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapewire_common::{FieldDescriptor, FieldType, Model};

    #[test]
    fn test_wire_format_follows_protocol() {
        assert_eq!(WireFormat::for_protocol(Protocol::AwsJson1_1), WireFormat::Json);
        assert_eq!(WireFormat::for_protocol(Protocol::RestJson1), WireFormat::Json);
        assert_eq!(WireFormat::for_protocol(Protocol::RestXml), WireFormat::Xml);
    }

    #[test]
    fn test_nested_structures_look_through_collections() {
        let shape = StructureShape::new("Query")
            .with_field(FieldDescriptor::new(
                "selectors",
                FieldType::List(Box::new(FieldType::Structure("Selector".to_string()))),
            ))
            .with_field(FieldDescriptor::new(
                "byName",
                FieldType::Map(
                    Box::new(FieldType::String),
                    Box::new(FieldType::Structure("Operator".to_string())),
                ),
            ))
            .with_field(FieldDescriptor::new("first", FieldType::Structure("Selector".to_string())))
            .with_field(FieldDescriptor::new("limit", FieldType::Integer));

        assert_eq!(nested_structures(&shape), vec!["Operator", "Selector"]);
    }

    #[test]
    fn test_render_request() {
        let mut request = Request::new("DataPipeline", "AddTags", Model::new("AddTagsInput"));
        request.add_header("X-Amz-Target", "DataPipeline.AddTags");
        request.set_content(b"{}".to_vec());

        assert_eq!(
            render_request(&request),
            "POST /\nContent-Length: 2\nX-Amz-Target: DataPipeline.AddTags\n\n{}\n"
        );
    }

    #[test]
    fn test_cli_parses_marshal_arguments() {
        let cli = Cli::try_parse_from([
            "shapewire",
            "marshal",
            "--model",
            "models/datapipeline.json",
            "--operation",
            "QueryObjects",
            "--input",
            "query.json",
            "--protocol",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Marshal {
                operation, protocol, model, ..
            } => {
                assert_eq!(operation, "QueryObjects");
                assert_eq!(protocol, Some(WireFormat::Json));
                assert!(model.metadata.is_none());
            },
            _ => panic!("expected marshal command"),
        }
    }
}
