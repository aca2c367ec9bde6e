use anyhow::Context;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use hl7_peri22x::config::value_mappings_from_env_value;
use hl7_peri22x::{CoreConfig, Dossier, HubAttachmentStrategy, ObservationProcessor};
use hl7_peri22x_documents::Document;
use hl7v2::Message;
use peri22x::SECTION_TIMESTAMP_FORMAT;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hl7-peri22x")]
#[command(about = "Convert HL7 v2 observation messages into Peri22x dossiers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a message into dossier XML files and their attachments
    Convert {
        /// ER7 encoded message file
        input: PathBuf,
        /// Directory to write into (default: $PERI22X_OUTPUT_DIR, then the current directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Storage key of the dossier (default: a random UUID per dossier)
        #[arg(long)]
        storage_key: Option<String>,
        /// YAML value mapping table (default: $PERI22X_VALUE_MAPPINGS)
        #[arg(long)]
        mappings: Option<PathBuf>,
    },
    /// Print the dossiers a message converts to
    Inspect {
        /// ER7 encoded message file
        input: PathBuf,
        /// YAML value mapping table (default: $PERI22X_VALUE_MAPPINGS)
        #[arg(long)]
        mappings: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hl7_peri22x=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert {
            input,
            output_dir,
            storage_key,
            mappings,
        }) => {
            let output_dir = output_dir
                .or_else(|| std::env::var("PERI22X_OUTPUT_DIR").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("."));
            let config = load_config(mappings)?;
            let written = convert(&config, &input, &output_dir, storage_key.as_deref())?;
            for path in written {
                println!("Wrote {}", path.display());
            }
        }
        Some(Commands::Inspect { input, mappings }) => {
            let config = load_config(mappings)?;
            for (index, dossier) in build_dossiers(&config, &input)?.iter().enumerate() {
                print_dossier(index + 1, dossier);
            }
        }
        None => {
            println!("Use 'hl7-peri22x --help' for commands");
        }
    }

    Ok(())
}

/// Resolves the core configuration from the `--mappings` flag or `PERI22X_VALUE_MAPPINGS`.
fn load_config(mappings: Option<PathBuf>) -> anyhow::Result<CoreConfig> {
    let path = mappings
        .map(|path| path.display().to_string())
        .or_else(|| std::env::var("PERI22X_VALUE_MAPPINGS").ok());
    let value_mappings =
        value_mappings_from_env_value(path).context("failed to load value mappings")?;
    Ok(CoreConfig::new(
        hl7_peri22x::constants::RESOURCE_TYPE.to_string(),
        value_mappings,
    )?)
}

fn build_dossiers(config: &CoreConfig, input: &Path) -> anyhow::Result<Vec<Dossier>> {
    let bytes =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let message = Message::parse(&bytes)
        .with_context(|| format!("failed to parse {}", input.display()))?;

    let mut processor = ObservationProcessor::new(config);
    processor.set_encoding_parameters(message.encoding_parameters())?;

    let groups = message.segment_groups();
    tracing::info!(groups = groups.len(), input = %input.display(), "parsed message");

    let mut dossiers = Vec::with_capacity(groups.len());
    for group in &groups {
        dossiers.push(processor.get_dossier(group)?);
    }
    Ok(dossiers)
}

/// Writes `<key>.xml`, `<key>/<attachment>` and `<key>.metadata.yaml` for every dossier in
/// the message, returning the paths written.
fn convert(
    config: &CoreConfig,
    input: &Path,
    output_dir: &Path,
    storage_key: Option<&str>,
) -> anyhow::Result<Vec<PathBuf>> {
    let dossiers = build_dossiers(config, input)?;
    let count = dossiers.len();
    let mut written = Vec::new();

    for (index, mut dossier) in dossiers.into_iter().enumerate() {
        let key = storage_key_for(storage_key, index, count);
        dossier.set_storage_key(key.clone());
        dossier.register_attachments(&HubAttachmentStrategy)?;

        let xml_path = output_dir.join(format!("{key}.xml"));
        dossier.to_xml_document()?.save(&xml_path)?;
        written.push(xml_path);

        for file in dossier.embedded_files() {
            let path = output_dir.join(&key).join(file.filename());
            file.save(&path)?;
            written.push(path);
        }

        if !dossier.metadata().is_empty() {
            let path = output_dir.join(format!("{key}.metadata.yaml"));
            let yaml = serde_yaml::to_string(dossier.metadata())?;
            std::fs::write(&path, yaml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            written.push(path);
        }

        tracing::info!(storage_key = %key, "stored dossier");
    }

    Ok(written)
}

/// The given key, numbered when a message holds several dossiers; a random UUID otherwise.
fn storage_key_for(storage_key: Option<&str>, index: usize, count: usize) -> String {
    match storage_key {
        Some(key) if count > 1 => format!("{key}-{}", index + 1),
        Some(key) => key.to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    }
}

fn print_dossier(number: usize, dossier: &Dossier) {
    println!("Dossier {number} ({})", dossier.resource().resource_type());

    for section in dossier.resource().sections() {
        println!(
            "  [{}] created {} effective {}",
            section.section_type(),
            format_stamp(section.create_stamp()),
            format_stamp(section.effect_stamp())
        );
        for value in section.values() {
            match value.repeat() {
                Some(repeat) => println!("    {} #{} = {}", value.concept(), repeat, value.value()),
                None => println!("    {} = {}", value.concept(), value.value()),
            }
        }
    }

    for file in dossier.embedded_files() {
        println!(
            "  file {} ({}, {} bytes)",
            file.basename(),
            file.mime_type(),
            file.bytes().len()
        );
    }

    for (key, value) in dossier.metadata() {
        println!("  {key}: {value}");
    }
}

fn format_stamp(stamp: Option<NaiveDateTime>) -> String {
    stamp
        .map(|stamp| stamp.format(SECTION_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MESSAGE: &str = "MSH|^~\\&|ECHO|CLINIC|HUB|HUB|20160120101010||ORU^R01|1|P|2.5\r\
PID|1||123456789^^^NLM^NNNLD\r\
OBR|1||ORD-1^ECHOAPP||||20160120093000\r\
OBX|1|NM|gravida||1||||||F\r\
OBX|2|ED|rapport||^AP^PDF^Base64^JVBERi0xLjQK||||||F\r\
PID|2||987654321^^^NLM^NNNLD\r\
OBR|1||ORD-2^ECHOAPP\r\
OBX|1|NM|parity||2||||||F\r";

    fn write_message(dir: &Path) -> PathBuf {
        let path = dir.join("message.hl7");
        std::fs::write(&path, MESSAGE).unwrap();
        path
    }

    #[test]
    fn test_storage_key_for() {
        assert_eq!(storage_key_for(Some("abc"), 0, 1), "abc");
        assert_eq!(storage_key_for(Some("abc"), 1, 2), "abc-2");
        assert_eq!(storage_key_for(None, 0, 1).len(), 36);
    }

    #[test]
    fn test_convert_writes_dossiers_and_attachments() {
        let temp = TempDir::new().unwrap();
        let input = write_message(temp.path());
        let output = temp.path().join("out");

        let written = convert(&CoreConfig::default(), &input, &output, Some("key")).unwrap();

        assert!(written.contains(&output.join("key-1.xml")));
        assert!(written.contains(&output.join("key-1").join("rapport.pdf")));
        assert!(written.contains(&output.join("key-2.xml")));

        let xml = std::fs::read_to_string(output.join("key-1.xml")).unwrap();
        assert!(xml.contains(r#"<attachment id="1" mimetype="application/pdf" filename="rapport.pdf"/>"#));
        let pdf = std::fs::read(output.join("key-1").join("rapport.pdf")).unwrap();
        assert_eq!(pdf, b"%PDF-1.4\n");

        let metadata = std::fs::read_to_string(output.join("key-1.metadata.yaml")).unwrap();
        assert!(metadata.contains("order_number: ORD-1"));
    }

    #[test]
    fn test_missing_input_is_reported() {
        let temp = TempDir::new().unwrap();

        let result = convert(
            &CoreConfig::default(),
            &temp.path().join("missing.hl7"),
            temp.path(),
            None,
        );

        assert!(result.is_err());
    }
}
