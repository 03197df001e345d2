use crate::cert::{assemble_chain, extract_pkcs12};
use crate::cli::args::*;
use crate::cli::completions::handle_completion_command;
use crate::config::ProviderConfig;
use crate::crypto::build_public_key_pem;
use crate::object::parse_objects;
use crate::utils::errors::{ProviderError, Result};
use crate::utils::output::OutputFormat;
use crate::utils::paths::TargetPaths;
use crate::utils::pem::{encode_block, parse_blocks, CERTIFICATE_TAG};
use crate::vault::{DirectorySource, JsonWebKey, KeyBundle, Provider};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub fn handle_command(cli: Cli) -> Result<()> {
    // Initialize logging - always to stderr
    if !cli.quiet {
        let log_level = match cli.verbose {
            0 => "kv_pem=warn",  // Default: warnings only
            1 => "kv_pem=info",  // -v: info level
            2 => "kv_pem=debug", // -vv: debug level
            _ => "kv_pem=trace", // -vvv+: trace level
        };

        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(log_level)
            .init();
    }

    let output = OutputFormat::new(cli.raw);

    match cli.command {
        Commands::Mount {
            objects,
            source,
            target_path,
            construct_pem_chain,
            file_mode,
        } => handle_mount_command(
            &objects,
            &source,
            &target_path,
            ProviderConfig::new(construct_pem_chain),
            file_mode,
            &output,
        ),
        Commands::Chain { file, list } => handle_chain_command(file.as_deref(), list, &output),
        Commands::ConvertPfx {
            file,
            construct_pem_chain,
        } => handle_convert_pfx_command(file.as_deref(), ProviderConfig::new(construct_pem_chain)),
        Commands::PublicKey { file } => handle_public_key_command(file.as_deref()),
        Commands::Completion { ref command } => handle_completion_command(command),
    }
}

fn handle_mount_command(
    objects: &Path,
    source: &Path,
    target_path: &Path,
    config: ProviderConfig,
    file_mode: u32,
    output: &OutputFormat,
) -> Result<()> {
    let objects_yaml = fs::read_to_string(objects).map_err(|e| {
        ProviderError::Config(format!("failed to read {}: {e}", objects.display()))
    })?;
    let objects = parse_objects(&objects_yaml)?;

    let provider = Provider::new(DirectorySource::new(source)?, config);
    let result = provider.mount(&objects)?;

    // Nothing is written unless every object was fetched
    let mut paths: Vec<(PathBuf, &[u8])> = Vec::with_capacity(result.files.len());
    for (file_name, content) in &result.files {
        paths.push((TargetPaths::file_path(target_path, file_name)?, content.as_slice()));
    }
    TargetPaths::ensure_dir_exists(target_path)?;
    for (path, content) in paths {
        TargetPaths::write_file(&path, content, file_mode)?;
    }

    tracing::info!(
        "wrote {} files to {}",
        result.files.len(),
        target_path.display()
    );
    let versions: Vec<(&String, &String)> = result.object_versions.iter().collect();
    output.print_key_value(&versions);
    Ok(())
}

fn handle_chain_command(file: Option<&Path>, list: bool, output: &OutputFormat) -> Result<()> {
    let input = read_input(file)?;
    let blocks: Vec<_> = parse_blocks(&input)?
        .into_iter()
        .filter(|block| block.tag() == CERTIFICATE_TAG)
        .collect();
    if blocks.is_empty() {
        return Err(ProviderError::Parse(
            "no CERTIFICATE blocks found in input".to_string(),
        ));
    }

    let chain = assemble_chain(&blocks)?;
    if list {
        let mut table = vec![vec![
            "#".to_string(),
            "Subject".to_string(),
            "Subject Key ID".to_string(),
            "Authority Key ID".to_string(),
        ]];
        for (idx, cert) in chain.certificates().iter().enumerate() {
            table.push(vec![
                idx.to_string(),
                cert.subject.clone(),
                cert.subject_key_id_hex(),
                cert.authority_key_id_hex(),
            ]);
        }
        output.print_table(&table);
    } else {
        print!("{}", chain.to_pem());
    }
    Ok(())
}

fn handle_convert_pfx_command(file: Option<&Path>, config: ProviderConfig) -> Result<()> {
    let input = read_input(file)?;
    let bundle = extract_pkcs12(&input, &config)?;
    print!("{}", bundle.to_pem());
    Ok(())
}

fn handle_public_key_command(file: Option<&Path>) -> Result<()> {
    let input = read_input(file)?;
    let value: serde_json::Value = serde_json::from_str(&input)?;

    // Either a whole key bundle or just its JSON web key
    let jwk: JsonWebKey = if value.get("key").is_some() {
        let bundle: KeyBundle = serde_json::from_value(value)?;
        bundle
            .key
            .ok_or_else(|| ProviderError::MissingField("key".to_string()))?
    } else {
        serde_json::from_value(value)?
    };

    print!("{}", encode_block(&build_public_key_pem(&jwk)?));
    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            ProviderError::Config(format!("failed to read {}: {e}", path.display()))
        }),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}
