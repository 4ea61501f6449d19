use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info_span;

use spb_codec::{
    ConversionSummary, Decoder, DecoderOptions, Encoder, Fragment, RoundTripReport, Utf8Codec,
    compile_file, decode_hex_field, decompile_file, encode_hex_field, metadata_path_for,
    roundtrip_bytes, scan,
};
use spb_model::{Definition, ModelNames, SymbolBank};
use spb_symbols::{load_model_names, load_symbol_dirs};

use crate::cli::{CompileArgs, DecompileArgs, RoundtripArgs, SymbolArgs, SymbolsArgs};
use crate::config::{DEFAULT_CONFIG_FILE, DEFS_DIR_ENV, FileConfig, SymbolSources};

/// Symbol catalogue plus optional model names for one run.
pub struct Catalogue {
    pub bank: SymbolBank,
    pub models: Option<ModelNames>,
}

/// What a file conversion produced.
#[derive(Debug)]
pub struct Outcome {
    pub action: &'static str,
    pub input: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub summary: ConversionSummary,
}

pub fn load_catalogue(sources: &SymbolSources) -> Result<Catalogue> {
    if sources.dirs.is_empty() {
        bail!(
            "no symbol definitions: pass --defs, set [symbols] dirs in {DEFAULT_CONFIG_FILE}, \
             or set {DEFS_DIR_ENV}"
        );
    }
    let bank = load_symbol_dirs(&sources.dirs).context("load symbol definitions")?;
    let models = sources
        .models
        .as_deref()
        .map(load_model_names)
        .transpose()
        .context("load model names")?;
    Ok(Catalogue { bank, models })
}

fn catalogue_for(flags: &SymbolArgs, config: &FileConfig) -> Result<Catalogue> {
    load_catalogue(&SymbolSources::from_env(flags, config))
}

pub fn run_decompile(args: &DecompileArgs, config: &FileConfig) -> Result<Outcome> {
    let _span = info_span!("decompile", input = %args.input.display()).entered();
    let catalogue = catalogue_for(&args.symbols, config)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("xml"));

    let mut decoder = Decoder::new(&catalogue.bank).with_options(
        DecoderOptions::new().with_model_annotations(!args.no_model_comments),
    );
    if let Some(models) = &catalogue.models {
        decoder = decoder.with_models(models);
    }
    let summary = decompile_file(&decoder, &args.input, &output)
        .with_context(|| format!("decompile {}", args.input.display()))?;

    Ok(Outcome {
        action: "decompile",
        input: args.input.clone(),
        outputs: vec![metadata_path_for(&output), output],
        summary,
    })
}

pub fn run_compile(args: &CompileArgs, config: &FileConfig) -> Result<Outcome> {
    let _span = info_span!("compile", input = %args.input.display()).entered();
    let catalogue = catalogue_for(&args.symbols, config)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("spb"));
    let meta = args
        .meta
        .clone()
        .unwrap_or_else(|| metadata_path_for(&args.input));

    let summary = compile_file(&Encoder::new(&catalogue.bank), &args.input, &meta, &output)
        .with_context(|| format!("compile {}", args.input.display()))?;

    Ok(Outcome {
        action: "compile",
        input: args.input.clone(),
        outputs: vec![output],
        summary,
    })
}

pub fn run_roundtrip(args: &RoundtripArgs, config: &FileConfig) -> Result<RoundTripReport> {
    let _span = info_span!("roundtrip", input = %args.input.display()).entered();
    let catalogue = catalogue_for(&args.symbols, config)?;
    let bytes = fs::read(&args.input).with_context(|| format!("read {}", args.input.display()))?;
    roundtrip_bytes(
        &Decoder::new(&catalogue.bank),
        &Encoder::new(&catalogue.bank),
        &bytes,
    )
    .with_context(|| format!("round trip {}", args.input.display()))
}

/// Definitions matching the `--filter` text, in catalogue order.
pub fn run_symbols(args: &SymbolsArgs, config: &FileConfig) -> Result<Vec<Definition>> {
    let catalogue = catalogue_for(&args.symbols, config)?;
    let filter = args.filter.as_deref().map(str::to_lowercase);
    Ok(catalogue
        .bank
        .definitions()
        .iter()
        .filter(|def| {
            filter
                .as_deref()
                .is_none_or(|needle| def.name().to_lowercase().contains(needle))
        })
        .cloned()
        .collect())
}

pub fn run_encode_hex(text: &str) -> String {
    encode_hex_field(&Utf8Codec, text)
}

pub fn run_decode_hex(bytes: &[String]) -> Result<String> {
    decode_hex_field(&Utf8Codec, &bytes.join(" ")).context("decode hex field")
}

pub fn run_analyze(input: &Path) -> Result<Vec<Fragment>> {
    let data = fs::read(input).with_context(|| format!("read {}", input.display()))?;
    Ok(scan(&data, &Utf8Codec))
}
