use std::path::PathBuf;
use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::{debug, info, LevelFilter};
use dukebox::pipeline::{remap_jar, RemapOutcome};
use quill::format::{MappingFormat, ParseOptions};
use quill::tree::mappings::Mapping;

#[derive(Debug, Parser)]
#[command(version, about = "Remaps the class, field and method names of a jar")]
struct Cli {
	/// The jar to remap.
	input: PathBuf,

	/// The format of the mappings file.
	#[arg(value_enum)]
	format: Format,

	/// The mappings file. Its first namespace is the one of the input jar, unless `--via` is given.
	mappings: PathBuf,

	/// Where to write the remapped jar. Overwritten if it exists.
	///
	/// Defaults to `<input>-remapped.jar` next to the input, in which case remapping is skipped if that file exists.
	output: Option<PathBuf>,

	/// The namespace to remap to. Required for `tiny-v1`.
	#[arg(long = "out-ns")]
	out_namespace: Option<String>,

	/// A Tiny v1 file bridging the namespace of the jar to the first namespace of the mappings.
	#[arg(long = "via", requires = "via_namespace")]
	via: Option<PathBuf>,

	/// The namespace of the jar in the file given with `--via`.
	#[arg(long = "via-ns", requires = "via")]
	via_namespace: Option<String>,

	/// Be more verbose. Can be given multiple times.
	#[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
	verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
	/// Tiny v1, a tab separated format with a namespace per column.
	TinyV1,
	/// The text format written by Proguard and R8.
	Proguard,
}

impl From<Format> for MappingFormat {
	fn from(value: Format) -> MappingFormat {
		match value {
			Format::TinyV1 => MappingFormat::TinyV1,
			Format::Proguard => MappingFormat::Proguard,
		}
	}
}

fn setup_logger(verbose: u8) -> Result<()> {
	let level = match verbose {
		0 => LevelFilter::Info,
		1 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	};

	fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
		})
		.level(level)
		.chain(std::io::stderr())
		.apply()
		.context("failed to set up logging")
}

fn read_mapping(cli: &Cli) -> Result<Mapping> {
	let format = MappingFormat::from(cli.format);
	let options = ParseOptions { namespace: cli.out_namespace.clone() };
	format.check_options(&options)?;

	let mapping = format.read_file(&cli.mappings, &options)
		.with_context(|| anyhow!("failed to read mappings from {:?}", cli.mappings))?;
	debug!("read {} classes, {} fields and {} methods from {:?}",
		mapping.classes().len(), mapping.fields().len(), mapping.methods().len(), cli.mappings);

	match (&cli.via, &cli.via_namespace) {
		(Some(via), Some(via_namespace)) => {
			let via = quill::tiny_v1::read_file(via, via_namespace)
				.with_context(|| anyhow!("failed to read mappings from {via:?}"))?;
			mapping.combine(&via.invert()?)
		},
		_ => Ok(mapping),
	}
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_logger(cli.verbose)?;

	let mapping = read_mapping(&cli)?;

	match remap_jar(&cli.input, cli.output.as_deref(), &mapping)? {
		RemapOutcome::Remapped { output, summary } => {
			info!("wrote {} classes and {} other entries to {output:?}", summary.classes, summary.copied);
		},
		RemapOutcome::AlreadyPresent { output } => {
			info!("{output:?} already exists, nothing to do");
		},
	}

	Ok(())
}
