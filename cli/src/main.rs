//! discboot-cli: inspect Wii and GameCube disc images

use clap::{Parser, Subcommand};
use discboot::apploader::ApploaderHeader;
use discboot::disc::{self, partition, DiscHeader};
use discboot::medium::{BlockMedium, Medium, PartitionView};
use discboot::patch::registry;
use discboot::types::{
    DiscKind, APPLOADER_HEADER_OFFSET, APPLOADER_HEADER_SIZE, LOADER_REGION_ADDRESS,
};
use discboot::BootError;
use log::LevelFilter;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod image;

use image::ImageFile;

#[derive(Parser)]
#[command(
    name = "discboot-cli",
    version,
    about = "Inspect Wii and GameCube disc images"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Dump the boot log after the command
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Disc header, disc family and the patch set that would be applied
    Info { image: PathBuf },
    /// Wii partition table
    Partitions { image: PathBuf },
    /// Apploader header of the boot partition
    Apploader { image: PathBuf },
}

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Boot(BootError),
    NotWii,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(err) => write!(f, "I/O error: {}", err),
            CliError::Boot(err) => write!(f, "{}", err),
            CliError::NotWii => write!(f, "not a Wii disc, no partition table"),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<BootError> for CliError {
    fn from(err: BootError) -> Self {
        CliError::Boot(err)
    }
}

type ImageMedium = BlockMedium<ImageFile>;

fn open(path: &Path) -> Result<(ImageMedium, u64), CliError> {
    let file = ImageFile::open(path)?;
    let len = file.len();
    Ok((BlockMedium::new(file), len))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        if let Err(err) = discboot::logger::init(LevelFilter::Debug) {
            eprintln!("warning: boot log unavailable: {}", err);
        }
    }

    let result = match &cli.command {
        Commands::Info { image } => info(image),
        Commands::Partitions { image } => partitions(image),
        Commands::Apploader { image } => apploader(image),
    };

    if cli.verbose {
        dump_log();
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn info(path: &Path) -> Result<(), CliError> {
    let (mut medium, len) = open(path)?;
    let header = disc::read_header(&mut medium)?;

    println!("Image:    {} ({} bytes)", path.display(), len);
    print_header(&header);

    match registry::select(&header.title_id) {
        Some(set) => println!("Patches:  {} ({} instructions)", set.name, set.len()),
        None => println!("Patches:  none"),
    }
    Ok(())
}

fn print_header(header: &DiscHeader) {
    let family = match header.kind() {
        Some(DiscKind::Wii) => "Wii",
        Some(DiscKind::GameCube) => "GameCube",
        None => "unknown",
    };
    println!("Title:    {}", header.title_id);
    println!("Region:   {}", header.title_id.region() as char);
    println!("Disc:     {} (version {})", header.disc_number, header.version);
    println!("Family:   {}", family);
}

fn partitions(path: &Path) -> Result<(), CliError> {
    let (mut medium, _) = open(path)?;
    let header = disc::read_header(&mut medium)?;
    if header.kind() != Some(DiscKind::Wii) {
        return Err(CliError::NotWii);
    }

    let table = partition::read_table(&mut medium)?;
    let boot = table.find_data().map(|entry| entry.offset);

    println!("{:<4} {:<14} {:<10} {}", "#", "Offset", "Kind", "Raw");
    for (index, entry) in table.iter().enumerate() {
        let marker = if Some(entry.offset) == boot { " *" } else { "" };
        println!(
            "{:<4} {:#014x} {:<10} {}{}",
            index,
            entry.offset,
            entry.kind.name(),
            entry.kind.to_raw(),
            marker
        );
    }
    if boot.is_none() {
        println!("No data partition: disc is not bootable");
    }
    Ok(())
}

fn apploader(path: &Path) -> Result<(), CliError> {
    let (mut medium, _) = open(path)?;
    let header = disc::read_header(&mut medium)?;

    let base = match header.kind() {
        Some(DiscKind::Wii) => {
            let base = partition::resolve(&mut medium)?;
            // Image files hold the partition as stored on disc
            if partition::is_raw_partition(&mut medium, base)? {
                return Err(CliError::Boot(BootError::EncryptedPartition));
            }
            base
        }
        Some(DiscKind::GameCube) => 0,
        None => return Err(CliError::Boot(BootError::UnknownDisc)),
    };

    let mut view = PartitionView::new(&mut medium, base);
    let mut raw = [0u8; APPLOADER_HEADER_SIZE];
    view.read(&mut raw, APPLOADER_HEADER_OFFSET)?;
    let loader = ApploaderHeader::parse(&raw)?;

    println!("Partition: {:#x}", base);
    println!("Revision:  {}", loader.revision_str());
    println!("Entry:     {:#010x}", loader.entry);
    println!("Code:      {:#x} bytes", loader.code_size);
    println!("Trailer:   {:#x} bytes", loader.trailer_size);
    println!(
        "Loads to:  {:#010x}..{:#010x}",
        LOADER_REGION_ADDRESS,
        LOADER_REGION_ADDRESS + loader.code_len()
    );
    Ok(())
}

fn dump_log() {
    let log = discboot::logger::boot_log();
    eprintln!("--- boot log ({} of {} records) ---", log.len(), log.total());
    for entry in log.entries() {
        eprintln!("[{:<5}] {}: {}", entry.level, entry.target, entry.message);
    }
}
