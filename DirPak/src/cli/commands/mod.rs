use clap::Subcommand;
use std::path::PathBuf;

pub mod create;
pub mod extract;
pub mod info;
pub mod list;

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a directory into a PAK file
    Create {
        /// Source directory
        #[arg(short, long)]
        source: PathBuf,

        /// Output PAK file
        #[arg(short, long)]
        destination: PathBuf,

        /// Store every payload uncompressed
        #[arg(long)]
        no_compress: bool,

        /// Zlib level 0-9. Default: 9
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=9))]
        level: Option<u32>,

        /// Write a big-endian archive
        #[arg(long)]
        big_endian: bool,

        /// JSON file with build options; flags override it
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Extract a PAK file
    Extract {
        /// Source PAK file
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory
        #[arg(short, long)]
        destination: PathBuf,

        /// Extract a single file by internal path (e.g. "/root/a.txt")
        #[arg(long)]
        file: Option<String>,
    },

    /// List PAK contents
    List {
        /// PAK file
        #[arg(short, long)]
        source: PathBuf,

        /// Show detailed info (ids, sizes, compression)
        #[arg(short, long)]
        detailed: bool,

        /// Only list entries matching glob pattern (e.g., "*.txt")
        #[arg(long)]
        filter: Option<String>,

        /// Only show count of matching entries
        #[arg(short, long)]
        count: bool,
    },

    /// Print the entry tree and header statistics
    Info {
        /// PAK file
        #[arg(short, long)]
        source: PathBuf,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying PAK operation fails.
    pub fn execute(&self, quiet: bool) -> anyhow::Result<()> {
        match self {
            Commands::Create {
                source,
                destination,
                no_compress,
                level,
                big_endian,
                config,
            } => create::execute(
                source,
                destination,
                &create::CreateArgs {
                    no_compress: *no_compress,
                    level: *level,
                    big_endian: *big_endian,
                    config: config.as_deref(),
                },
                quiet,
            ),
            Commands::Extract {
                source,
                destination,
                file,
            } => extract::execute(source, destination, file.as_deref(), quiet),
            Commands::List {
                source,
                detailed,
                filter,
                count,
            } => list::execute(source, *detailed, filter.as_deref(), *count),
            Commands::Info { source } => info::execute(source),
        }
    }
}
