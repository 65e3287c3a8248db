use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use native_pdf::editors::{attach_files, embed_image_file, fill_form_fields, ImageOptions};
use native_pdf::encryption::{decrypt_pdf, encrypt_pdf};
use native_pdf::{
    build_form_document, build_image_document, build_text_document, form_field_names, merge_pdf_files,
    parse_document_lenient, read_pdf, validate_pdf, write_pdf, DocumentMetadata, PageOrientation,
    PageSize, PdfConfig,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "nativepdf",
    about = "Build, merge and edit PDF files without external PDF libraries",
    version,
    author
)]
struct Cli {
    /// Log resolution steps and edits to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PageSizeArg {
    A4,
    Letter,
    Legal,
    A3,
}

impl From<PageSizeArg> for PageSize {
    fn from(size: PageSizeArg) -> Self {
        match size {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::Legal => PageSize::Legal,
            PageSizeArg::A3 => PageSize::A3,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a one-page PDF with text
    Create {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Text to include in the PDF
        #[arg(short, long)]
        text: String,

        /// Page size
        #[arg(long, value_enum, default_value = "a4")]
        page_size: PageSizeArg,

        /// Rotate the page to landscape
        #[arg(long)]
        landscape: bool,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Document author
        #[arg(long)]
        author: Option<String>,

        /// JPEG to draw centred on the page
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Fraction of the largest image size that fits the page
        #[arg(short, long, default_value = "0.8", requires = "image")]
        scale: f64,
    },

    /// Create a one-page PDF with text form fields
    Form {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Field names, in order
        #[arg(short, long = "field", required = true)]
        fields: Vec<String>,
    },

    /// List form field names
    Fields {
        /// Input PDF file
        input: PathBuf,
    },

    /// Fill form fields and flatten them into page text
    Fill {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Field assignment as NAME=VALUE
        #[arg(short, long = "set", value_parser = parse_assignment, required = true)]
        values: Vec<(String, String)>,
    },

    /// Merge multiple PDFs into one
    Merge {
        /// Input PDF files
        files: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Embed files as attachments
    Attach {
        /// Input PDF file
        input: PathBuf,

        /// Files to attach
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Draw a JPEG image centred on a page
    Image {
        /// Input PDF file
        input: PathBuf,

        /// JPEG file
        #[arg(short, long)]
        image: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Fraction of the largest size that fits the page
        #[arg(short, long, default_value = "0.8")]
        scale: f64,

        /// Target page (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// Encrypt every stream with a password
    Encrypt {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// User password
        #[arg(short, long)]
        user: String,

        /// Owner password
        #[arg(long)]
        owner: String,
    },

    /// Remove encryption written by `encrypt`
    Decrypt {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// User password
        #[arg(short, long)]
        user: String,
    },

    /// Get information about a PDF file
    Info {
        /// Input PDF file
        input: PathBuf,
    },

    /// Check the basic structure of a PDF file
    Validate {
        /// Input PDF file
        input: PathBuf,
    },
}

fn parse_assignment(value: &str) -> std::result::Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(name, text)| (name.to_string(), text.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{value}'"))
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    read_pdf(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    write_pdf(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Create {
            output,
            text,
            page_size,
            landscape,
            title,
            author,
            image,
            scale,
        } => {
            let mut config = PdfConfig {
                page_size: page_size.into(),
                orientation: if landscape {
                    PageOrientation::Landscape
                } else {
                    PageOrientation::Portrait
                },
                ..PdfConfig::default()
            };
            if title.is_some() || author.is_some() {
                config = config.with_metadata(DocumentMetadata {
                    title,
                    author,
                    ..DocumentMetadata::default()
                });
            }

            match image {
                Some(image) => {
                    let jpeg = std::fs::read(&image)
                        .with_context(|| format!("Failed to read {}", image.display()))?;
                    let bytes = build_image_document(&text, &jpeg, &config, scale)?;
                    write_output(&output, &bytes)?;
                }
                None => {
                    let mut document = build_text_document(&text, &config);
                    document
                        .save(&output)
                        .with_context(|| format!("Failed to write {}", output.display()))?;
                }
            }
            println!("PDF created successfully!");
        }

        Commands::Form { output, fields } => {
            let names: Vec<&str> = fields.iter().map(String::as_str).collect();
            let mut document = build_form_document(&names, &PdfConfig::default())?;
            document
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Form with {} fields created successfully!", names.len());
        }

        Commands::Fields { input } => {
            let data = read_input(&input)?;
            for name in form_field_names(&data) {
                println!("{name}");
            }
        }

        Commands::Fill {
            input,
            output,
            values,
        } => {
            let data = read_input(&input)?;
            let filled = fill_form_fields(&data, values)?;
            write_output(&output, &filled)?;
            println!("Form filled successfully!");
        }

        Commands::Merge { files, output } => {
            if files.len() < 2 {
                bail!("At least two input files are required to merge");
            }
            merge_pdf_files(&files, &output)
                .with_context(|| format!("Failed to merge into {}", output.display()))?;
            println!("Merged {} files into {}", files.len(), output.display());
        }

        Commands::Attach {
            input,
            files,
            output,
        } => {
            let data = read_input(&input)?;
            let attached = attach_files(&data, &files)?;
            write_output(&output, &attached)?;
            println!("Attachments embedded successfully!");
        }

        Commands::Image {
            input,
            image,
            output,
            scale,
            page,
        } => {
            if page == 0 {
                bail!("Page numbers start at 1");
            }
            let data = read_input(&input)?;
            let options = ImageOptions {
                scale,
                page_index: page - 1,
            };
            let result = embed_image_file(&data, &image, &options)?;
            write_output(&output, &result)?;
            println!("Image embedded successfully!");
        }

        Commands::Encrypt {
            input,
            output,
            user,
            owner,
        } => {
            let data = read_input(&input)?;
            let encrypted = encrypt_pdf(&data, &user, &owner)?;
            write_output(&output, &encrypted)?;
            println!("PDF encrypted successfully!");
        }

        Commands::Decrypt {
            input,
            output,
            user,
        } => {
            let data = read_input(&input)?;
            let decrypted = decrypt_pdf(&data, &user)?;
            write_output(&output, &decrypted)?;
            println!("PDF decrypted successfully!");
        }

        Commands::Info { input } => {
            let data = read_input(&input)?;
            let document = parse_document_lenient(&data);
            debug!("Parsed {} objects", document.len());

            println!("PDF Information for: {}", input.display());
            println!("==========================================");
            println!("PDF Version: {}", document.version().unwrap_or("unknown"));
            println!("Objects: {}", document.len());
            println!("Pages: {}", document.page_count());
            if let Some(root) = document.root() {
                println!("Catalog: {root}");
            }
            if let Some(pages_root) = document.pages_root() {
                println!("Pages root: {pages_root}");
            }
            println!(
                "Encrypted: {}",
                if document.encrypt().is_some() { "Yes" } else { "No" }
            );
            if let Some(info) = document.info() {
                for (key, value) in info.iter() {
                    println!("{key}: {value}");
                }
            }
            let fields = form_field_names(&data);
            if !fields.is_empty() {
                println!("Form fields: {}", fields.join(", "));
            }
        }

        Commands::Validate { input } => {
            let data = read_input(&input)?;
            validate_pdf(&data).with_context(|| format!("{} is not valid", input.display()))?;
            println!("{} is valid", input.display());
        }
    }

    Ok(())
}
