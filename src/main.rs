//! Headless VAT front end: validate and normalize vessel annotation files.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::{Path, PathBuf};
    use std::process::ExitCode;

    use clap::{Parser, Subcommand};
    use vat::AnnotatorApp;
    use vat::config::AppConfig;
    use vat::format::{AnnotationDocument, VesselJsonFormat, import_image};
    use vat::model::ImageInfo;

    /// Validate and normalize vessel annotation JSON files.
    #[derive(Parser)]
    #[command(version)]
    struct Args {
        /// Configuration file (defaults to the user config directory).
        #[arg(long, global = true, value_name = "PATH")]
        config: Option<PathBuf>,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Check that annotation files parse and reference valid parents.
        Check {
            #[arg(required = true)]
            files: Vec<PathBuf>,
        },
        /// Re-export an annotation file in canonical form.
        Normalize {
            input: PathBuf,

            /// Output path; defaults to the configured export folder, or stdout.
            #[arg(short, long)]
            output: Option<PathBuf>,

            /// Image the annotations belong to; sets filename, width and height.
            #[arg(long, value_name = "IMAGE")]
            image: Option<PathBuf>,
        },
        /// Print the effective configuration.
        Config {
            /// Write the default configuration to the config path.
            #[arg(long)]
            init: bool,
        },
    }

    fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
        match path {
            Some(path) => Ok(AppConfig::load(path)?),
            None => Ok(AppConfig::load_from_default_path().unwrap_or_default()),
        }
    }

    fn check(files: &[PathBuf]) -> ExitCode {
        let format = VesselJsonFormat;
        let mut failed = 0;
        for path in files {
            let result = format
                .import(path)
                .and_then(|doc| import_image(&doc, 1).map(|_| doc));
            match result {
                Ok(doc) => println!(
                    "{}: ok ({} vessels, {} skeleton edges, {} regions)",
                    path.display(),
                    doc.vessel.len(),
                    doc.skeleton.len(),
                    doc.bbox.len()
                ),
                Err(e) => {
                    failed += 1;
                    println!("{}: {}", path.display(), e);
                }
            }
        }
        if failed > 0 {
            log::warn!("{} of {} files failed", failed, files.len());
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    fn image_info(doc: &AnnotationDocument, image: Option<&Path>) -> Result<ImageInfo, image::ImageError> {
        let Some(path) = image else {
            return Ok(ImageInfo::new(doc.filename.as_str(), doc.width, doc.height));
        };
        let (width, height) = image::image_dimensions(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(ImageInfo::new(name, width, height))
    }

    fn normalize(
        config: &AppConfig,
        input: &Path,
        output: Option<&Path>,
        image: Option<&Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let format = VesselJsonFormat;
        let doc = format.import(input)?;

        let mut app = AnnotatorApp::from_config(config);
        app.load_images(vec![image_info(&doc, image)?]);
        app.import_current(&doc)?;
        let normalized = app
            .export_current()
            .ok_or("no image loaded for normalization")?;

        match output {
            Some(path) => format.export(&normalized, path)?,
            None => match app.export_current_to_folder()? {
                Some(path) => println!("{}", path.display()),
                None => println!("{}", String::from_utf8(format.export_to_bytes(&normalized)?)?),
            },
        }
        Ok(())
    }

    fn show_config(config: &AppConfig, init: bool) -> Result<(), Box<dyn std::error::Error>> {
        if init {
            AppConfig::default().save_to_default_path()?;
        }
        match AppConfig::default_path() {
            Some(path) => println!("# {}", path.display()),
            None => println!("# no config directory"),
        }
        println!("{}", config.to_json()?);
        Ok(())
    }

    pub fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
        let args = Args::parse();
        let config = load_config(args.config.as_deref())?;

        env_logger::Builder::new()
            .filter_level(config.preferences.log_level.to_level_filter())
            .parse_default_env()
            .init();
        log::debug!("Log level {}", config.preferences.log_level.name());

        match args.command {
            Command::Check { files } => Ok(check(&files)),
            Command::Normalize {
                input,
                output,
                image,
            } => {
                normalize(&config, &input, output.as_deref(), image.as_deref())?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Config { init } => {
                show_config(&config, init)?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<std::process::ExitCode, Box<dyn std::error::Error>> {
    cli::run()
}

// The library is usable on wasm; the command-line front end is not.
#[cfg(target_arch = "wasm32")]
fn main() {}
